use thiserror::Error;
use trust_dns_resolver::error::{ResolveError, ResolveErrorKind};

#[derive(Debug, Error)]
pub enum MxError {
    #[error("domain is empty")]
    EmptyDomain,
    #[error("resolver initialization failed: {source}")]
    ResolverInit {
        #[source]
        source: ResolveError,
    },
    #[error("MX lookup for {domain} failed: {source}")]
    Lookup {
        domain: String,
        #[source]
        source: ResolveError,
    },
}

impl MxError {
    pub(crate) fn resolver_init(source: ResolveError) -> Self {
        Self::ResolverInit { source }
    }

    pub(crate) fn lookup(domain: &str, source: ResolveError) -> Self {
        Self::Lookup {
            domain: domain.to_string(),
            source,
        }
    }

    /// `true` when the resolver answered but the domain has no MX records.
    pub fn is_no_records(&self) -> bool {
        match self {
            Self::Lookup { source, .. } => {
                matches!(source.kind(), ResolveErrorKind::NoRecordsFound { .. })
            }
            _ => false,
        }
    }
}

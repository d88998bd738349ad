use std::future::Future;

use trust_dns_resolver::TokioAsyncResolver;
use trust_dns_resolver::error::ResolveError;

use super::{Error, MxRecord, MxStatus};

/// Source of MX records for a domain.
pub trait LookupMx {
    fn lookup_mx(
        &self,
        domain: &str,
    ) -> impl Future<Output = Result<Vec<MxRecord>, ResolveError>> + Send;
}

impl LookupMx for TokioAsyncResolver {
    async fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, ResolveError> {
        let lookup = self.mx_lookup(domain).await?;
        let records = lookup
            .iter()
            .map(|mx| {
                let exchange = normalize_exchange(&mx.exchange().to_utf8());
                MxRecord::new(mx.preference(), exchange)
            })
            .collect();
        Ok(records)
    }
}

/// Builds a tokio resolver from the system configuration (`/etc/resolv.conf`
/// on Unix).
pub fn system_resolver() -> Result<TokioAsyncResolver, Error> {
    TokioAsyncResolver::tokio_from_system_conf().map_err(Error::resolver_init)
}

/// Lookup MX records for `domain` using the system resolver.
///
/// The resulting [`MxStatus`] contains the sorted, deduplicated list of
/// records (ascending preference).
pub async fn check_mx(domain: &str) -> Result<MxStatus, Error> {
    let domain = normalize_domain(domain)?;
    let resolver = system_resolver()?;
    resolve_with(&resolver, &domain).await
}

/// Same as [`check_mx`] with a caller-provided resolver. `domain` is used as
/// given.
pub async fn resolve_with<R>(resolver: &R, domain: &str) -> Result<MxStatus, Error>
where
    R: LookupMx,
{
    let records = resolver
        .lookup_mx(domain)
        .await
        .map_err(|err| Error::lookup(domain, err))?;

    let status = MxStatus::from_records(records);
    tracing::debug!(domain, count = status.records().len(), "MX lookup complete");
    Ok(status)
}

pub(crate) fn normalize_domain(domain: &str) -> Result<String, Error> {
    let trimmed = domain.trim().trim_end_matches('.');
    if trimmed.is_empty() {
        return Err(Error::EmptyDomain);
    }
    Ok(trimmed.to_ascii_lowercase())
}

pub(crate) fn normalize_exchange(exchange: &str) -> String {
    exchange.trim_end_matches('.').to_ascii_lowercase()
}

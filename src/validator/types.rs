use std::fmt;

use thiserror::Error;

/// A syntactically valid, lower-cased address split at its single `@`.
///
/// Only [`validate_email`](crate::validate_email) builds values of this type,
/// so `local` and `domain` are always non-empty.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Email {
    local: String,
    domain: String,
}

impl Email {
    pub(crate) fn from_parts(local: &str, domain: &str) -> Self {
        Self {
            local: local.to_ascii_lowercase(),
            domain: domain.to_ascii_lowercase(),
        }
    }

    pub fn local(&self) -> &str {
        &self.local
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.local, self.domain)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    #[error("address is empty")]
    Empty,
    #[error("address length {len} outside {min}..={max}")]
    Length { len: usize, min: usize, max: usize },
    #[error("invalid format")]
    InvalidFormat,
}

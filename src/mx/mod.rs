//! DNS MX resolution.
//!
//! [`check_mx`] performs an asynchronous lookup with the system resolver and
//! returns a [`MxStatus`] whose records are in fallback order. The
//! [`LookupMx`] trait is the seam used by the verifier, so tests and callers
//! with their own DNS stack can supply candidates directly.

mod error;
mod resolver;
mod types;

pub use error::MxError as Error;
pub use resolver::{LookupMx, check_mx, resolve_with, system_resolver};
pub use types::{MxRecord, MxStatus};

pub(crate) use resolver::normalize_domain;

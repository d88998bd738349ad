//! SMTP deliverability probing with MX fallback.
//!
//! The public entry point is [`verify_email`]: it validates the address,
//! resolves its MX hosts and runs a truncated `HELO` / `MAIL FROM` /
//! `RCPT TO` dialogue against them, one at a time, until a server accepts
//! the recipient. No `DATA` is ever sent.

mod error;
mod fallback;
mod options;
mod probe;
mod session;
mod state;
mod transport;
mod types;
mod verify;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{ErrorKind, ProbeError, VerifyError};
pub use fallback::probe_candidates;
pub use options::{DEFAULT_TIMEOUT_MS, ProbeOptions, SMTP_PORT, VerifyOptions};
pub use probe::probe_host;
pub use transport::{Connector, TcpConnector};
pub use types::{FallbackResult, ProbeOutcome, SmtpEvent, SmtpReply, Stage};
pub use verify::{verify_email, verify_email_with};

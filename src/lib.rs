#![forbid(unsafe_code)]
//! mailprobe_lib — SMTP deliverability probe with MX fallback
//!
//! ```no_run
//! # async fn run() {
//! use mailprobe_lib::{VerifyOptions, verify_email};
//!
//! let result = verify_email("someone@example.com", &VerifyOptions::default()).await;
//! if result.accepted {
//!     println!("accepted by {}", result.host.unwrap_or_default());
//! } else {
//!     println!("{result}");
//! }
//! # }
//! ```

pub mod validator;
pub use validator::{Email, EmailError, validate_email};

pub mod mx;
pub use mx::{Error as MxError, LookupMx, MxRecord, MxStatus, check_mx};

pub mod smtp_verify;
pub use smtp_verify::{
    Connector, DEFAULT_TIMEOUT_MS, ErrorKind, FallbackResult, ProbeError, ProbeOptions,
    ProbeOutcome, SMTP_PORT, SmtpEvent, SmtpReply, Stage, TcpConnector, VerifyError,
    VerifyOptions, probe_candidates, probe_host, verify_email, verify_email_with,
};

use std::fmt;
use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::mx::Error as MxError;
use crate::smtp_verify::types::Stage;
use crate::validator::EmailError;

/// Normalized failure category shared by single-host probes and the
/// verification as a whole.
#[cfg_attr(
    feature = "with-serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The address failed the syntax check; nothing was sent on the network.
    InvalidSyntax,
    /// The resolver could not be built, failed, or found no MX records.
    DnsResolutionFailed,
    /// The lookup succeeded but yielded an empty candidate list.
    NoCandidates,
    /// The TCP connection to the candidate could not be established.
    ConnectionFailed,
    /// The peer reset the connection during the dialogue.
    ConnectionRefused,
    /// The peer closed the connection before the dialogue completed.
    ConnectionClosed,
    /// A reply did not start with `2`.
    ProtocolRejected,
    /// The per-candidate budget elapsed.
    Timeout,
    /// Any other I/O failure.
    Transport,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidSyntax => "invalid_syntax",
            Self::DnsResolutionFailed => "dns_resolution_failed",
            Self::NoCandidates => "no_candidates",
            Self::ConnectionFailed => "connection_failed",
            Self::ConnectionRefused => "connection_refused",
            Self::ConnectionClosed => "connection_closed",
            Self::ProtocolRejected => "protocol_rejected",
            Self::Timeout => "timeout",
            Self::Transport => "transport",
        }
    }

    /// Kinds raised before any SMTP connection is attempted.
    pub fn is_fail_fast(&self) -> bool {
        matches!(
            self,
            Self::InvalidSyntax | Self::DnsResolutionFailed | Self::NoCandidates
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a single-host probe.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("connection to {host}:{port} failed: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },
    #[error("connection reset by peer during {stage}")]
    Reset {
        stage: Stage,
        #[source]
        source: io::Error,
    },
    #[error("connection closed during {stage}")]
    Closed { stage: Stage },
    #[error("I/O error during {stage}: {source}")]
    Io {
        stage: Stage,
        #[source]
        source: io::Error,
    },
    #[error("{stage} rejected: {reply}")]
    Rejected { stage: Stage, reply: String },
    #[error("no answer during {stage} within {}ms", .budget.as_millis())]
    Timeout { stage: Stage, budget: Duration },
}

impl ProbeError {
    pub(crate) fn connect(host: &str, port: u16, source: io::Error) -> Self {
        Self::Connect {
            host: host.to_string(),
            port,
            source,
        }
    }

    /// Classifies an I/O error raised after the connection was established.
    pub(crate) fn from_io(stage: Stage, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionAborted => {
                Self::Reset { stage, source }
            }
            io::ErrorKind::UnexpectedEof | io::ErrorKind::BrokenPipe => Self::Closed { stage },
            _ => Self::Io { stage, source },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Connect { .. } => ErrorKind::ConnectionFailed,
            Self::Reset { .. } => ErrorKind::ConnectionRefused,
            Self::Closed { .. } => ErrorKind::ConnectionClosed,
            Self::Io { .. } => ErrorKind::Transport,
            Self::Rejected { .. } => ErrorKind::ProtocolRejected,
            Self::Timeout { .. } => ErrorKind::Timeout,
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            Self::Connect { .. } => Stage::Connect,
            Self::Reset { stage, .. }
            | Self::Closed { stage }
            | Self::Io { stage, .. }
            | Self::Rejected { stage, .. }
            | Self::Timeout { stage, .. } => *stage,
        }
    }
}

/// Conditions that end a verification before any candidate is probed.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("invalid email address: {source}")]
    InvalidSyntax {
        #[source]
        source: EmailError,
    },
    #[error(transparent)]
    Dns(#[from] MxError),
    #[error("no MX candidates for {domain}")]
    NoCandidates { domain: String },
}

impl VerifyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidSyntax { .. } => ErrorKind::InvalidSyntax,
            Self::Dns(_) => ErrorKind::DnsResolutionFailed,
            Self::NoCandidates { .. } => ErrorKind::NoCandidates,
        }
    }
}

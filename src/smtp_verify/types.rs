use std::fmt;

use crate::smtp_verify::error::{ErrorKind, ProbeError, VerifyError};

/// Step of the probe dialogue, used to label transcript entries and errors.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Connect,
    Greeting,
    Helo,
    MailFrom,
    RcptTo,
    Quit,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Connect => "connect",
            Self::Greeting => "greeting",
            Self::Helo => "HELO",
            Self::MailFrom => "MAIL FROM",
            Self::RcptTo => "RCPT TO",
            Self::Quit => "QUIT",
        })
    }
}

/// A complete server reply. Multi-line replies are joined with `\n`.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpReply {
    /// Numeric code of the first line, when it parses. Informational only.
    pub code: Option<u16>,
    pub text: String,
}

impl SmtpReply {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let code = text.get(..3).and_then(|prefix| prefix.parse().ok());
        Self { code, text }
    }

    /// Acceptance test used at every step: the reply's first byte is `2`.
    pub fn is_positive(&self) -> bool {
        self.text.as_bytes().first() == Some(&b'2')
    }
}

impl fmt::Display for SmtpReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// A recorded transcript event used for diagnostics.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SmtpEvent {
    Sent { stage: Stage, command: String },
    Received { stage: Stage, reply: SmtpReply },
    Error { stage: Stage, message: String },
}

impl fmt::Display for SmtpEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sent { command, .. } => write!(f, "C: {command}"),
            Self::Received { reply, .. } => {
                let mut lines = reply.text.lines();
                write!(f, "S: {}", lines.next().unwrap_or_default())?;
                for line in lines {
                    write!(f, "\n   {line}")?;
                }
                Ok(())
            }
            Self::Error { stage, message } => write!(f, "!  {stage}: {message}"),
        }
    }
}

/// Outcome of the dialogue with one candidate host.
///
/// Exactly one of `accepted` or `error_kind.is_some()` holds.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub accepted: bool,
    pub host: Option<String>,
    pub error_kind: Option<ErrorKind>,
    /// Final reply text on acceptance, error description otherwise.
    pub detail: Option<String>,
    pub transcript: Vec<SmtpEvent>,
}

impl ProbeOutcome {
    pub(crate) fn accepted(host: &str, reply: &SmtpReply, transcript: Vec<SmtpEvent>) -> Self {
        Self {
            accepted: true,
            host: Some(host.to_string()),
            error_kind: None,
            detail: Some(reply.text.clone()),
            transcript,
        }
    }

    pub(crate) fn failed(host: &str, error: &ProbeError, transcript: Vec<SmtpEvent>) -> Self {
        Self {
            accepted: false,
            host: Some(host.to_string()),
            error_kind: Some(error.kind()),
            detail: Some(error.to_string()),
            transcript,
        }
    }
}

/// Final answer of a verification.
///
/// `host` names the candidate that accepted the recipient, or the last one
/// tried on failure. `attempts` is only filled when per-candidate detail was
/// requested.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackResult {
    pub email: String,
    pub accepted: bool,
    pub host: Option<String>,
    pub error_kind: Option<ErrorKind>,
    pub message: Option<String>,
    #[cfg_attr(feature = "with-serde", serde(skip_serializing_if = "Vec::is_empty"))]
    pub attempts: Vec<ProbeOutcome>,
}

impl FallbackResult {
    pub(crate) fn from_outcome(email: impl Into<String>, outcome: &ProbeOutcome) -> Self {
        Self {
            email: email.into(),
            accepted: outcome.accepted,
            host: outcome.host.clone(),
            error_kind: outcome.error_kind,
            message: outcome.detail.clone(),
            attempts: Vec::new(),
        }
    }

    pub(crate) fn failed(email: impl Into<String>, kind: ErrorKind, message: String) -> Self {
        Self {
            email: email.into(),
            accepted: false,
            host: None,
            error_kind: Some(kind),
            message: Some(message),
            attempts: Vec::new(),
        }
    }

    pub(crate) fn fail_fast(email: impl Into<String>, error: &VerifyError) -> Self {
        Self::failed(email, error.kind(), error.to_string())
    }
}

impl fmt::Display for FallbackResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.accepted, &self.host, self.error_kind) {
            (true, Some(host), _) => write!(f, "accepted by {host}"),
            (true, None, _) => f.write_str("accepted"),
            (false, _, Some(kind)) => {
                write!(f, "not accepted ({kind})")?;
                if let Some(message) = &self.message {
                    write!(f, ": {message}")?;
                }
                Ok(())
            }
            (false, _, None) => f.write_str("not accepted"),
        }
    }
}

use std::time::Duration;

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

use crate::validator::{Email, validate_email};

pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;
pub const SMTP_PORT: u16 = 25;

/// Configuration knobs for [`verify_email`](crate::verify_email).
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyOptions {
    /// Envelope sender. Defaults to the address under test; an address that
    /// fails the syntax check is ignored.
    pub from: Option<String>,
    /// Name announced in `HELO`. Defaults to the domain of the sender.
    pub helo_host: Option<String>,
    /// Budget for one candidate, from connect to the `RCPT TO` reply.
    pub timeout_ms: u64,
    pub port: u16,
    /// Keep every per-candidate outcome in [`FallbackResult::attempts`](crate::FallbackResult).
    pub collect_attempts: bool,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            from: None,
            helo_host: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            port: SMTP_PORT,
            collect_attempts: false,
        }
    }
}

impl VerifyOptions {
    /// Return the timeout as a [`Duration`]. A zero value falls back to the
    /// default budget.
    pub fn timeout(&self) -> Duration {
        match self.timeout_ms {
            0 => Duration::from_millis(DEFAULT_TIMEOUT_MS),
            ms => Duration::from_millis(ms),
        }
    }

    /// Resolves sender, `HELO` name and timeout for probing `target`.
    pub fn probe_options(&self, target: &Email) -> ProbeOptions {
        let from = self
            .from
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .and_then(|value| match validate_email(value) {
                Ok(email) => Some(email),
                Err(err) => {
                    tracing::warn!(
                        from = value,
                        %err,
                        "ignoring invalid sender, using the target address"
                    );
                    None
                }
            })
            .unwrap_or_else(|| target.clone());

        let helo_host = self
            .helo_host
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| from.domain().to_string());

        ProbeOptions {
            from,
            helo_host,
            timeout: self.timeout(),
            port: self.port,
        }
    }
}

/// Fully resolved inputs of a single-host probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOptions {
    pub from: Email,
    pub helo_host: String,
    pub timeout: Duration,
    pub port: u16,
}

impl ProbeOptions {
    /// Defaults for probing `target`: the target is its own sender.
    pub fn for_target(target: &Email) -> Self {
        VerifyOptions::default().probe_options(target)
    }
}

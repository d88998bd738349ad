use std::borrow::Cow;

use crate::mx::MxRecord;
use crate::smtp_verify::error::ErrorKind;
use crate::smtp_verify::options::ProbeOptions;
use crate::smtp_verify::probe::probe_host;
use crate::smtp_verify::transport::Connector;
use crate::smtp_verify::types::FallbackResult;
use crate::validator::Email;

/// Probes `candidates` one after the other, in ascending preference, until
/// one accepts `target`.
///
/// Candidates are never probed concurrently. Without any acceptance the
/// result mirrors the last candidate tried; with `collect_attempts` every
/// per-candidate outcome is kept in [`FallbackResult::attempts`].
pub async fn probe_candidates<C: Connector>(
    target: &Email,
    candidates: &[MxRecord],
    options: &ProbeOptions,
    connector: &C,
    collect_attempts: bool,
) -> FallbackResult {
    let ordered = fallback_order(candidates);
    let mut attempts = Vec::new();
    let mut last = None;

    for (index, candidate) in ordered.iter().enumerate() {
        tracing::debug!(
            host = %candidate.exchange,
            preference = candidate.preference,
            attempt = index + 1,
            of = ordered.len(),
            "probing MX candidate"
        );
        let outcome = probe_host(&candidate.exchange, target, options, connector).await;
        let mut result = FallbackResult::from_outcome(target.to_string(), &outcome);

        if outcome.accepted {
            if collect_attempts {
                attempts.push(outcome);
                result.attempts = attempts;
            }
            return result;
        }

        tracing::warn!(
            host = %candidate.exchange,
            kind = ?outcome.error_kind,
            detail = outcome.detail.as_deref().unwrap_or_default(),
            "MX candidate did not accept the recipient"
        );
        if collect_attempts {
            attempts.push(outcome);
        }
        last = Some(result);
    }

    match last {
        Some(mut result) => {
            result.attempts = attempts;
            result
        }
        None => FallbackResult::failed(
            target.to_string(),
            ErrorKind::NoCandidates,
            format!("no MX candidates for {}", target.domain()),
        ),
    }
}

/// Ascending preference; equal preferences keep their input order. A single
/// candidate is used as is.
fn fallback_order(candidates: &[MxRecord]) -> Cow<'_, [MxRecord]> {
    if candidates.len() < 2 {
        return Cow::Borrowed(candidates);
    }
    let mut ordered = candidates.to_vec();
    ordered.sort_by_key(|candidate| candidate.preference);
    Cow::Owned(ordered)
}

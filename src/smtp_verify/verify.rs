use crate::mx::{LookupMx, normalize_domain, resolve_with, system_resolver};
use crate::smtp_verify::error::VerifyError;
use crate::smtp_verify::fallback::probe_candidates;
use crate::smtp_verify::options::VerifyOptions;
use crate::smtp_verify::transport::{Connector, TcpConnector};
use crate::smtp_verify::types::FallbackResult;
use crate::validator::{Email, validate_email};

/// Checks whether `address` looks deliverable without sending mail.
///
/// The address is validated, its MX records are resolved with the system
/// resolver, and the candidates are probed over TCP in preference order
/// until one accepts the recipient. Failures are reported in the returned
/// [`FallbackResult`], never as an error: a `false` answer means "not
/// confirmed", which may also come from greylisting or a policy refusal.
pub async fn verify_email(address: &str, options: &VerifyOptions) -> FallbackResult {
    let target = match parse_target(address) {
        Ok(target) => target,
        Err(err) => return finish(address.trim(), Err(err)),
    };
    let resolver = match system_resolver() {
        Ok(resolver) => resolver,
        Err(err) => return finish(address.trim(), Err(err.into())),
    };
    let result = verify_target(&target, options, &resolver, &TcpConnector).await;
    finish(&target.to_string(), result)
}

/// Same as [`verify_email`] with caller-supplied DNS and transport.
pub async fn verify_email_with<R, C>(
    address: &str,
    options: &VerifyOptions,
    resolver: &R,
    connector: &C,
) -> FallbackResult
where
    R: LookupMx,
    C: Connector,
{
    let target = match parse_target(address) {
        Ok(target) => target,
        Err(err) => return finish(address.trim(), Err(err)),
    };
    let result = verify_target(&target, options, resolver, connector).await;
    finish(&target.to_string(), result)
}

fn parse_target(address: &str) -> Result<Email, VerifyError> {
    validate_email(address).map_err(|source| VerifyError::InvalidSyntax { source })
}

async fn verify_target<R, C>(
    target: &Email,
    options: &VerifyOptions,
    resolver: &R,
    connector: &C,
) -> Result<FallbackResult, VerifyError>
where
    R: LookupMx,
    C: Connector,
{
    let domain = normalize_domain(target.domain())?;
    let candidates = resolve_with(resolver, &domain).await?.into_records();
    if candidates.is_empty() {
        return Err(VerifyError::NoCandidates { domain });
    }

    let probe_options = options.probe_options(target);
    Ok(probe_candidates(
        target,
        &candidates,
        &probe_options,
        connector,
        options.collect_attempts,
    )
    .await)
}

fn finish(email: &str, result: Result<FallbackResult, VerifyError>) -> FallbackResult {
    let result = result.unwrap_or_else(|err| FallbackResult::fail_fast(email, &err));
    tracing::info!(
        email = %result.email,
        accepted = result.accepted,
        host = result.host.as_deref().unwrap_or_default(),
        kind = result.error_kind.map(|kind| kind.as_str()).unwrap_or_default(),
        "verification finished"
    );
    result
}

use std::future::Future;
use std::io::BufRead;

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use mailprobe_lib::FallbackResult;

/// Reads one address per line, skipping blank lines.
pub fn read_addresses(input: impl BufRead) -> Result<Vec<String>> {
    let mut addresses = Vec::new();
    for line in input.lines() {
        let line = line.context("read stdin")?;
        let address = line.trim();
        if !address.is_empty() {
            addresses.push(address.to_string());
        }
    }
    Ok(addresses)
}

/// Runs `verify` over `addresses`, at most `concurrency` at a time. Results
/// come back in input order.
pub async fn verify_all<F, Fut>(
    addresses: Vec<String>,
    concurrency: usize,
    verify: F,
) -> Vec<FallbackResult>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = FallbackResult>,
{
    tracing::debug!(count = addresses.len(), concurrency, "verifying addresses");
    stream::iter(addresses)
        .map(verify)
        .buffered(concurrency.max(1))
        .collect()
        .await
}

pub fn any_not_accepted(rows: &[FallbackResult]) -> bool {
    rows.iter().any(|row| !row.accepted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use mailprobe_lib::{Connector, ErrorKind, LookupMx, MxRecord, VerifyOptions, verify_email_with};
    use tokio::io::DuplexStream;
    use trust_dns_resolver::error::ResolveError;

    struct DeadResolver;

    impl LookupMx for DeadResolver {
        async fn lookup_mx(&self, _domain: &str) -> Result<Vec<MxRecord>, ResolveError> {
            Err(ResolveError::from("no MX records"))
        }
    }

    struct RefusingConnector;

    impl Connector for RefusingConnector {
        type Stream = DuplexStream;

        async fn connect(&self, _host: &str, _port: u16) -> io::Result<DuplexStream> {
            Err(io::ErrorKind::ConnectionRefused.into())
        }
    }

    #[test]
    fn blank_lines_are_skipped() {
        let input = "bob@example.com\n\n  \n alice@example.org \n";
        assert_eq!(
            read_addresses(input.as_bytes()).unwrap(),
            vec!["bob@example.com", "alice@example.org"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn results_keep_input_order() {
        let addresses: Vec<String> = (0..6).map(|i| format!("user{i}@example.com")).collect();

        let rows = verify_all(addresses.clone(), 3, |address| async move {
            // les premières adresses finissent en dernier
            let index: u64 = address[4..5].parse().unwrap();
            tokio::time::sleep(Duration::from_millis(100 * (6 - index))).await;
            FallbackResult {
                email: address,
                accepted: true,
                host: None,
                error_kind: None,
                message: None,
                attempts: Vec::new(),
            }
        })
        .await;

        let emails: Vec<_> = rows.iter().map(|row| row.email.clone()).collect();
        assert_eq!(emails, addresses);
        assert!(!any_not_accepted(&rows));
    }

    #[tokio::test]
    async fn concurrency_is_bounded() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let addresses = vec!["a@example.com".to_string(); 8];

        verify_all(addresses, 2, |address| {
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::task::yield_now().await;
                running.fetch_sub(1, Ordering::SeqCst);
                FallbackResult {
                    email: address,
                    accepted: false,
                    host: None,
                    error_kind: Some(ErrorKind::NoCandidates),
                    message: None,
                    attempts: Vec::new(),
                }
            }
        })
        .await;

        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn each_address_gets_its_own_result() {
        let options = &VerifyOptions::default();
        let addresses = vec!["not-an-address".to_string(), "bob@example.com".to_string()];

        let rows = verify_all(addresses, 4, move |address| async move {
            verify_email_with(&address, options, &DeadResolver, &RefusingConnector).await
        })
        .await;

        assert_eq!(rows[0].error_kind, Some(ErrorKind::InvalidSyntax));
        assert_eq!(rows[1].error_kind, Some(ErrorKind::DnsResolutionFailed));
        assert!(any_not_accepted(&rows));
    }
}

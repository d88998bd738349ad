#[cfg(any(feature = "with-serde", feature = "with-csv"))]
use anyhow::Context;
use anyhow::{Result, bail};

use mailprobe_lib::{FallbackResult, ProbeOutcome};

use crate::mx::MxSummary;

#[cfg(feature = "with-serde")]
pub trait MaybeSerialize: serde::Serialize {}
#[cfg(feature = "with-serde")]
impl<T: serde::Serialize> MaybeSerialize for T {}

#[cfg(not(feature = "with-serde"))]
pub trait MaybeSerialize {}
#[cfg(not(feature = "with-serde"))]
impl<T> MaybeSerialize for T {}

/// One line of a report, whatever the subcommand.
pub trait ReportRow: MaybeSerialize {
    fn human_lines(&self) -> Vec<String>;

    #[cfg(feature = "with-csv")]
    fn csv_header() -> &'static [&'static str];

    #[cfg(feature = "with-csv")]
    fn csv_record(&self) -> Vec<String>;
}

impl ReportRow for FallbackResult {
    fn human_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if self.accepted {
            lines.push(format!("[OK]       {} :: {self}", self.email));
        } else {
            lines.push(format!("[REJECTED] {} :: {self}", self.email));
        }
        for attempt in &self.attempts {
            lines.push(format!("        mx: {}", attempt_summary(attempt)));
            for event in &attempt.transcript {
                for line in event.to_string().lines() {
                    lines.push(format!("            {line}"));
                }
            }
        }
        lines
    }

    #[cfg(feature = "with-csv")]
    fn csv_header() -> &'static [&'static str] {
        &["email", "accepted", "host", "error_kind", "message"]
    }

    #[cfg(feature = "with-csv")]
    fn csv_record(&self) -> Vec<String> {
        vec![
            self.email.clone(),
            self.accepted.to_string(),
            self.host.clone().unwrap_or_default(),
            self.error_kind
                .map(|kind| kind.as_str().to_string())
                .unwrap_or_default(),
            self.message.clone().unwrap_or_default(),
        ]
    }
}

impl ReportRow for MxSummary {
    fn human_lines(&self) -> Vec<String> {
        let tag = if self.has_records() { "[OK]   " } else { "[NO MX]" };
        vec![format!("{tag} {} :: {}", self.domain, self.human_summary())]
    }

    #[cfg(feature = "with-csv")]
    fn csv_header() -> &'static [&'static str] {
        &["domain", "status", "detail"]
    }

    #[cfg(feature = "with-csv")]
    fn csv_record(&self) -> Vec<String> {
        let (status, detail) = self.csv_fields();
        vec![self.domain.clone(), status, detail]
    }
}

fn attempt_summary(attempt: &ProbeOutcome) -> String {
    let host = attempt.host.as_deref().unwrap_or("?");
    let detail = attempt.detail.as_deref().unwrap_or_default();
    match attempt.error_kind {
        None => format!("{host} accepted: {detail}"),
        Some(kind) => format!("{host} {kind}: {detail}"),
    }
}

pub fn write_reports<T: ReportRow>(rows: &[T], format: &str, out: Option<&str>) -> Result<()> {
    match format {
        "human" => write_human(rows),
        "json" => write_json(rows, out),
        "ndjson" => write_ndjson(rows, out),
        "csv" => write_csv(rows, out),
        other => bail!("unknown --format '{other}', use: human|json|ndjson|csv"),
    }
}

fn write_human<T: ReportRow>(rows: &[T]) -> Result<()> {
    for row in rows {
        for line in row.human_lines() {
            println!("{line}");
        }
    }
    Ok(())
}

#[cfg(feature = "with-serde")]
fn write_json<T: ReportRow>(rows: &[T], out: Option<&str>) -> Result<()> {
    let s = serde_json::to_string_pretty(rows)?;
    if let Some(path) = out {
        write_all_atomically(path, s.as_bytes())?;
    } else {
        println!("{s}");
    }
    Ok(())
}

#[cfg(not(feature = "with-serde"))]
fn write_json<T: ReportRow>(_: &[T], _: Option<&str>) -> Result<()> {
    bail!("format=json nécessite la feature 'with-serde'")
}

#[cfg(feature = "with-serde")]
fn write_ndjson<T: ReportRow>(rows: &[T], out: Option<&str>) -> Result<()> {
    let mut buf = Vec::new();
    for row in rows {
        serde_json::to_writer(&mut buf, row)?;
        buf.push(b'\n');
    }
    if let Some(path) = out {
        write_all_atomically(path, &buf)?;
    } else {
        use std::io::Write;
        std::io::stdout().lock().write_all(&buf)?;
    }
    Ok(())
}

#[cfg(not(feature = "with-serde"))]
fn write_ndjson<T: ReportRow>(_: &[T], _: Option<&str>) -> Result<()> {
    bail!("format=ndjson nécessite la feature 'with-serde'")
}

#[cfg(feature = "with-csv")]
fn write_csv<T: ReportRow>(rows: &[T], out: Option<&str>) -> Result<()> {
    if let Some(path) = out {
        let data = csv_bytes(rows)?;
        write_all_atomically(path, &data)?;
    } else {
        let mut wtr = csv::Writer::from_writer(std::io::stdout());
        wtr.write_record(T::csv_header())?;
        for row in rows {
            wtr.write_record(row.csv_record())?;
        }
        wtr.flush()?;
    }
    Ok(())
}

#[cfg(feature = "with-csv")]
fn csv_bytes<T: ReportRow>(rows: &[T]) -> Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(T::csv_header())?;
    for row in rows {
        wtr.write_record(row.csv_record())?;
    }
    Ok(wtr.into_inner()?)
}

#[cfg(not(feature = "with-csv"))]
fn write_csv<T: ReportRow>(_: &[T], _: Option<&str>) -> Result<()> {
    bail!("format=csv nécessite la feature 'with-csv'")
}

#[cfg(any(feature = "with-serde", feature = "with-csv"))]
fn write_all_atomically(path: &str, bytes: &[u8]) -> Result<()> {
    use std::io::Write;

    let tmp = format!("{path}.tmp");
    {
        let mut f = std::fs::File::create(&tmp).with_context(|| format!("create {tmp}"))?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    std::fs::rename(&tmp, path).with_context(|| format!("rename {tmp} -> {path}"))?;
    Ok(())
}

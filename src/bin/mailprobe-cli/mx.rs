use mailprobe_lib::{MxError, MxRecord, MxStatus, check_mx};

#[cfg_attr(feature = "with-serde", derive(serde::Serialize))]
#[derive(Debug, Clone)]
pub struct MxSummary {
    pub domain: String,
    #[cfg_attr(feature = "with-serde", serde(skip_serializing_if = "Option::is_none"))]
    pub status: Option<MxStatus>,
    #[cfg_attr(feature = "with-serde", serde(skip_serializing_if = "Option::is_none"))]
    pub error: Option<String>,
}

impl MxSummary {
    pub fn from_status(domain: &str, status: MxStatus) -> Self {
        Self {
            domain: domain.to_string(),
            status: Some(status),
            error: None,
        }
    }

    pub fn from_error(domain: &str, error: &MxError) -> Self {
        Self {
            domain: domain.to_string(),
            status: None,
            error: Some(error.to_string()),
        }
    }

    pub fn has_records(&self) -> bool {
        self.status.as_ref().is_some_and(|status| !status.is_empty())
    }

    pub fn human_summary(&self) -> String {
        match (&self.status, &self.error) {
            (Some(MxStatus::Records(records)), _) => {
                format!("records: {}", join_records(records, ", "))
            }
            (Some(MxStatus::NoRecords), _) => "no MX records".to_string(),
            (None, Some(error)) => format!("error: {error}"),
            (None, None) => "unknown".to_string(),
        }
    }

    #[cfg(feature = "with-csv")]
    pub fn csv_fields(&self) -> (String, String) {
        match (&self.status, &self.error) {
            (Some(MxStatus::Records(records)), _) => {
                ("records".to_string(), join_records(records, ";"))
            }
            (Some(MxStatus::NoRecords), _) => ("no_records".to_string(), String::new()),
            (None, Some(error)) => ("error".to_string(), error.clone()),
            (None, None) => ("unknown".to_string(), String::new()),
        }
    }
}

fn join_records(records: &[MxRecord], separator: &str) -> String {
    records
        .iter()
        .map(|r| format!("{}:{}", r.preference, r.exchange))
        .collect::<Vec<_>>()
        .join(separator)
}

pub async fn resolve(domain: &str) -> MxSummary {
    match check_mx(domain).await {
        Ok(status) => MxSummary::from_status(domain, status),
        Err(err) if err.is_no_records() => MxSummary::from_status(domain, MxStatus::NoRecords),
        Err(err) => {
            tracing::warn!(domain, %err, "MX lookup failed");
            MxSummary::from_error(domain, &err)
        }
    }
}

use std::fmt;

/// One mail exchanger for a domain. Ordering is by ascending preference,
/// then by exchange name, so a sorted list is in fallback order.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MxRecord {
    pub preference: u16,
    /// Host name without the trailing root dot, lower-cased.
    pub exchange: String,
}

impl MxRecord {
    pub fn new(preference: u16, exchange: impl Into<String>) -> Self {
        Self {
            preference,
            exchange: exchange.into(),
        }
    }
}

impl fmt::Display for MxRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.preference, self.exchange)
    }
}

/// Answer of an MX lookup: candidates in fallback order, or none at all.
#[cfg_attr(
    feature = "with-serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "status", content = "records", rename_all = "snake_case")
)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MxStatus {
    Records(Vec<MxRecord>),
    NoRecords,
}

impl MxStatus {
    /// Sorts and deduplicates `records`; an empty list becomes `NoRecords`.
    pub fn from_records(mut records: Vec<MxRecord>) -> Self {
        records.sort();
        records.dedup();
        if records.is_empty() {
            Self::NoRecords
        } else {
            Self::Records(records)
        }
    }

    pub fn records(&self) -> &[MxRecord] {
        match self {
            Self::Records(records) => records,
            Self::NoRecords => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }

    pub fn into_records(self) -> Vec<MxRecord> {
        match self {
            Self::Records(records) => records,
            Self::NoRecords => Vec::new(),
        }
    }
}

//! History model types.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, SecondsFormat, TimeZone};
use serde::{Deserialize, Serialize};

/// Service name to samples, newest first.
pub type History = BTreeMap<String, Vec<HistoryEntry>>;

/// A single recorded status sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// RFC3339 timestamp
    pub timestamp: String,
    pub status: bool,
}

/// Format a sample time as RFC3339 with second precision.
pub fn format_timestamp<Tz>(time: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl HistoryEntry {
    /// Parsed timestamp, `None` when it is not valid RFC3339.
    pub fn time(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.timestamp).ok()
    }
}

//! JSON file history store.

use std::path::{Path, PathBuf};

use thiserror::Error;

use super::models::*;
use crate::scheduler::GroupResult;

/// History persistence error types.
#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// History file store with a per-service entry cap.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
    max_entries: usize,
}

impl HistoryStore {
    pub fn new<P: AsRef<Path>>(path: P, max_entries: usize) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            max_entries,
        }
    }

    /// Read the persisted history.
    ///
    /// A missing, unreadable, or corrupt file yields an empty history.
    pub fn load(&self) -> History {
        match self.try_load() {
            Ok(history) => history,
            Err(e) => {
                tracing::warn!(
                    "Failed to load history from {}, starting empty: {}",
                    self.path.display(),
                    e
                );
                History::new()
            }
        }
    }

    fn try_load(&self) -> Result<History, HistoryError> {
        let data = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Overwrite the persisted history in full.
    pub fn save(&self, history: &History) -> Result<(), HistoryError> {
        let data = serde_json::to_string_pretty(history)?;
        std::fs::write(&self.path, data)?;
        Ok(())
    }

    /// Add a sample for `name`, keeping the series newest first and capped.
    pub fn append(&self, history: &mut History, name: &str, status: bool, timestamp: &str) {
        let entries = history.entry(name.to_string()).or_default();

        // Inserted at the front so it stays ahead of equal timestamps.
        entries.insert(
            0,
            HistoryEntry {
                timestamp: timestamp.to_string(),
                status,
            },
        );

        // Unparsable timestamps compare as None and sink to the oldest end.
        entries.sort_by(|a, b| b.time().cmp(&a.time()));
        entries.truncate(self.max_entries);
    }

    /// Record one cycle's results: load, append everything, save.
    ///
    /// A failed save is logged and the updated history is still returned.
    pub fn record_cycle(&self, groups: &[GroupResult], timestamp: &str) -> History {
        let mut history = self.load();

        for result in groups.iter().flat_map(|g| &g.results) {
            self.append(&mut history, &result.name, result.status, timestamp);
        }

        if let Err(e) = self.save(&history) {
            tracing::error!("Failed to save history to {}: {}", self.path.display(), e);
        }

        history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::CheckResult;
    use chrono::{Duration, TimeZone, Utc};
    use tempfile::TempDir;

    fn ts(minute: i64) -> String {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        format_timestamp(&(base + Duration::minutes(minute)))
    }

    #[test]
    fn test_append_caps_and_orders_newest_first() {
        for (n, cap) in [(3usize, 10usize), (10, 10), (25, 10), (7, 1)] {
            let store = HistoryStore::new("unused.json", cap);
            let mut history = History::new();

            for i in 0..n {
                store.append(&mut history, "svc", i % 2 == 0, &ts(i as i64));
            }

            let entries = &history["svc"];
            assert_eq!(entries.len(), n.min(cap));

            let expected: Vec<String> = (0..n).rev().take(cap).map(|i| ts(i as i64)).collect();
            let got: Vec<String> = entries.iter().map(|e| e.timestamp.clone()).collect();
            assert_eq!(got, expected);
        }
    }

    #[test]
    fn test_append_out_of_order_is_resorted() {
        let store = HistoryStore::new("unused.json", 3);
        let mut history = History::new();

        store.append(&mut history, "svc", true, &ts(5));
        store.append(&mut history, "svc", false, &ts(1));
        store.append(&mut history, "svc", true, &ts(9));
        store.append(&mut history, "svc", false, &ts(3));

        let got: Vec<&str> = history["svc"].iter().map(|e| e.timestamp.as_str()).collect();
        assert_eq!(got, [ts(9), ts(5), ts(3)]);
    }

    #[test]
    fn test_equal_timestamps_keep_latest_first() {
        let store = HistoryStore::new("unused.json", 5);
        let mut history = History::new();

        store.append(&mut history, "svc", true, &ts(0));
        store.append(&mut history, "svc", false, &ts(0));

        assert!(!history["svc"][0].status);
        assert!(history["svc"][1].status);
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let store = HistoryStore::new(dir.path().join("history.json"), 10);

        let mut history = History::new();
        store.append(&mut history, "api", true, &ts(0));
        store.append(&mut history, "db", false, &ts(0));
        store.save(&history).unwrap();

        assert_eq!(store.load(), history);
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = HistoryStore::new(dir.path().join("nope.json"), 10);
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_load_corrupt_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, r#"{"api":[{"timestamp":"2024-01-01T00:00:00Z","sta"#).unwrap();

        let store = HistoryStore::new(&path, 10);
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_save_to_missing_directory_fails() {
        let store = HistoryStore::new("/nonexistent/dir/history.json", 10);
        assert!(matches!(store.save(&History::new()), Err(HistoryError::Io(_))));
    }

    #[test]
    fn test_record_cycle() {
        let dir = TempDir::new().unwrap();
        let store = HistoryStore::new(dir.path().join("history.json"), 2);

        let cycle = |a: bool, b: bool| {
            vec![
                GroupResult {
                    title: "One".to_string(),
                    results: vec![CheckResult { name: "a".to_string(), status: a }],
                },
                GroupResult {
                    title: "Two".to_string(),
                    results: vec![CheckResult { name: "b".to_string(), status: b }],
                },
            ]
        };

        store.record_cycle(&cycle(true, false), &ts(0));
        store.record_cycle(&cycle(false, false), &ts(1));
        let history = store.record_cycle(&cycle(true, true), &ts(2));

        assert_eq!(history, store.load());
        let a: Vec<bool> = history["a"].iter().map(|e| e.status).collect();
        let b: Vec<bool> = history["b"].iter().map(|e| e.status).collect();
        assert_eq!(a, [true, false]);
        assert_eq!(b, [true, false]);
    }
}

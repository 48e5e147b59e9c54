//! Configuration module for tinystatus.
//!
//! Loads configuration from environment variables (and an optional `.env`
//! file) with sensible defaults, and reads the check groups from YAML.

use std::env;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::probe::Group;

/// Configuration error types. All of them are fatal.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
    #[error("failed to read checks file {path}: {source}")]
    ReadChecks {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse checks file {path}: {source}")]
    ParseChecks {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("HISTORY_FILE {0} would be overwritten by a published snapshot")]
    HistoryFileConflict(PathBuf),
}

/// Monitor configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Seconds between cycles (default: 60)
    pub check_interval: u64,
    /// History cap per service (default: 10)
    pub max_history_entries: usize,
    /// YAML file with the check groups (default: "checks.yaml")
    pub checks_file: PathBuf,
    /// Markdown shown as incidents (default: "incidents.html")
    pub incidents_file: PathBuf,
    /// Persisted history (default: "history.json")
    pub history_file: PathBuf,
    /// Directory for snapshots and static pages (default: "status")
    pub html_output_directory: PathBuf,
    /// Web server port, `None` disables the server
    pub port: Option<u16>,
    /// Telegram bot token
    pub token: String,
    /// Telegram chat id
    pub chat_id: String,
    /// Probe permits shared by a whole cycle (default: 1500)
    pub max_concurrency: usize,
    /// Telegram API base URL (default: "https://api.telegram.org")
    pub telegram_api_url: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            check_interval: 60,
            max_history_entries: 10,
            checks_file: PathBuf::from("checks.yaml"),
            incidents_file: PathBuf::from("incidents.html"),
            history_file: PathBuf::from("history.json"),
            html_output_directory: PathBuf::from("status"),
            port: None,
            token: String::new(),
            chat_id: String::new(),
            max_concurrency: 1500,
            telegram_api_url: "https://api.telegram.org".to_string(),
        }
    }
}

impl MonitorConfig {
    /// Load configuration from the environment.
    ///
    /// A `.env` file in the working directory is merged first if present.
    /// Unparsable numbers are an error rather than silently defaulted.
    pub fn load() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            tracing::info!("No .env file loaded ({}), using process environment", e);
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(v) = parse_var(&lookup, "CHECK_INTERVAL")? {
            cfg.check_interval = v;
        }
        if let Some(v) = parse_var(&lookup, "MAX_HISTORY_ENTRIES")? {
            cfg.max_history_entries = v;
        }
        if let Some(v) = lookup("CHECKS_FILE") {
            cfg.checks_file = PathBuf::from(v);
        }
        if let Some(v) = lookup("INCIDENTS_FILE") {
            cfg.incidents_file = PathBuf::from(v);
        }
        if let Some(v) = lookup("HISTORY_FILE") {
            cfg.history_file = PathBuf::from(v);
        }
        if let Some(v) = lookup("HTML_OUTPUT_DIRECTORY") {
            cfg.html_output_directory = PathBuf::from(v);
        }
        cfg.port = parse_var::<u16, _>(&lookup, "PORT")?.filter(|p| *p != 0);
        if let Some(v) = lookup("TOKEN") {
            cfg.token = v;
        }
        if let Some(v) = lookup("CHATID") {
            cfg.chat_id = v;
        }
        if let Some(v) = parse_var::<usize, _>(&lookup, "MAX_CONCURRENCY")? {
            if v == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "MAX_CONCURRENCY",
                    value: "0".to_string(),
                });
            }
            cfg.max_concurrency = v;
        }
        if let Some(v) = lookup("TELEGRAM_API_URL") {
            cfg.telegram_api_url = v.trim_end_matches('/').to_string();
        }

        if [cfg.status_snapshot_file(), cfg.history_snapshot_file()]
            .iter()
            .any(|snapshot| same_path(snapshot, &cfg.history_file))
        {
            return Err(ConfigError::HistoryFileConflict(cfg.history_file));
        }

        Ok(cfg)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.check_interval)
    }

    pub fn status_snapshot_file(&self) -> PathBuf {
        self.html_output_directory.join("status.json")
    }

    pub fn history_snapshot_file(&self) -> PathBuf {
        self.html_output_directory.join("history_snapshot.json")
    }

    /// Log the effective configuration, token redacted.
    pub fn log_summary(&self) {
        let token = if self.token.is_empty() { "<unset>" } else { "<redacted>" };
        tracing::info!(
            check_interval = self.check_interval,
            max_history_entries = self.max_history_entries,
            checks_file = %self.checks_file.display(),
            incidents_file = %self.incidents_file.display(),
            history_file = %self.history_file.display(),
            html_output_directory = %self.html_output_directory.display(),
            port = ?self.port,
            token,
            chat_id = %self.chat_id,
            max_concurrency = self.max_concurrency,
            "Effective configuration"
        );
    }
}

/// Lexical path comparison that ignores `.` components.
fn same_path(a: &Path, b: &Path) -> bool {
    let a = a.components().filter(|c| *c != Component::CurDir);
    let b = b.components().filter(|c| *c != Component::CurDir);
    a.eq(b)
}

fn parse_var<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
    }
}

/// Read and parse the check groups. Called fresh every cycle.
pub fn load_groups(path: &Path) -> Result<Vec<Group>, ConfigError> {
    let data = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadChecks {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&data).map_err(|source| ConfigError::ParseChecks {
        path: path.to_path_buf(),
        source,
    })
}

//! Scheduler module driving the monitoring cycle.
//!
//! One cycle: load groups, probe everything, record history, send alerts,
//! publish snapshots. Cycles run back to back with `check_interval` of sleep
//! in between.

mod runner;

pub use runner::*;

use std::sync::Arc;

use chrono::Local;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::alert::{AlertEngine, NotifyError, TelegramNotifier};
use crate::config::{load_groups, ConfigError, MonitorConfig};
use crate::history::{format_timestamp, HistoryStore};
use crate::probe::{ProbeError, ProberSet, PROBE_TIMEOUT};
use crate::snapshot::{
    format_last_updated, read_incidents, write_json, HistorySnapshot, StatusSnapshot,
};

/// Errors that stop the monitor.
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to set up probers: {0}")]
    Probe(#[from] ProbeError),
    #[error("failed to set up notifier: {0}")]
    Notify(#[from] NotifyError),
}

/// Latest snapshots, shared with the web layer.
#[derive(Debug, Default)]
pub struct Snapshots {
    pub status: Option<StatusSnapshot>,
    pub history: Option<HistorySnapshot>,
}

pub type SharedSnapshots = Arc<RwLock<Snapshots>>;

/// Counts from one completed cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub checks: usize,
    pub down: usize,
    pub notifications: usize,
}

/// Drives monitoring cycles.
pub struct Monitor {
    config: MonitorConfig,
    runner: ConcurrentRunner,
    history: HistoryStore,
    alerts: AlertEngine,
    snapshots: SharedSnapshots,
}

impl Monitor {
    /// Assemble a monitor from already built components.
    pub fn new(config: MonitorConfig, runner: ConcurrentRunner, alerts: AlertEngine) -> Self {
        let history = HistoryStore::new(&config.history_file, config.max_history_entries);
        Self {
            config,
            runner,
            history,
            alerts,
            snapshots: Arc::new(RwLock::new(Snapshots::default())),
        }
    }

    /// Build a monitor with the system probers and the Telegram notifier.
    pub fn from_config(config: MonitorConfig) -> Result<Self, MonitorError> {
        let probers = ProberSet::new(PROBE_TIMEOUT)?;
        let runner = ConcurrentRunner::new(probers, config.max_concurrency);

        let notifier =
            TelegramNotifier::new(&config.telegram_api_url, &config.token, &config.chat_id)?;
        if !notifier.is_configured() {
            tracing::warn!("TOKEN or CHATID not set, notifications will only be logged");
        }
        let alerts = AlertEngine::new(config.check_interval, Arc::new(notifier));

        Ok(Self::new(config, runner, alerts))
    }

    pub fn snapshots(&self) -> SharedSnapshots {
        self.snapshots.clone()
    }

    /// Run cycles forever. Returns only on a fatal configuration error.
    pub async fn run(&self) -> Result<(), MonitorError> {
        tracing::info!("Monitoring services every {}s", self.config.check_interval);

        loop {
            self.run_cycle().await?;
            tokio::time::sleep(self.config.interval()).await;
        }
    }

    /// Run a single cycle.
    pub async fn run_cycle(&self) -> Result<CycleReport, MonitorError> {
        let groups = load_groups(&self.config.checks_file)?;

        let results = self.runner.run(&groups).await;

        let now = Local::now();
        let timestamp = format_timestamp(&now);
        let history = self.history.record_cycle(&results, &timestamp);

        let notifications = self.alerts.process(&history).await;

        let all = results.iter().flat_map(|g| &g.results);
        let report = CycleReport {
            checks: all.clone().count(),
            down: all.filter(|r| !r.status).count(),
            notifications: notifications.len(),
        };

        let last_updated = format_last_updated(&now);
        let status = StatusSnapshot {
            groups: results,
            incidents: read_incidents(&self.config.incidents_file),
            last_updated: last_updated.clone(),
        };
        let history = HistorySnapshot {
            history,
            last_updated,
        };
        self.publish(status, history).await;

        tracing::info!(
            "Cycle complete: {} checks, {} down, {} notifications",
            report.checks,
            report.down,
            report.notifications
        );
        Ok(report)
    }

    async fn publish(&self, status: StatusSnapshot, history: HistorySnapshot) {
        let status_file = self.config.status_snapshot_file();
        if let Err(e) = write_json(&status_file, &status) {
            tracing::error!("Failed to write {}: {}", status_file.display(), e);
        }
        let history_file = self.config.history_snapshot_file();
        if let Err(e) = write_json(&history_file, &history) {
            tracing::error!("Failed to write {}: {}", history_file.display(), e);
        }

        let mut snapshots = self.snapshots.write().await;
        snapshots.status = Some(status);
        snapshots.history = Some(history);
    }
}

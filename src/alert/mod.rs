//! Alert module: status transition detection and notification.
//!
//! Detection only compares positions in the newest-first history. Wall-clock
//! gaps (restarts, skipped cycles) are not taken into account.

mod telegram;

pub use telegram::*;

use std::sync::Arc;

use crate::history::{History, HistoryEntry};

/// Seconds added per extra sample found in the previous state.
const SECONDS_PER_PREVIOUS_SAMPLE: u64 = 60;

/// Debounce state of a single service's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    /// Fewer than two samples, always reported
    InsufficientHistory,
    /// The two newest samples agree
    Stable,
    /// The two newest samples differ
    Transitioned,
}

impl ServiceState {
    pub fn classify(entries: &[HistoryEntry]) -> Self {
        match entries {
            [newest, previous, ..] if newest.status == previous.status => ServiceState::Stable,
            [_, _, ..] => ServiceState::Transitioned,
            _ => ServiceState::InsufficientHistory,
        }
    }
}

/// A notification that is due for one service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub service: String,
    pub status: bool,
    /// Approximate seconds spent in the previous state
    pub previous_duration: Option<u64>,
    pub message: String,
}

/// Decides which services changed state and hands the messages to a notifier.
pub struct AlertEngine {
    check_interval: u64,
    notifier: Arc<dyn Notifier>,
}

impl AlertEngine {
    pub fn new(check_interval: u64, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            check_interval,
            notifier,
        }
    }

    /// Compute the notifications due for this history.
    pub fn evaluate(&self, history: &History) -> Vec<Notification> {
        history
            .iter()
            .filter_map(|(service, entries)| self.evaluate_service(service, entries))
            .collect()
    }

    fn evaluate_service(&self, service: &str, entries: &[HistoryEntry]) -> Option<Notification> {
        let newest = entries.first()?;

        let previous_duration = match ServiceState::classify(entries) {
            ServiceState::Stable => return None,
            ServiceState::InsufficientHistory => None,
            ServiceState::Transitioned => {
                Some(previous_state_duration(entries, self.check_interval))
            }
        };

        Some(Notification {
            service: service.to_string(),
            status: newest.status,
            previous_duration,
            message: format_message(service, newest.status, previous_duration),
        })
    }

    /// Deliver notifications one by one. Failures are logged and dropped.
    pub async fn deliver(&self, notifications: &[Notification]) {
        for n in notifications {
            tracing::info!("{} is now {}", n.service, status_word(n.status));

            match self.notifier.send(&n.message).await {
                Ok(()) => tracing::debug!("Notification for {} delivered", n.service),
                Err(NotifyError::NotConfigured) => {
                    tracing::debug!("Notifier not configured, skipping {}", n.service)
                }
                Err(e) => tracing::warn!("Failed to notify about {}: {}", n.service, e),
            }
        }
    }

    /// Evaluate and deliver in one go.
    pub async fn process(&self, history: &History) -> Vec<Notification> {
        let notifications = self.evaluate(history);
        self.deliver(&notifications).await;
        notifications
    }
}

/// Estimate how long the service was in the state it just left.
///
/// Starts at one check interval and adds a flat 60 seconds for every further
/// consecutive sample matching the second-newest one, independent of the
/// configured interval.
fn previous_state_duration(entries: &[HistoryEntry], check_interval: u64) -> u64 {
    let Some(previous) = entries.get(1) else {
        return 0;
    };

    let extra = entries[2..]
        .iter()
        .take_while(|e| e.status == previous.status)
        .count() as u64;

    check_interval + SECONDS_PER_PREVIOUS_SAMPLE * extra
}

fn status_word(status: bool) -> &'static str {
    if status {
        "Up"
    } else {
        "Down"
    }
}

fn format_message(service: &str, status: bool, previous_duration: Option<u64>) -> String {
    let mut message = format!(
        "<b>{}</b> is now <b>{}</b>",
        escape_html(service),
        status_word(status)
    );
    if let Some(secs) = previous_duration {
        message.push_str(&format!(
            "\nIt was {} for about {}",
            status_word(!status),
            format_duration(secs)
        ));
    }
    message
}

/// Render seconds as e.g. `45s`, `2m0s`, `1h1m5s`.
pub fn format_duration(secs: u64) -> String {
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{}h{}m{}s", h, m, s)
    } else if m > 0 {
        format!("{}m{}s", m, s)
    } else {
        format!("{}s", s)
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

//! Per-cycle snapshots handed to the rendering layer.

use std::path::Path;

use chrono::{DateTime, Local};
use pulldown_cmark::{html, Parser};
use serde::Serialize;
use thiserror::Error;

use crate::history::History;
use crate::scheduler::GroupResult;

/// Markdown shown when the incidents file cannot be read.
pub const DEFAULT_INCIDENTS: &str = "## All Fine!";

/// Snapshot output error types.
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Current status of every group.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub groups: Vec<GroupResult>,
    /// HTML fragment
    pub incidents: String,
    pub last_updated: String,
}

/// Full history of every service.
#[derive(Debug, Clone, Serialize)]
pub struct HistorySnapshot {
    pub history: History,
    pub last_updated: String,
}

/// Snapshot timestamp format, e.g. `2024-01-01 12:00:00`.
pub fn format_last_updated(time: &DateTime<Local>) -> String {
    time.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Read the incidents markdown and render it to HTML.
///
/// An unreadable file renders [`DEFAULT_INCIDENTS`] instead. Inline HTML in
/// the file is passed through.
pub fn read_incidents(path: &Path) -> String {
    let markdown = std::fs::read_to_string(path).unwrap_or_else(|e| {
        tracing::warn!("Failed to load incidents from {}: {}", path.display(), e);
        DEFAULT_INCIDENTS.to_string()
    });
    render_markdown(&markdown)
}

fn render_markdown(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, Parser::new(markdown));
    out
}

/// Write a snapshot as pretty JSON, replacing any previous file.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), OutputError> {
    let data = serde_json::to_string_pretty(value)?;
    std::fs::write(path, data)?;
    Ok(())
}

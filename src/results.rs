//! Summary of a completed run, printed after the terminal is restored.

use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;

use crate::orchestrator::{RunState, TestPhase};

/// Final figures of a completed run.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RunSummary {
    /// Timestamp when the summary was taken
    pub timestamp: DateTime<Utc>,
    /// Server label
    pub server: String,
    pub download_mbps: f64,
    pub upload_mbps: f64,
    pub ping_ms: f64,
    /// Wall time of the run in seconds
    pub duration_secs: f64,
}

impl RunSummary {
    /// Summarize `state`, or `None` when the run did not complete.
    pub fn from_state(state: &RunState) -> Option<Self> {
        if state.phase != TestPhase::Complete {
            return None;
        }

        Some(Self {
            timestamp: Utc::now(),
            server: state.server_label.clone(),
            download_mbps: state.download_speed,
            upload_mbps: state.upload_speed,
            ping_ms: state.ping,
            duration_secs: state.duration.map(|d| d.as_secs_f64()).unwrap_or_default(),
        })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Human-readable summary, one figure per line.
    pub fn to_text(&self) -> String {
        [
            format!("{} {}", "Server:".bold().white(), self.server.bright_blue()),
            format!(
                "{} {}",
                "Download speed:".bold().white(),
                format!("{:.1} Mbps", self.download_mbps).bright_cyan()
            ),
            format!(
                "{} {}",
                "Upload speed:".bold().white(),
                format!("{:.1} Mbps", self.upload_mbps).bright_cyan()
            ),
            format!("{} {:.1} ms", "Ping:".bold().white(), self.ping_ms),
            format!("{} {:.1}s", "Test duration:".bold().white(), self.duration_secs),
            format!(
                "{} {}",
                "Completed:".bold().white(),
                self.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
            ),
        ]
        .join("\n")
    }
}

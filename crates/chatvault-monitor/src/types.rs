//! Monitoring session types.

use chatvault_core::ErrorDetail;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Monitoring session lifecycle.
///
/// `Starting → Active ⇄ Paused → Stopped`, with `Error` reachable from
/// Starting/Active on unrecoverable failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Starting,
    Active,
    Paused,
    Stopped,
    Error,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Stopped | SessionState::Error)
    }
}

/// Point-in-time snapshot of a monitoring session.
#[derive(Debug, Clone, Serialize)]
pub struct MonitoringSession {
    pub id: String,
    pub provider: String,
    pub fingerprint: String,
    pub tool: String,
    pub parameters: Value,
    pub polling_interval_secs: u64,
    pub webhook_url: String,
    pub state: SessionState,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_poll_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_poll_at: Option<DateTime<Utc>>,
    pub conversations_captured: usize,
    pub consecutive_failures: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<ErrorDetail>,
}

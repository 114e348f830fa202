//! ChatVault Monitor — long-lived polling sessions with webhook delivery.

pub mod manager;
pub mod types;
pub mod webhook;

pub use manager::MonitorManager;
pub use types::{MonitoringSession, SessionState};
pub use webhook::{dedupe_key, HttpWebhookSink, WebhookSink};

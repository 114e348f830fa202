//! Webhook notification sink.
//!
//! Delivery is at-least-once; every notification carries a dedupe key so
//! receivers can discard duplicates.

use async_trait::async_trait;
use chatvault_core::{Error, Result};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Delivers webhook notifications. Transport retries are the sink's
/// concern, not the session loop's.
#[async_trait]
pub trait WebhookSink: Send + Sync {
    async fn deliver(&self, url: &str, payload: &Value, dedupe_key: &str) -> Result<()>;
}

/// Dedupe key for a notification: hash of provider, conversation, and
/// the newest message it announces.
pub fn dedupe_key(provider: &str, conversation_id: &str, message_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(provider.as_bytes());
    hasher.update(b"\x00");
    hasher.update(conversation_id.as_bytes());
    hasher.update(b"\x00");
    hasher.update(message_id.as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..16])
}

/// HTTP sink: POSTs the JSON payload with the dedupe key in a header.
pub struct HttpWebhookSink {
    client: reqwest::Client,
}

impl HttpWebhookSink {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpWebhookSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WebhookSink for HttpWebhookSink {
    async fn deliver(&self, url: &str, payload: &Value, dedupe_key: &str) -> Result<()> {
        let response = self
            .client
            .post(url)
            .header("X-Dedupe-Key", dedupe_key)
            .json(payload)
            .send()
            .await
            .map_err(|e| Error::ProviderUnavailable(format!("webhook delivery failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Execution(format!(
                "webhook endpoint returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}

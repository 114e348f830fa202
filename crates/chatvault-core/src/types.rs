//! Canonical conversation model shared by every component.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Message author role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Parse a provider-reported role string. `None` for anything outside
    /// the canonical set (callers decide whether that is malformed).
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }
}

/// A tool invocation recorded inside a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub tool: String,
    pub parameters: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
}

/// A single message within a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Provider-native message id, when the provider exposes one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRecord>,
}

impl Message {
    /// De-duplication identity: the provider message id when present,
    /// otherwise timestamp plus a content hash.
    pub fn identity(&self) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => {
                let mut hasher = Sha256::new();
                hasher.update(self.content.as_bytes());
                let digest = hasher.finalize();
                format!(
                    "{}|{}",
                    self.timestamp.to_rfc3339(),
                    hex::encode(&digest[..8])
                )
            }
        }
    }
}

/// A canonical conversation, namespaced by provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Canonical id: `{provider}:{provider_conversation_id}`.
    pub id: String,
    pub provider: String,
    pub provider_conversation_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub messages: Vec<Message>,
}

impl Conversation {
    /// Build the canonical id for a provider-native conversation id.
    pub fn canonical_id(provider: &str, native_id: &str) -> String {
        format!("{}:{}", provider, native_id)
    }
}

//! Payload normalization — provider field names to the canonical model.

use std::collections::HashSet;

use chatvault_core::{Conversation, Error, Message, Result, Role, ToolCallRecord};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

/// Outcome of normalizing one extraction payload. A malformed
/// conversation lands in `errors`; the rest of the batch still succeeds.
#[derive(Debug, Default)]
pub struct NormalizedBatch {
    pub conversations: Vec<Conversation>,
    pub errors: Vec<ConversationError>,
    pub extraction_method: Option<String>,
}

/// A per-conversation normalization failure.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    pub error: String,
}

/// Normalize a raw extraction payload for `provider`.
pub fn normalize_batch(provider: &str, payload: &Value) -> NormalizedBatch {
    let mut batch = NormalizedBatch {
        extraction_method: payload["metadata"]["extraction_method"]
            .as_str()
            .map(|s| s.to_string()),
        ..NormalizedBatch::default()
    };

    let entries = match payload.get("conversations").and_then(|c| c.as_array()) {
        Some(entries) => entries,
        None => {
            batch.errors.push(ConversationError {
                conversation_id: None,
                error: Error::MalformedPayload("payload missing conversations array".into())
                    .to_string(),
            });
            return batch;
        }
    };

    for entry in entries {
        let native_id = entry
            .get("id")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());
        match normalize_conversation(provider, entry) {
            Ok(conversation) => batch.conversations.push(conversation),
            Err(err) => {
                warn!(
                    "Dropping malformed conversation {:?} from {}: {}",
                    native_id, provider, err
                );
                batch.errors.push(ConversationError {
                    conversation_id: native_id,
                    error: err.to_string(),
                });
            }
        }
    }

    batch
}

fn normalize_conversation(provider: &str, entry: &Value) -> Result<Conversation> {
    let native_id = entry
        .get("id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::MalformedPayload("conversation missing id".into()))?;

    let title = entry
        .get("title")
        .and_then(|v| v.as_str())
        .unwrap_or("Untitled")
        .to_string();

    let subject = entry
        .get("subject")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());

    let created_at = parse_timestamp(entry.get("created_at"));

    let raw_messages = entry
        .get("messages")
        .and_then(|m| m.as_array())
        .ok_or_else(|| Error::MalformedPayload("conversation missing messages".into()))?;

    let mut messages = Vec::with_capacity(raw_messages.len());
    for raw in raw_messages {
        if let Some(message) = normalize_message(raw, created_at)? {
            messages.push(message);
        }
    }

    // Dedupe by identity, keeping the first occurrence.
    let mut seen: HashSet<String> = HashSet::new();
    messages.retain(|m| seen.insert(m.identity()));

    // Out-of-order input is sorted, not rejected.
    messages.sort_by_key(|m| m.timestamp);

    let created_at = created_at
        .or_else(|| messages.first().map(|m| m.timestamp))
        .unwrap_or(DateTime::UNIX_EPOCH);
    let updated_at = parse_timestamp(entry.get("updated_at"))
        .or_else(|| messages.last().map(|m| m.timestamp))
        .unwrap_or(created_at);

    Ok(Conversation {
        id: Conversation::canonical_id(provider, native_id),
        provider: provider.to_string(),
        provider_conversation_id: native_id.to_string(),
        title,
        subject,
        created_at,
        updated_at,
        messages,
    })
}

/// Normalize one message. `Ok(None)` for system messages, which carry no
/// conversational content and are dropped.
fn normalize_message(
    raw: &Value,
    conversation_created_at: Option<DateTime<Utc>>,
) -> Result<Option<Message>> {
    let role_str = raw
        .get("role")
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::MalformedPayload("message missing role".into()))?;

    if role_str == "system" {
        return Ok(None);
    }

    let role = Role::parse(role_str)
        .ok_or_else(|| Error::MalformedPayload(format!("unrecognized role: {}", role_str)))?;

    let content = raw
        .get("content")
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::MalformedPayload("message missing content".into()))?
        .to_string();

    let timestamp = parse_timestamp(raw.get("timestamp"))
        .or(conversation_created_at)
        .unwrap_or(DateTime::UNIX_EPOCH);

    let id = raw
        .get("id")
        .or_else(|| raw.get("provider_message_id"))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());

    let tool_calls = raw
        .get("tool_calls")
        .and_then(|v| v.as_array())
        .map(|calls| {
            calls
                .iter()
                .filter_map(|call| {
                    let tool = call.get("tool").and_then(|t| t.as_str())?;
                    Some(ToolCallRecord {
                        tool: tool.to_string(),
                        parameters: call
                            .get("parameters")
                            .cloned()
                            .unwrap_or_else(|| Value::Object(Default::default())),
                        result: call.get("result").cloned(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(Some(Message {
        id,
        role,
        content,
        timestamp,
        tool_calls,
    }))
}

fn parse_timestamp(value: Option<&Value>) -> Option<DateTime<Utc>> {
    value
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(conversations: Value) -> Value {
        json!({
            "conversations": conversations,
            "metadata": {
                "provider": "chatgpt",
                "extraction_method": "web_scraping",
                "total_conversations": 1
            }
        })
    }

    #[test]
    fn test_normalize_basic_payload() {
        let batch = normalize_batch(
            "chatgpt",
            &payload(json!([{
                "id": "conv_1",
                "title": "Pandas Help",
                "messages": [
                    {"role": "user", "content": "hi", "timestamp": "2024-01-15T10:00:00Z"},
                    {"role": "assistant", "content": "hello", "timestamp": "2024-01-15T10:00:15Z"}
                ],
                "created_at": "2024-01-15T10:00:00Z",
                "updated_at": "2024-01-15T10:30:00Z"
            }])),
        );

        assert!(batch.errors.is_empty());
        assert_eq!(batch.conversations.len(), 1);
        assert_eq!(batch.extraction_method.as_deref(), Some("web_scraping"));

        let conv = &batch.conversations[0];
        assert_eq!(conv.id, "chatgpt:conv_1");
        assert_eq!(conv.provider_conversation_id, "conv_1");
        assert_eq!(conv.messages.len(), 2);
        assert_eq!(conv.messages[0].role, Role::User);
    }

    #[test]
    fn test_out_of_order_messages_are_sorted() {
        let batch = normalize_batch(
            "claude",
            &payload(json!([{
                "id": "c1",
                "messages": [
                    {"role": "assistant", "content": "second", "timestamp": "2024-01-15T10:00:30Z"},
                    {"role": "user", "content": "first", "timestamp": "2024-01-15T10:00:00Z"}
                ]
            }])),
        );

        let conv = &batch.conversations[0];
        assert_eq!(conv.messages[0].content, "first");
        assert_eq!(conv.messages[1].content, "second");
        assert!(conv
            .messages
            .windows(2)
            .all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn test_dedupe_by_provider_message_id() {
        let batch = normalize_batch(
            "claude",
            &payload(json!([{
                "id": "c1",
                "messages": [
                    {"id": "m1", "role": "user", "content": "hi", "timestamp": "2024-01-15T10:00:00Z"},
                    {"id": "m1", "role": "user", "content": "hi again", "timestamp": "2024-01-15T10:05:00Z"}
                ]
            }])),
        );
        assert_eq!(batch.conversations[0].messages.len(), 1);
        assert_eq!(batch.conversations[0].messages[0].content, "hi");
    }

    #[test]
    fn test_dedupe_by_timestamp_and_content() {
        let batch = normalize_batch(
            "claude",
            &payload(json!([{
                "id": "c1",
                "messages": [
                    {"role": "user", "content": "hi", "timestamp": "2024-01-15T10:00:00Z"},
                    {"role": "user", "content": "hi", "timestamp": "2024-01-15T10:00:00Z"},
                    {"role": "user", "content": "hi", "timestamp": "2024-01-15T10:00:01Z"}
                ]
            }])),
        );
        assert_eq!(batch.conversations[0].messages.len(), 2);
    }

    #[test]
    fn test_system_messages_dropped() {
        let batch = normalize_batch(
            "chatgpt",
            &payload(json!([{
                "id": "c1",
                "messages": [
                    {"role": "system", "content": "You are helpful.", "timestamp": "2024-01-15T09:00:00Z"},
                    {"role": "user", "content": "hi", "timestamp": "2024-01-15T10:00:00Z"}
                ]
            }])),
        );
        assert_eq!(batch.conversations[0].messages.len(), 1);
    }

    #[test]
    fn test_malformed_conversation_does_not_abort_batch() {
        let batch = normalize_batch(
            "chatgpt",
            &payload(json!([
                {
                    "id": "bad",
                    "messages": [{"content": "no role here"}]
                },
                {
                    "id": "good",
                    "messages": [{"role": "user", "content": "hi", "timestamp": "2024-01-15T10:00:00Z"}]
                }
            ])),
        );

        assert_eq!(batch.conversations.len(), 1);
        assert_eq!(batch.conversations[0].provider_conversation_id, "good");
        assert_eq!(batch.errors.len(), 1);
        assert_eq!(batch.errors[0].conversation_id.as_deref(), Some("bad"));
        assert!(batch.errors[0].error.contains("role"));
    }

    #[test]
    fn test_unrecognized_role_is_malformed() {
        let batch = normalize_batch(
            "chatgpt",
            &payload(json!([{
                "id": "c1",
                "messages": [{"role": "moderator", "content": "x", "timestamp": "2024-01-15T10:00:00Z"}]
            }])),
        );
        assert!(batch.conversations.is_empty());
        assert!(batch.errors[0].error.contains("moderator"));
    }

    #[test]
    fn test_missing_conversations_array() {
        let batch = normalize_batch("chatgpt", &json!({"unexpected": true}));
        assert!(batch.conversations.is_empty());
        assert_eq!(batch.errors.len(), 1);
        assert!(batch.errors[0].conversation_id.is_none());
    }

    #[test]
    fn test_tool_calls_carried_through() {
        let batch = normalize_batch(
            "claude",
            &payload(json!([{
                "id": "c1",
                "messages": [{
                    "role": "assistant",
                    "content": "ran a search",
                    "timestamp": "2024-01-15T10:00:00Z",
                    "tool_calls": [
                        {"tool": "web_search", "parameters": {"query": "rust"}, "result": {"hits": 3}}
                    ]
                }]
            }])),
        );
        let msg = &batch.conversations[0].messages[0];
        assert_eq!(msg.tool_calls.len(), 1);
        assert_eq!(msg.tool_calls[0].tool, "web_search");
        assert_eq!(msg.tool_calls[0].parameters["query"], "rust");
    }

    #[test]
    fn test_timestamps_fall_back_to_conversation() {
        let batch = normalize_batch(
            "claude",
            &payload(json!([{
                "id": "c1",
                "created_at": "2024-01-15T08:00:00Z",
                "messages": [{"role": "user", "content": "no timestamp"}]
            }])),
        );
        let conv = &batch.conversations[0];
        assert_eq!(
            conv.messages[0].timestamp,
            "2024-01-15T08:00:00Z".parse::<DateTime<Utc>>().unwrap()
        );
    }
}

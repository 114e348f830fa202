//! ChatVault Store — the conversation store seam.
//!
//! The orchestrator is storage-agnostic: it emits normalized records
//! through `ConversationStore` and never owns persistence. The in-memory
//! implementation here backs tests and single-process deployments.

use std::collections::HashMap;

use chatvault_core::{Conversation, Result};
use chatvault_normalize::merge_conversations;
use parking_lot::RwLock;
use serde::Deserialize;
use tracing::debug;

/// Listing filters; both are optional and conjunctive.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListFilter {
    pub provider: Option<String>,
    pub subject: Option<String>,
}

/// What an upsert did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    /// Merged into an existing record; carries the count of new messages.
    Merged(usize),
}

/// Conversation store interface consumed by the orchestrator.
pub trait ConversationStore: Send + Sync {
    /// Insert or merge a conversation by canonical id. Re-extraction of
    /// the same provider conversation updates the existing record.
    fn upsert_conversation(&self, conversation: Conversation) -> Result<UpsertOutcome>;

    fn get(&self, id: &str) -> Option<Conversation>;

    /// Filtered listing, newest activity first. Returns the page plus the
    /// total match count. `page` is 1-based.
    fn list(
        &self,
        filter: &ListFilter,
        page: usize,
        page_size: usize,
    ) -> (Vec<Conversation>, usize);

    fn count(&self) -> usize;
}

/// In-memory store keyed by canonical conversation id.
#[derive(Default)]
pub struct MemoryStore {
    conversations: RwLock<HashMap<String, Conversation>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConversationStore for MemoryStore {
    fn upsert_conversation(&self, conversation: Conversation) -> Result<UpsertOutcome> {
        let mut conversations = self.conversations.write();
        match conversations.get_mut(&conversation.id) {
            Some(existing) => {
                let added = merge_conversations(existing, conversation);
                debug!(
                    "Merged conversation {}: {} new messages",
                    existing.id, added
                );
                Ok(UpsertOutcome::Merged(added))
            }
            None => {
                debug!("Inserted conversation {}", conversation.id);
                conversations.insert(conversation.id.clone(), conversation);
                Ok(UpsertOutcome::Inserted)
            }
        }
    }

    fn get(&self, id: &str) -> Option<Conversation> {
        self.conversations.read().get(id).cloned()
    }

    fn list(
        &self,
        filter: &ListFilter,
        page: usize,
        page_size: usize,
    ) -> (Vec<Conversation>, usize) {
        let conversations = self.conversations.read();
        let mut filtered: Vec<&Conversation> = conversations
            .values()
            .filter(|c| {
                filter
                    .provider
                    .as_ref()
                    .map_or(true, |p| &c.provider == p)
            })
            .filter(|c| {
                filter
                    .subject
                    .as_ref()
                    .map_or(true, |s| c.subject.as_ref() == Some(s))
            })
            .collect();

        filtered.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        let total = filtered.len();
        let start = page.saturating_sub(1) * page_size;
        let paged = filtered
            .into_iter()
            .skip(start)
            .take(page_size)
            .cloned()
            .collect();

        (paged, total)
    }

    fn count(&self) -> usize {
        self.conversations.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatvault_core::{Message, Role};
    use chrono::{DateTime, Utc};

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn conversation(provider: &str, native_id: &str, updated: &str) -> Conversation {
        Conversation {
            id: Conversation::canonical_id(provider, native_id),
            provider: provider.into(),
            provider_conversation_id: native_id.into(),
            title: format!("{} thread", native_id),
            subject: None,
            created_at: ts("2024-01-15T10:00:00Z"),
            updated_at: ts(updated),
            messages: vec![Message {
                id: Some(format!("{}-m1", native_id)),
                role: Role::User,
                content: "hello".into(),
                timestamp: ts("2024-01-15T10:00:00Z"),
                tool_calls: Vec::new(),
            }],
        }
    }

    #[test]
    fn test_upsert_then_get() {
        let store = MemoryStore::new();
        let outcome = store
            .upsert_conversation(conversation("claude", "c1", "2024-01-15T11:00:00Z"))
            .unwrap();
        assert_eq!(outcome, UpsertOutcome::Inserted);
        assert!(store.get("claude:c1").is_some());
        assert!(store.get("claude:missing").is_none());
    }

    #[test]
    fn test_reextraction_merges_not_duplicates() {
        let store = MemoryStore::new();
        store
            .upsert_conversation(conversation("claude", "c1", "2024-01-15T11:00:00Z"))
            .unwrap();

        let mut again = conversation("claude", "c1", "2024-01-15T12:00:00Z");
        again.messages.push(Message {
            id: Some("c1-m2".into()),
            role: Role::Assistant,
            content: "hi there".into(),
            timestamp: ts("2024-01-15T11:30:00Z"),
            tool_calls: Vec::new(),
        });

        let outcome = store.upsert_conversation(again).unwrap();
        assert_eq!(outcome, UpsertOutcome::Merged(1));
        assert_eq!(store.count(), 1);

        let merged = store.get("claude:c1").unwrap();
        assert_eq!(merged.messages.len(), 2);
        assert_eq!(merged.updated_at, ts("2024-01-15T12:00:00Z"));
    }

    #[test]
    fn test_list_filters_by_provider() {
        let store = MemoryStore::new();
        store
            .upsert_conversation(conversation("claude", "c1", "2024-01-15T11:00:00Z"))
            .unwrap();
        store
            .upsert_conversation(conversation("chatgpt", "g1", "2024-01-15T12:00:00Z"))
            .unwrap();

        let (all, total) = store.list(&ListFilter::default(), 1, 10);
        assert_eq!(total, 2);
        // Newest activity first.
        assert_eq!(all[0].provider, "chatgpt");

        let filter = ListFilter {
            provider: Some("claude".into()),
            subject: None,
        };
        let (claude_only, total) = store.list(&filter, 1, 10);
        assert_eq!(total, 1);
        assert_eq!(claude_only[0].id, "claude:c1");
    }

    #[test]
    fn test_list_pagination() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store
                .upsert_conversation(conversation(
                    "claude",
                    &format!("c{}", i),
                    &format!("2024-01-15T1{}:00:00Z", i),
                ))
                .unwrap();
        }

        let (page1, total) = store.list(&ListFilter::default(), 1, 2);
        assert_eq!(total, 5);
        assert_eq!(page1.len(), 2);

        let (page3, _) = store.list(&ListFilter::default(), 3, 2);
        assert_eq!(page3.len(), 1);

        let (beyond, _) = store.list(&ListFilter::default(), 4, 2);
        assert!(beyond.is_empty());
    }
}

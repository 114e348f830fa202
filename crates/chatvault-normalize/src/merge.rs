//! Merging re-extracted conversations into existing records.

use std::collections::HashSet;

use chatvault_core::Conversation;

/// Merge `incoming` into `existing`, appending only messages not already
/// present. Returns the number of new messages added.
///
/// Re-extraction of the same provider conversation must update the one
/// canonical record, never create a second.
pub fn merge_conversations(existing: &mut Conversation, incoming: Conversation) -> usize {
    if !incoming.title.is_empty() && incoming.title != "Untitled" {
        existing.title = incoming.title;
    }
    if incoming.subject.is_some() {
        existing.subject = incoming.subject;
    }

    let seen: HashSet<String> = existing.messages.iter().map(|m| m.identity()).collect();

    let mut added = 0;
    for message in incoming.messages {
        if !seen.contains(&message.identity()) {
            existing.messages.push(message);
            added += 1;
        }
    }

    if added > 0 {
        existing.messages.sort_by_key(|m| m.timestamp);
    }

    if incoming.updated_at > existing.updated_at {
        existing.updated_at = incoming.updated_at;
    }

    added
}

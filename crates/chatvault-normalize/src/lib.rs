//! ChatVault Normalize — canonicalize provider extraction payloads.

pub mod merge;
pub mod normalizer;

pub use merge::merge_conversations;
pub use normalizer::{normalize_batch, ConversationError, NormalizedBatch};

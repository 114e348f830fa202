//! Extraction job types.

use chatvault_core::{Conversation, ErrorDetail};
use chatvault_normalize::ConversationError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Extraction job lifecycle.
///
/// `Queued → Validating → Running → {Succeeded, Failed, Cancelled}`;
/// terminal states are never left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Queued,
    Validating,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Succeeded | JobState::Failed | JobState::Cancelled
        )
    }
}

/// Metadata attached to a completed extraction.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionMetadata {
    pub provider: String,
    pub extraction_method: String,
    pub total_conversations: usize,
    pub extraction_timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub normalization_errors: Vec<ConversationError>,
}

/// Normalized output of a successful extraction job.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    pub conversations: Vec<Conversation>,
    pub metadata: ExtractionMetadata,
    pub elapsed_ms: u64,
}

/// Point-in-time snapshot of an extraction job.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionJob {
    pub id: String,
    pub provider: String,
    pub fingerprint: String,
    pub tool: String,
    pub parameters: Value,
    pub state: JobState,
    /// 0–100. Synthetic while running, 100 only on success.
    pub progress: u8,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ExtractionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
}

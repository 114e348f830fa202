//! ChatVault Jobs — one-shot extraction job scheduling.

pub mod scheduler;
pub mod types;

pub use scheduler::{JobScheduler, JobSummary};
pub use types::{ExtractionJob, ExtractionMetadata, ExtractionResult, JobState};

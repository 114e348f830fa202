//! Extraction job scheduler.
//!
//! Jobs run as independently cancellable tokio tasks. Work for the same
//! (provider, fingerprint) is serialized through the active-work set;
//! `submit` returns immediately with an id and `status` is poll-safe.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chatvault_auth::CredentialValidator;
use chatvault_core::config::JobConfig;
use chatvault_core::{ActiveGuard, ActiveSet, Credential, Error, ErrorDetail, Result};
use chatvault_gateway::ToolGateway;
use chatvault_normalize::normalize_batch;
use chatvault_store::ConversationStore;
use chrono::Utc;
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::types::{ExtractionJob, ExtractionMetadata, ExtractionResult, JobState};

/// Aggregate job counters for the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct JobSummary {
    pub active_extractions: usize,
    pub completed_extractions: usize,
    pub failed_extractions: usize,
    pub cancelled_extractions: usize,
    pub total_conversations_captured: usize,
}

struct JobEntry {
    job: ExtractionJob,
    expected_secs: u64,
    cancel: CancellationToken,
}

struct Inner {
    gateway: Arc<ToolGateway>,
    validator: Arc<CredentialValidator>,
    store: Arc<dyn ConversationStore>,
    config: JobConfig,
    jobs: RwLock<HashMap<String, JobEntry>>,
    active: ActiveSet,
}

/// Schedules one-shot extraction jobs.
pub struct JobScheduler {
    inner: Arc<Inner>,
}

impl JobScheduler {
    pub fn new(
        gateway: Arc<ToolGateway>,
        validator: Arc<CredentialValidator>,
        store: Arc<dyn ConversationStore>,
        config: JobConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                gateway,
                validator,
                store,
                config,
                jobs: RwLock::new(HashMap::new()),
                active: ActiveSet::new(),
            }),
        }
    }

    /// Submit an extraction job. Returns the job id immediately; progress
    /// and results are retrieved via `status`.
    ///
    /// Authorization stays explicit: the caller must have validated the
    /// credential, and a missing or expired record rejects the request.
    /// A second job for the same (provider, fingerprint) is rejected, not
    /// queued.
    pub fn submit(
        &self,
        provider_id: &str,
        tool_name: &str,
        credential: &Credential,
        parameters: Value,
    ) -> Result<String> {
        let registry = self.inner.gateway.registry();
        let descriptor = registry.describe(provider_id)?;
        registry.tool(provider_id, tool_name)?;

        // Secret material travels in the credential only; the stored and
        // dispatched parameters carry a placeholder.
        let mut parameters = parameters;
        descriptor.redact_parameters(&mut parameters);

        let fingerprint = credential.fingerprint();

        if self
            .inner
            .validator
            .fresh_record(provider_id, &fingerprint)
            .is_none()
        {
            return Err(Error::CredentialsNotValidated(provider_id.to_string()));
        }

        let guard = self
            .inner
            .active
            .try_acquire(provider_id, &fingerprint)
            .ok_or_else(|| Error::JobAlreadyRunning {
                provider: provider_id.to_string(),
                fingerprint: fingerprint.clone(),
            })?;

        let job_id = uuid::Uuid::new_v4().to_string();
        let cancel = CancellationToken::new();

        let job = ExtractionJob {
            id: job_id.clone(),
            provider: provider_id.to_string(),
            fingerprint: fingerprint.clone(),
            tool: tool_name.to_string(),
            parameters,
            state: JobState::Queued,
            progress: 0,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            result: None,
            error: None,
        };

        self.inner.jobs.write().insert(
            job_id.clone(),
            JobEntry {
                job,
                expected_secs: descriptor.expected_extraction_secs,
                cancel: cancel.clone(),
            },
        );

        info!(
            "Extraction job {} queued: {} on {}/{}",
            job_id, tool_name, provider_id, fingerprint
        );

        let inner = self.inner.clone();
        let task_job_id = job_id.clone();
        let credential = credential.clone();
        tokio::spawn(async move {
            run_job(inner, task_job_id, credential, guard, cancel).await;
        });

        Ok(job_id)
    }

    /// Snapshot a job. Idempotent and safe to poll.
    pub fn status(&self, job_id: &str) -> Result<ExtractionJob> {
        let jobs = self.inner.jobs.read();
        let entry = jobs
            .get(job_id)
            .ok_or_else(|| Error::NotFound(format!("job {}", job_id)))?;

        let mut snapshot = entry.job.clone();
        if snapshot.state == JobState::Running {
            snapshot.progress = synthetic_progress(&entry.job, entry.expected_secs);
        }
        Ok(snapshot)
    }

    /// Cancel a job. Terminal jobs are left untouched; an in-flight
    /// executor call is abandoned and its late result discarded.
    pub fn cancel(&self, job_id: &str) -> Result<()> {
        let mut jobs = self.inner.jobs.write();
        let entry = jobs
            .get_mut(job_id)
            .ok_or_else(|| Error::NotFound(format!("job {}", job_id)))?;

        if entry.job.state.is_terminal() {
            return Ok(());
        }

        entry.job.state = JobState::Cancelled;
        entry.job.finished_at = Some(Utc::now());
        entry.cancel.cancel();
        info!("Extraction job {} cancelled", job_id);
        Ok(())
    }

    /// Aggregate counters across all known jobs.
    pub fn summary(&self) -> JobSummary {
        let jobs = self.inner.jobs.read();
        let mut summary = JobSummary {
            active_extractions: 0,
            completed_extractions: 0,
            failed_extractions: 0,
            cancelled_extractions: 0,
            total_conversations_captured: 0,
        };
        for entry in jobs.values() {
            match entry.job.state {
                JobState::Succeeded => {
                    summary.completed_extractions += 1;
                    if let Some(result) = &entry.job.result {
                        summary.total_conversations_captured +=
                            result.metadata.total_conversations;
                    }
                }
                JobState::Failed => summary.failed_extractions += 1,
                JobState::Cancelled => summary.cancelled_extractions += 1,
                _ => summary.active_extractions += 1,
            }
        }
        summary
    }
}

/// Progress derived from elapsed time against the provider's expected
/// duration. Monotonic, and capped below 100 until actual completion.
fn synthetic_progress(job: &ExtractionJob, expected_secs: u64) -> u8 {
    let Some(started_at) = job.started_at else {
        return 0;
    };
    let elapsed = (Utc::now() - started_at).num_milliseconds().max(0) as f64 / 1000.0;
    let expected = expected_secs.max(1) as f64;
    ((elapsed / expected) * 100.0).min(99.0) as u8
}

fn backoff_delay(config: &JobConfig, attempt: u32) -> Duration {
    let exp = config
        .backoff_base_ms
        .saturating_mul(1u64 << (attempt - 1).min(16));
    Duration::from_millis(exp.min(config.backoff_cap_ms))
}

/// Advance a job's state. Refuses to leave a terminal state, which is
/// what keeps a late executor result from overwriting a cancellation.
fn transition(inner: &Inner, job_id: &str, next: JobState) -> bool {
    let mut jobs = inner.jobs.write();
    let Some(entry) = jobs.get_mut(job_id) else {
        return false;
    };
    if entry.job.state.is_terminal() {
        return false;
    }
    debug!("Job {}: {:?} -> {:?}", job_id, entry.job.state, next);
    entry.job.state = next;
    if next == JobState::Running {
        entry.job.started_at = Some(Utc::now());
    }
    true
}

fn fail_job(inner: &Inner, job_id: &str, err: &Error) {
    let mut jobs = inner.jobs.write();
    if let Some(entry) = jobs.get_mut(job_id) {
        if entry.job.state.is_terminal() {
            return;
        }
        warn!("Extraction job {} failed: {}", job_id, err);
        entry.job.state = JobState::Failed;
        entry.job.error = Some(ErrorDetail::from(err));
        entry.job.finished_at = Some(Utc::now());
    }
    prune_finished(&mut jobs, inner.config.keep_finished_jobs);
}

fn succeed_job(inner: &Inner, job_id: &str, result: ExtractionResult) {
    let mut jobs = inner.jobs.write();
    if let Some(entry) = jobs.get_mut(job_id) {
        if entry.job.state.is_terminal() {
            debug!(
                "Job {} finished after reaching {:?}; result discarded",
                job_id, entry.job.state
            );
            return;
        }
        info!(
            "Extraction job {} succeeded: {} conversations",
            job_id, result.metadata.total_conversations
        );
        entry.job.state = JobState::Succeeded;
        entry.job.progress = 100;
        entry.job.result = Some(result);
        entry.job.finished_at = Some(Utc::now());
    }
    prune_finished(&mut jobs, inner.config.keep_finished_jobs);
}

/// Keep only the most recent terminal jobs.
fn prune_finished(jobs: &mut HashMap<String, JobEntry>, keep: usize) {
    let finished: Vec<(String, chrono::DateTime<Utc>)> = jobs
        .iter()
        .filter(|(_, e)| e.job.state.is_terminal())
        .map(|(id, e)| (id.clone(), e.job.finished_at.unwrap_or(e.job.created_at)))
        .collect();

    if finished.len() <= keep {
        return;
    }

    let mut finished = finished;
    finished.sort_by_key(|(_, t)| *t);
    let remove = finished.len() - keep;
    for (id, _) in finished.into_iter().take(remove) {
        jobs.remove(&id);
    }
}

async fn run_job(
    inner: Arc<Inner>,
    job_id: String,
    credential: Credential,
    _guard: ActiveGuard,
    cancel: CancellationToken,
) {
    let (provider, tool, parameters, fingerprint) = {
        let jobs = inner.jobs.read();
        let Some(entry) = jobs.get(&job_id) else {
            return;
        };
        (
            entry.job.provider.clone(),
            entry.job.tool.clone(),
            entry.job.parameters.clone(),
            entry.job.fingerprint.clone(),
        )
    };

    if !transition(&inner, &job_id, JobState::Validating) {
        return;
    }

    // The record was fresh at submit time; it can lapse before the task
    // actually starts.
    if inner
        .validator
        .fresh_record(&provider, &fingerprint)
        .is_none()
    {
        fail_job(&inner, &job_id, &Error::CredentialsNotValidated(provider));
        return;
    }

    if !transition(&inner, &job_id, JobState::Running) {
        return;
    }

    let started = std::time::Instant::now();
    let mut attempt: u32 = 0;

    let outcome = loop {
        attempt += 1;

        let call = inner.gateway.invoke(&tool, &provider, &credential, &parameters);
        let result = tokio::select! {
            _ = cancel.cancelled() => {
                debug!("Job {} cancelled; abandoning in-flight call", job_id);
                return;
            }
            result = call => result,
        };

        match result {
            Ok(tool_result) => break Ok(tool_result),
            Err(err) if err.retryable() && attempt < inner.config.max_attempts => {
                let delay = backoff_delay(&inner.config, attempt);
                warn!(
                    "Job {} attempt {}/{} failed ({}); retrying in {:?}",
                    job_id, attempt, inner.config.max_attempts, err, delay
                );
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            Err(err) => break Err(err),
        }
    };

    match outcome {
        Ok(tool_result) => {
            let batch = normalize_batch(&provider, &tool_result.output);

            for conversation in &batch.conversations {
                if cancel.is_cancelled() {
                    // Never partially apply a discarded result.
                    return;
                }
                if let Err(e) = inner.store.upsert_conversation(conversation.clone()) {
                    warn!("Failed to store conversation {}: {}", conversation.id, e);
                }
            }

            let result = ExtractionResult {
                metadata: ExtractionMetadata {
                    provider: provider.clone(),
                    extraction_method: batch
                        .extraction_method
                        .unwrap_or_else(|| "unknown".to_string()),
                    total_conversations: batch.conversations.len(),
                    extraction_timestamp: Utc::now(),
                    normalization_errors: batch.errors,
                },
                conversations: batch.conversations,
                elapsed_ms: started.elapsed().as_millis() as u64,
            };

            succeed_job(&inner, &job_id, result);
        }
        Err(err) => fail_job(&inner, &job_id, &err),
    }
}

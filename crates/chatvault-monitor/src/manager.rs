//! Monitoring session manager.
//!
//! Each session is one tokio task running a fixed-interval polling loop
//! until stopped or errored out. At most one Active session exists per
//! (provider, fingerprint); the loop checks its cancellation token at the
//! top of every iteration, so stop is cooperative.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chatvault_auth::CredentialValidator;
use chatvault_core::config::MonitorConfig;
use chatvault_core::{ActiveGuard, ActiveSet, Credential, Error, ErrorDetail, Result};
use chatvault_gateway::{validate_parameters, ToolGateway};
use chatvault_normalize::normalize_batch;
use chatvault_store::{ConversationStore, UpsertOutcome};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::{json, Value};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::types::{MonitoringSession, SessionState};
use crate::webhook::{dedupe_key, WebhookSink};

struct SessionHandle {
    session: RwLock<MonitoringSession>,
    cancel: CancellationToken,
    paused_tx: watch::Sender<bool>,
}

struct Inner {
    gateway: Arc<ToolGateway>,
    validator: Arc<CredentialValidator>,
    store: Arc<dyn ConversationStore>,
    sink: Arc<dyn WebhookSink>,
    config: MonitorConfig,
    sessions: RwLock<HashMap<String, Arc<SessionHandle>>>,
    active: ActiveSet,
}

/// Supervises monitoring sessions.
pub struct MonitorManager {
    inner: Arc<Inner>,
}

impl MonitorManager {
    pub fn new(
        gateway: Arc<ToolGateway>,
        validator: Arc<CredentialValidator>,
        store: Arc<dyn ConversationStore>,
        sink: Arc<dyn WebhookSink>,
        config: MonitorConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                gateway,
                validator,
                store,
                sink,
                config,
                sessions: RwLock::new(HashMap::new()),
                active: ActiveSet::new(),
            }),
        }
    }

    /// Start a monitoring session. Returns the session id immediately;
    /// the first poll is scheduled right away.
    pub fn start(
        &self,
        provider_id: &str,
        tool_name: &str,
        credential: &Credential,
        parameters: Value,
        webhook_url: &str,
    ) -> Result<String> {
        let registry = self.inner.gateway.registry();
        let descriptor = registry.describe(provider_id)?;
        let tool = registry.tool(provider_id, tool_name)?;

        // The webhook target is part of the request surface; thread it
        // into the tool parameters when absent so the schema sees it.
        let mut parameters = match parameters {
            Value::Null => json!({}),
            other => other,
        };
        if let Some(map) = parameters.as_object_mut() {
            map.entry("webhook_url".to_string())
                .or_insert_with(|| Value::from(webhook_url));
        }
        let mut parameters = validate_parameters(&tool.parameters, &parameters)?;
        descriptor.redact_parameters(&mut parameters);

        let requested_interval = parameters
            .get("polling_interval")
            .and_then(|v| v.as_u64())
            .unwrap_or(self.inner.config.default_poll_interval_secs);
        let polling_interval_secs = descriptor.clamp_poll_interval(requested_interval);

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
            .ok_or_else(|| Error::SessionAlreadyActive {
                provider: provider_id.to_string(),
                fingerprint: fingerprint.clone(),
            })?;

        let session_id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        let session = MonitoringSession {
            id: session_id.clone(),
            provider: provider_id.to_string(),
            fingerprint,
            tool: tool_name.to_string(),
            parameters,
            polling_interval_secs,
            webhook_url: webhook_url.to_string(),
            state: SessionState::Starting,
            started_at: now,
            last_poll_at: None,
            next_poll_at: Some(now),
            conversations_captured: 0,
            consecutive_failures: 0,
            last_error: None,
        };

        let (paused_tx, paused_rx) = watch::channel(false);
        let cancel = CancellationToken::new();
        let handle = Arc::new(SessionHandle {
            session: RwLock::new(session),
            cancel: cancel.clone(),
            paused_tx,
        });

        self.inner
            .sessions
            .write()
            .insert(session_id.clone(), handle.clone());

        info!(
            "Monitoring session {} starting: {} on {} every {}s",
            session_id, tool_name, provider_id, polling_interval_secs
        );

        let inner = self.inner.clone();
        let credential = credential.clone();
        tokio::spawn(async move {
            run_session(inner, handle, credential, guard, cancel, paused_rx).await;
        });

        Ok(session_id)
    }

    /// Snapshot a session. Poll-safe.
    pub fn status(&self, session_id: &str) -> Result<MonitoringSession> {
        let handle = self.handle(session_id)?;
        let session = handle.session.read().clone();
        Ok(session)
    }

    /// All known sessions, newest first.
    pub fn list(&self) -> Vec<MonitoringSession> {
        let sessions = self.inner.sessions.read();
        let mut all: Vec<MonitoringSession> =
            sessions.values().map(|h| h.session.read().clone()).collect();
        all.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        all
    }

    /// Stop a session. Idempotent; no further polls or deliveries occur.
    pub fn stop(&self, session_id: &str) -> Result<()> {
        let handle = self.handle(session_id)?;
        let mut session = handle.session.write();
        if session.state.is_terminal() {
            return Ok(());
        }
        session.state = SessionState::Stopped;
        session.next_poll_at = None;
        drop(session);
        handle.cancel.cancel();
        info!("Monitoring session {} stopped", session_id);
        Ok(())
    }

    /// Pause an active session. Counters are retained.
    pub fn pause(&self, session_id: &str) -> Result<()> {
        let handle = self.handle(session_id)?;
        let mut session = handle.session.write();
        match session.state {
            SessionState::Active | SessionState::Starting => {
                session.state = SessionState::Paused;
                session.next_poll_at = None;
                drop(session);
                let _ = handle.paused_tx.send(true);
                info!("Monitoring session {} paused", session_id);
                Ok(())
            }
            SessionState::Paused => Ok(()),
            SessionState::Stopped | SessionState::Error => Err(Error::NotFound(format!(
                "session {} is no longer running",
                session_id
            ))),
        }
    }

    /// Resume a paused session. Polling restarts a full interval from
    /// now, not from the stale schedule.
    pub fn resume(&self, session_id: &str) -> Result<()> {
        let handle = self.handle(session_id)?;
        let mut session = handle.session.write();
        match session.state {
            SessionState::Paused => {
                session.state = SessionState::Active;
                session.next_poll_at =
                    Some(Utc::now() + chrono::Duration::seconds(session.polling_interval_secs as i64));
                drop(session);
                let _ = handle.paused_tx.send(false);
                info!("Monitoring session {} resumed", session_id);
                Ok(())
            }
            SessionState::Active | SessionState::Starting => Ok(()),
            SessionState::Stopped | SessionState::Error => Err(Error::NotFound(format!(
                "session {} is no longer running",
                session_id
            ))),
        }
    }

    fn handle(&self, session_id: &str) -> Result<Arc<SessionHandle>> {
        self.inner
            .sessions
            .read()
            .get(session_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("session {}", session_id)))
    }
}

/// Backoff after a transient poll failure: exponential in the failure
/// count, capped, and never below the polling interval.
fn failure_backoff(interval: Duration, failures: u32, cap_secs: u64) -> Duration {
    let base = interval.as_secs().max(1);
    let backoff = base.saturating_mul(1u64 << failures.saturating_sub(1).min(16));
    Duration::from_secs(backoff.min(cap_secs).max(interval.as_secs()))
}

async fn run_session(
    inner: Arc<Inner>,
    handle: Arc<SessionHandle>,
    credential: Credential,
    _guard: ActiveGuard,
    cancel: CancellationToken,
    mut paused_rx: watch::Receiver<bool>,
) {
    let (session_id, provider, tool, parameters, webhook_url, interval_secs) = {
        let session = handle.session.read();
        (
            session.id.clone(),
            session.provider.clone(),
            session.tool.clone(),
            session.parameters.clone(),
            session.webhook_url.clone(),
            session.polling_interval_secs,
        )
    };
    let interval = Duration::from_secs(interval_secs);
    let poll_interval = chrono::Duration::seconds(interval_secs as i64);

    {
        let mut session = handle.session.write();
        if session.state == SessionState::Starting {
            session.state = SessionState::Active;
        }
    }

    let mut next_delay = Duration::ZERO;
    let mut since: Option<DateTime<Utc>> = None;

    'outer: loop {
        if cancel.is_cancelled() {
            break;
        }

        // Pause gate: wait here while the session is paused.
        let mut resumed = false;
        while *paused_rx.borrow_and_update() {
            tokio::select! {
                _ = cancel.cancelled() => break 'outer,
                changed = paused_rx.changed() => {
                    if changed.is_err() {
                        break 'outer;
                    }
                    resumed = true;
                }
            }
        }
        if resumed {
            next_delay = interval;
        }

        if !next_delay.is_zero() {
            tokio::select! {
                _ = cancel.cancelled() => break 'outer,
                changed = paused_rx.changed() => {
                    if changed.is_err() {
                        break 'outer;
                    }
                    // Paused mid-wait; re-enter the gate.
                    continue 'outer;
                }
                _ = tokio::time::sleep(next_delay) => {}
            }
        }

        if cancel.is_cancelled() {
            break;
        }
        if *paused_rx.borrow() {
            continue;
        }

        let poll_started = Utc::now();
        {
            let mut session = handle.session.write();
            session.last_poll_at = Some(poll_started);
        }
        debug!("Session {} polling {}", session_id, provider);

        let result = tokio::select! {
            _ = cancel.cancelled() => break 'outer,
            result = inner.gateway.poll(&tool, &provider, &credential, &parameters, since) => result,
        };

        match result {
            Ok(tool_result) => {
                since = Some(poll_started);
                let batch = normalize_batch(&provider, &tool_result.output);

                let mut captured = 0;
                for conversation in batch.conversations {
                    if cancel.is_cancelled() {
                        break 'outer;
                    }

                    let newest_message_id = conversation
                        .messages
                        .last()
                        .map(|m| m.identity())
                        .unwrap_or_default();

                    let new_messages = match inner.store.upsert_conversation(conversation.clone())
                    {
                        Ok(UpsertOutcome::Inserted) => conversation.messages.len(),
                        Ok(UpsertOutcome::Merged(added)) => added,
                        Err(e) => {
                            warn!(
                                "Session {} failed to store {}: {}",
                                session_id, conversation.id, e
                            );
                            continue;
                        }
                    };

                    if new_messages == 0 {
                        continue;
                    }
                    captured += 1;

                    let key = dedupe_key(&provider, &conversation.id, &newest_message_id);
                    let payload = json!({
                        "session_id": session_id.clone(),
                        "provider": provider.clone(),
                        "conversation_id": conversation.id.clone(),
                        "title": conversation.title.clone(),
                        "new_messages": new_messages,
                        "dedupe_key": key.clone(),
                        "captured_at": Utc::now().to_rfc3339(),
                    });

                    if cancel.is_cancelled() {
                        break 'outer;
                    }
                    // Delivery failures are the sink's retry problem; they
                    // never stop the session by themselves.
                    if let Err(e) = inner.sink.deliver(&webhook_url, &payload, &key).await {
                        warn!(
                            "Session {} webhook delivery failed ({}): {}",
                            session_id, webhook_url, e
                        );
                    }
                }

                let mut session = handle.session.write();
                session.consecutive_failures = 0;
                session.last_error = None;
                session.conversations_captured += captured;
                session.next_poll_at = Some(Utc::now() + poll_interval);
                next_delay = interval;
            }
            Err(err) if err.retryable() => {
                let mut session = handle.session.write();
                session.consecutive_failures += 1;
                session.last_error = Some(ErrorDetail::from(&err));

                if session.consecutive_failures >= inner.config.max_consecutive_failures {
                    error!(
                        "Session {} errored after {} consecutive failures: {}",
                        session_id, session.consecutive_failures, err
                    );
                    session.state = SessionState::Error;
                    session.next_poll_at = None;
                    break;
                }

                let backoff = failure_backoff(
                    interval,
                    session.consecutive_failures,
                    inner.config.backoff_cap_secs,
                );
                session.next_poll_at =
                    Some(Utc::now() + chrono::Duration::from_std(backoff).unwrap_or(poll_interval));
                next_delay = backoff;
                warn!(
                    "Session {} poll failed ({}); retrying in {:?}",
                    session_id, err, backoff
                );
            }
            Err(err) => {
                error!("Session {} unrecoverable failure: {}", session_id, err);
                let mut session = handle.session.write();
                session.consecutive_failures += 1;
                session.last_error = Some(ErrorDetail::from(&err));
                session.state = SessionState::Error;
                session.next_poll_at = None;
                break;
            }
        }
    }

    debug!("Session {} loop exited", session_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chatvault_auth::StructuralVerifier;
    use chatvault_core::config::ValidationConfig;
    use chatvault_registry::{catalog, Executor, FixtureExecutor, ProviderRegistry, RawPayload};
    use chatvault_store::MemoryStore;
    use chatvault_store::ConversationStore as _;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct RecordingSink {
        deliveries: Mutex<Vec<(String, Value, String)>>,
    }

    impl RecordingSink {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                deliveries: Mutex::new(Vec::new()),
            })
        }

        fn count(&self) -> usize {
            self.deliveries.lock().len()
        }
    }

    #[async_trait]
    impl WebhookSink for RecordingSink {
        async fn deliver(&self, url: &str, payload: &Value, dedupe_key: &str) -> Result<()> {
            self.deliveries
                .lock()
                .push((url.to_string(), payload.clone(), dedupe_key.to_string()));
            Ok(())
        }
    }

    /// Poll executor returning the same conversation every cycle.
    struct CountingExecutor {
        polls: AtomicUsize,
    }

    impl CountingExecutor {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                polls: AtomicUsize::new(0),
            })
        }

        fn polls(&self) -> usize {
            self.polls.load(Ordering::SeqCst)
        }

        fn payload() -> RawPayload {
            json!({
                "conversations": [{
                    "id": "proj_conv_1",
                    "title": "Project Thread",
                    "messages": [
                        {"id": "m1", "role": "user", "content": "status?", "timestamp": "2024-01-15T10:00:00Z"},
                        {"id": "m2", "role": "assistant", "content": "on track", "timestamp": "2024-01-15T10:00:10Z"}
                    ]
                }],
                "metadata": {"extraction_method": "api_scraping"}
            })
        }
    }

    #[async_trait]
    impl Executor for CountingExecutor {
        async fn extract(&self, _c: &Credential, _p: &Value) -> Result<RawPayload> {
            Ok(Self::payload())
        }

        async fn poll_for_new(
            &self,
            _c: &Credential,
            _s: Option<DateTime<Utc>>,
        ) -> Result<RawPayload> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            Ok(Self::payload())
        }
    }

    /// Poll executor that always fails with a scripted error.
    struct FailingExecutor {
        polls: AtomicUsize,
        error: fn() -> Error,
    }

    impl FailingExecutor {
        fn new(error: fn() -> Error) -> Arc<Self> {
            Arc::new(Self {
                polls: AtomicUsize::new(0),
                error,
            })
        }
    }

    #[async_trait]
    impl Executor for FailingExecutor {
        async fn extract(&self, _c: &Credential, _p: &Value) -> Result<RawPayload> {
            Err((self.error)())
        }

        async fn poll_for_new(
            &self,
            _c: &Credential,
            _s: Option<DateTime<Utc>>,
        ) -> Result<RawPayload> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            Err((self.error)())
        }
    }

    struct Harness {
        manager: MonitorManager,
        validator: Arc<CredentialValidator>,
        store: Arc<MemoryStore>,
        sink: Arc<RecordingSink>,
    }

    fn harness(claude_executor: Arc<dyn Executor>, config: MonitorConfig) -> Harness {
        let mut builder = ProviderRegistry::builder();
        for descriptor in catalog::builtin_providers() {
            if descriptor.id == "claude" {
                builder = builder.provider(descriptor, claude_executor.clone());
            } else {
                let fixture = Arc::new(FixtureExecutor::new(&descriptor.id));
                builder = builder.provider(descriptor, fixture);
            }
        }
        let registry = Arc::new(builder.build());

        let gateway = Arc::new(ToolGateway::new(registry.clone(), Duration::from_secs(5)));
        let validator = Arc::new(CredentialValidator::new(
            Arc::new(StructuralVerifier::new(registry)),
            ValidationConfig::default(),
        ));
        let store = Arc::new(MemoryStore::new());
        let sink = RecordingSink::new();

        Harness {
            manager: MonitorManager::new(
                gateway,
                validator.clone(),
                store.clone(),
                sink.clone(),
                config,
            ),
            validator,
            store,
            sink,
        }
    }

    async fn start_session(harness: &Harness, cred: &Credential) -> String {
        harness.validator.validate("claude", cred).await.unwrap();
        harness
            .manager
            .start(
                "claude",
                "monitor_claude_projects",
                cred,
                json!({"session_cookie": cred.secret.clone(), "polling_interval": 5}),
                "http://localhost:9/hooks",
            )
            .unwrap()
    }

    async fn wait_until(mut check: impl FnMut() -> bool) {
        for _ in 0..600 {
            if check() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        panic!("condition never became true");
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_requires_validation() {
        let harness = harness(CountingExecutor::new(), MonitorConfig::default());
        let cred = Credential::new("claude", "cookie");
        let err = harness
            .manager
            .start(
                "claude",
                "monitor_claude_projects",
                &cred,
                json!({"session_cookie": "cookie"}),
                "http://localhost:9/hooks",
            )
            .unwrap_err();
        assert!(matches!(err, Error::CredentialsNotValidated(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_schema_error_at_start() {
        let harness = harness(CountingExecutor::new(), MonitorConfig::default());
        let cred = Credential::new("claude", "cookie");
        harness.validator.validate("claude", &cred).await.unwrap();

        let err = harness
            .manager
            .start(
                "claude",
                "monitor_claude_projects",
                &cred,
                json!({}),
                "http://localhost:9/hooks",
            )
            .unwrap_err();
        match err {
            Error::SchemaValidation { violations } => {
                assert_eq!(violations.len(), 1);
                assert_eq!(violations[0].field, "session_cookie");
            }
            other => panic!("expected SchemaValidation, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_captures_and_notifies() {
        let executor = CountingExecutor::new();
        let harness = harness(executor.clone(), MonitorConfig::default());
        let cred = Credential::new("claude", "cookie");
        let session_id = start_session(&harness, &cred).await;

        let sink = harness.sink.clone();
        let store = harness.store.clone();
        wait_until(move || sink.count() >= 1 && store.count() >= 1).await;

        let status = harness.manager.status(&session_id).unwrap();
        assert_eq!(status.state, SessionState::Active);
        assert_eq!(status.conversations_captured, 1);
        assert_eq!(status.polling_interval_secs, 5);

        let last = status.last_poll_at.unwrap();
        let next = status.next_poll_at.unwrap();
        assert!(next >= last + chrono::Duration::seconds(5));

        let conversation = harness.store.get("claude:proj_conv_1").unwrap();
        assert_eq!(conversation.messages.len(), 2);

        let deliveries = harness.sink.deliveries.lock();
        let (url, payload, key) = &deliveries[0];
        assert_eq!(url, "http://localhost:9/hooks");
        assert_eq!(payload["conversation_id"], "claude:proj_conv_1");
        assert_eq!(payload["new_messages"], 2);
        assert_eq!(payload["dedupe_key"], key.as_str());
        assert_eq!(key.len(), 32);
        drop(deliveries);

        harness.manager.stop(&session_id).unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_webhook_deduped_across_polls() {
        let executor = CountingExecutor::new();
        let harness = harness(executor.clone(), MonitorConfig::default());
        let cred = Credential::new("claude", "cookie");
        let session_id = start_session(&harness, &cred).await;

        let polls = executor.clone();
        wait_until(move || polls.polls() >= 3).await;

        // The same conversation carries no new messages after the first
        // poll, so exactly one notification went out.
        assert_eq!(harness.sink.count(), 1);
        assert_eq!(harness.store.count(), 1);

        let status = harness.manager.status(&session_id).unwrap();
        assert_eq!(status.conversations_captured, 1);

        harness.manager.stop(&session_id).unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_start_rejected() {
        let harness = harness(CountingExecutor::new(), MonitorConfig::default());
        let cred = Credential::new("claude", "cookie");
        let session_id = start_session(&harness, &cred).await;

        let err = harness
            .manager
            .start(
                "claude",
                "monitor_claude_projects",
                &cred,
                json!({"session_cookie": "cookie"}),
                "http://localhost:9/hooks",
            )
            .unwrap_err();
        assert!(matches!(err, Error::SessionAlreadyActive { .. }));

        // The first session is unaffected.
        let manager = &harness.manager;
        let id = session_id.clone();
        wait_until(move || manager.status(&id).unwrap().state == SessionState::Active).await;

        harness.manager.stop(&session_id).unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_and_resume() {
        let executor = CountingExecutor::new();
        let harness = harness(executor.clone(), MonitorConfig::default());
        let cred = Credential::new("claude", "cookie");
        let session_id = start_session(&harness, &cred).await;

        let polls = executor.clone();
        wait_until(move || polls.polls() >= 1).await;

        harness.manager.pause(&session_id).unwrap();
        let status = harness.manager.status(&session_id).unwrap();
        assert_eq!(status.state, SessionState::Paused);
        let captured_at_pause = status.conversations_captured;

        // No polls while paused.
        let stable = executor.polls();
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(executor.polls(), stable);

        // Pausing again is a no-op.
        harness.manager.pause(&session_id).unwrap();

        harness.manager.resume(&session_id).unwrap();
        let status = harness.manager.status(&session_id).unwrap();
        assert_eq!(status.state, SessionState::Active);
        assert_eq!(status.conversations_captured, captured_at_pause);

        // A fresh full interval before the next poll.
        let next = status.next_poll_at.unwrap();
        let last = status.last_poll_at.unwrap();
        assert!(next >= last + chrono::Duration::seconds(5));

        let polls = executor.clone();
        wait_until(move || polls.polls() > stable).await;

        harness.manager.stop(&session_id).unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_halts_polling_and_deliveries() {
        let executor = CountingExecutor::new();
        let harness = harness(executor.clone(), MonitorConfig::default());
        let cred = Credential::new("claude", "cookie");
        let session_id = start_session(&harness, &cred).await;

        let polls = executor.clone();
        wait_until(move || polls.polls() >= 1).await;

        harness.manager.stop(&session_id).unwrap();
        assert_eq!(
            harness.manager.status(&session_id).unwrap().state,
            SessionState::Stopped
        );

        let polls_at_stop = executor.polls();
        let deliveries_at_stop = harness.sink.count();
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(executor.polls(), polls_at_stop);
        assert_eq!(harness.sink.count(), deliveries_at_stop);

        // Stopping again is an idempotent ack.
        harness.manager.stop(&session_id).unwrap();

        // The (provider, credential) pair frees up for a new session.
        let manager = &harness.manager;
        let cred2 = cred.clone();
        wait_until(move || {
            manager
                .start(
                    "claude",
                    "monitor_claude_projects",
                    &cred2,
                    json!({"session_cookie": "cookie"}),
                    "http://localhost:9/hooks",
                )
                .is_ok()
        })
        .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_after_consecutive_failures() {
        fn unavailable() -> Error {
            Error::ProviderUnavailable("scrape blocked".into())
        }
        let executor = FailingExecutor::new(unavailable);
        let config = MonitorConfig {
            max_consecutive_failures: 2,
            ..MonitorConfig::default()
        };
        let harness = harness(executor.clone(), config);
        let cred = Credential::new("claude", "cookie");
        let session_id = start_session(&harness, &cred).await;

        let manager = &harness.manager;
        let id = session_id.clone();
        wait_until(move || manager.status(&id).unwrap().state == SessionState::Error).await;

        let status = harness.manager.status(&session_id).unwrap();
        assert_eq!(status.consecutive_failures, 2);
        assert_eq!(status.last_error.unwrap().kind, "provider_unavailable");
        assert!(harness.sink.count() == 0);

        // Errored sessions reject pause/resume.
        assert!(harness.manager.pause(&session_id).is_err());
        assert!(harness.manager.resume(&session_id).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_nonretryable_failure_errors_immediately() {
        fn broken() -> Error {
            Error::Internal("parser mismatch".into())
        }
        let executor = FailingExecutor::new(broken);
        let harness = harness(executor.clone(), MonitorConfig::default());
        let cred = Credential::new("claude", "cookie");
        let session_id = start_session(&harness, &cred).await;

        let manager = &harness.manager;
        let id = session_id.clone();
        wait_until(move || manager.status(&id).unwrap().state == SessionState::Error).await;

        let status = harness.manager.status(&session_id).unwrap();
        assert_eq!(status.consecutive_failures, 1);
        assert_eq!(status.last_error.unwrap().kind, "execution_error");
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_clamped_to_provider_bounds() {
        let harness = harness(CountingExecutor::new(), MonitorConfig::default());
        let cred = Credential::new("claude", "cookie");
        harness.validator.validate("claude", &cred).await.unwrap();

        let session_id = harness
            .manager
            .start(
                "claude",
                "monitor_claude_projects",
                &cred,
                json!({"session_cookie": "cookie", "polling_interval": 1}),
                "http://localhost:9/hooks",
            )
            .unwrap();

        let status = harness.manager.status(&session_id).unwrap();
        assert_eq!(status.polling_interval_secs, 5);

        harness.manager.stop(&session_id).unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_session_operations() {
        let harness = harness(CountingExecutor::new(), MonitorConfig::default());
        assert!(matches!(
            harness.manager.status("ghost").unwrap_err(),
            Error::NotFound(_)
        ));
        assert!(matches!(
            harness.manager.stop("ghost").unwrap_err(),
            Error::NotFound(_)
        ));
        assert!(matches!(
            harness.manager.pause("ghost").unwrap_err(),
            Error::NotFound(_)
        ));
        assert!(matches!(
            harness.manager.resume("ghost").unwrap_err(),
            Error::NotFound(_)
        ));
    }

    #[test]
    fn test_failure_backoff_never_below_interval() {
        let interval = Duration::from_secs(30);
        assert_eq!(failure_backoff(interval, 1, 300), Duration::from_secs(30));
        assert_eq!(failure_backoff(interval, 2, 300), Duration::from_secs(60));
        assert_eq!(failure_backoff(interval, 3, 300), Duration::from_secs(120));
        // Capped, but still at least the polling interval.
        assert_eq!(failure_backoff(interval, 10, 300), Duration::from_secs(300));
        assert_eq!(
            failure_backoff(Duration::from_secs(600), 4, 300),
            Duration::from_secs(600)
        );
    }
}

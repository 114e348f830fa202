//! Shared application state.

use std::sync::Arc;
use std::time::Duration;

use chatvault_auth::{CredentialValidator, StructuralVerifier};
use chatvault_core::{ChatVaultConfig, Credential, Result};
use chatvault_gateway::ToolGateway;
use chatvault_jobs::JobScheduler;
use chatvault_monitor::{HttpWebhookSink, MonitorManager, WebhookSink};
use chatvault_registry::{catalog, FixtureExecutor, ProviderRegistry};
use chatvault_store::{ConversationStore, MemoryStore};
use serde_json::Value;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: ChatVaultConfig,
    pub registry: Arc<ProviderRegistry>,
    pub validator: Arc<CredentialValidator>,
    pub gateway: Arc<ToolGateway>,
    pub scheduler: JobScheduler,
    pub monitor: MonitorManager,
    pub store: Arc<dyn ConversationStore>,
}

impl AppState {
    /// Wire the default stack: built-in catalog with fixture executors,
    /// the structural verifier, an in-memory store, the HTTP webhook sink.
    pub fn new(config: ChatVaultConfig) -> Self {
        let store: Arc<dyn ConversationStore> = Arc::new(MemoryStore::new());
        let sink: Arc<dyn WebhookSink> = Arc::new(HttpWebhookSink::new());
        Self::with_collaborators(config, store, sink)
    }

    /// Wire with explicit collaborators (tests swap in their own store
    /// and sink).
    pub fn with_collaborators(
        config: ChatVaultConfig,
        store: Arc<dyn ConversationStore>,
        sink: Arc<dyn WebhookSink>,
    ) -> Self {
        let mut builder = ProviderRegistry::builder();
        for descriptor in catalog::builtin_providers() {
            let executor = Arc::new(FixtureExecutor::new(&descriptor.id));
            builder = builder.provider(descriptor, executor);
        }
        let registry = Arc::new(builder.build());

        let gateway = Arc::new(ToolGateway::new(
            registry.clone(),
            Duration::from_secs(config.jobs.executor_timeout_secs),
        ));
        let validator = Arc::new(CredentialValidator::new(
            Arc::new(StructuralVerifier::new(registry.clone())),
            config.validation.clone(),
        ));
        let scheduler = JobScheduler::new(
            gateway.clone(),
            validator.clone(),
            store.clone(),
            config.jobs.clone(),
        );
        let monitor = MonitorManager::new(
            gateway.clone(),
            validator.clone(),
            store.clone(),
            sink,
            config.monitor.clone(),
        );

        Self {
            config,
            registry,
            validator,
            gateway,
            scheduler,
            monitor,
            store,
        }
    }

    /// Build a credential from request-supplied fields, using the
    /// provider's declared credential field for the secret material.
    pub fn credential_from_fields(&self, provider_id: &str, fields: &Value) -> Result<Credential> {
        let descriptor = self.registry.describe(provider_id)?;

        let secret = descriptor
            .credential_fields
            .iter()
            .find_map(|field| fields.get(field).and_then(|v| v.as_str()))
            .unwrap_or_default()
            .to_string();

        let mut credential = Credential::new(provider_id, secret);
        credential.organization_id = fields
            .get("organization_id")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());
        credential.workspace_id = fields
            .get("workspace_id")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());
        Ok(credential)
    }
}

//! Read-only provider registry and the executor capability seam.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chatvault_core::{Credential, Error, Result};
use chrono::{DateTime, Utc};
use tracing::info;

use crate::types::{ProviderDescriptor, ToolDescriptor};

/// Raw provider-specific extraction payload, normalized downstream.
pub type RawPayload = serde_json::Value;

/// Provider capability: the side-effecting extraction work (scraping,
/// API calls) lives behind this seam, one implementation per provider.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Run a full extraction with the given tool parameters.
    async fn extract(
        &self,
        credential: &Credential,
        parameters: &serde_json::Value,
    ) -> Result<RawPayload>;

    /// Fetch anything new since the given instant.
    async fn poll_for_new(
        &self,
        credential: &Credential,
        since: Option<DateTime<Utc>>,
    ) -> Result<RawPayload>;
}

/// Immutable catalog of providers, their tools, and their executors.
pub struct ProviderRegistry {
    providers: HashMap<String, ProviderDescriptor>,
    executors: HashMap<String, Arc<dyn Executor>>,
}

impl ProviderRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn describe(&self, provider_id: &str) -> Result<&ProviderDescriptor> {
        self.providers
            .get(provider_id)
            .ok_or_else(|| Error::UnknownProvider(provider_id.to_string()))
    }

    /// All providers, ordered by id.
    pub fn list_providers(&self) -> Vec<&ProviderDescriptor> {
        let mut providers: Vec<_> = self.providers.values().collect();
        providers.sort_by(|a, b| a.id.cmp(&b.id));
        providers
    }

    /// Tools for one provider, or for all providers when `provider_id` is
    /// `None`.
    pub fn list_tools(&self, provider_id: Option<&str>) -> Result<Vec<&ToolDescriptor>> {
        match provider_id {
            Some(id) => Ok(self.describe(id)?.tools.iter().collect()),
            None => Ok(self
                .list_providers()
                .into_iter()
                .flat_map(|p| p.tools.iter())
                .collect()),
        }
    }

    pub fn tool(&self, provider_id: &str, tool_name: &str) -> Result<&ToolDescriptor> {
        self.describe(provider_id)?
            .tools
            .iter()
            .find(|t| t.name == tool_name)
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "tool {} for provider {}",
                    tool_name, provider_id
                ))
            })
    }

    pub fn executor(&self, provider_id: &str) -> Result<Arc<dyn Executor>> {
        // Descriptor lookup first so an unregistered provider reports
        // UnknownProvider rather than a missing-executor internal error.
        self.describe(provider_id)?;
        self.executors
            .get(provider_id)
            .cloned()
            .ok_or_else(|| Error::Internal(format!("no executor for provider {}", provider_id)))
    }

    pub fn total_tools(&self) -> usize {
        self.providers.values().map(|p| p.tools.len()).sum()
    }
}

/// Builds a registry at startup; the result is read-only.
#[derive(Default)]
pub struct RegistryBuilder {
    providers: HashMap<String, ProviderDescriptor>,
    executors: HashMap<String, Arc<dyn Executor>>,
}

impl RegistryBuilder {
    pub fn provider(
        mut self,
        descriptor: ProviderDescriptor,
        executor: Arc<dyn Executor>,
    ) -> Self {
        self.executors.insert(descriptor.id.clone(), executor);
        self.providers.insert(descriptor.id.clone(), descriptor);
        self
    }

    pub fn build(self) -> ProviderRegistry {
        let registry = ProviderRegistry {
            providers: self.providers,
            executors: self.executors,
        };
        info!(
            "Provider registry loaded: {} providers, {} tools",
            registry.providers.len(),
            registry.total_tools()
        );
        registry
    }
}

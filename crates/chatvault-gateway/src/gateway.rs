//! Tool invocation gateway — lookup, validate, dispatch with a bounded
//! timeout. Holds no job state; safe to call concurrently.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chatvault_core::{Credential, Error, Result};
use chatvault_registry::ProviderRegistry;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::schema::validate_parameters;

/// Raw output of a tool invocation plus timing.
#[derive(Debug, Clone, Serialize)]
pub struct ToolResult {
    pub tool: String,
    pub provider: String,
    pub output: Value,
    pub elapsed_ms: u64,
}

/// Routes validated tool invocations to the provider's executor.
pub struct ToolGateway {
    registry: Arc<ProviderRegistry>,
    timeout: Duration,
}

impl ToolGateway {
    pub fn new(registry: Arc<ProviderRegistry>, timeout: Duration) -> Self {
        Self { registry, timeout }
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    /// Invoke an extraction tool.
    pub async fn invoke(
        &self,
        tool_name: &str,
        provider_id: &str,
        credential: &Credential,
        parameters: &Value,
    ) -> Result<ToolResult> {
        let normalized = self.prepare(tool_name, provider_id, parameters)?;
        let executor = self.registry.executor(provider_id)?;

        let started = Instant::now();
        debug!("Invoking {} on {}", tool_name, provider_id);

        let call = executor.extract(credential, &normalized);
        let output = self.bounded(tool_name, provider_id, call).await?;

        Ok(ToolResult {
            tool: tool_name.to_string(),
            provider: provider_id.to_string(),
            output,
            elapsed_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// Invoke a monitoring tool's incremental poll.
    pub async fn poll(
        &self,
        tool_name: &str,
        provider_id: &str,
        credential: &Credential,
        parameters: &Value,
        since: Option<DateTime<Utc>>,
    ) -> Result<ToolResult> {
        self.prepare(tool_name, provider_id, parameters)?;
        let executor = self.registry.executor(provider_id)?;

        let started = Instant::now();
        debug!("Polling {} on {} (since {:?})", tool_name, provider_id, since);

        let call = executor.poll_for_new(credential, since);
        let output = self.bounded(tool_name, provider_id, call).await?;

        Ok(ToolResult {
            tool: tool_name.to_string(),
            provider: provider_id.to_string(),
            output,
            elapsed_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// Look up the tool and validate parameters. Never reaches an
    /// executor when validation fails.
    fn prepare(&self, tool_name: &str, provider_id: &str, parameters: &Value) -> Result<Value> {
        let tool = self.registry.tool(provider_id, tool_name)?;
        validate_parameters(&tool.parameters, parameters)
    }

    async fn bounded(
        &self,
        tool_name: &str,
        provider_id: &str,
        call: impl std::future::Future<Output = Result<Value>>,
    ) -> Result<Value> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(err)) => Err(wrap_executor_error(tool_name, provider_id, err)),
            Err(_) => {
                warn!(
                    "Executor for {} timed out running {} after {:?}",
                    provider_id, tool_name, self.timeout
                );
                Err(Error::ProviderUnavailable(format!(
                    "{} timed out after {}s",
                    provider_id,
                    self.timeout.as_secs()
                )))
            }
        }
    }
}

/// Availability and credential failures keep their kind so retry policy
/// can see them; anything else is an opaque executor failure.
fn wrap_executor_error(tool_name: &str, provider_id: &str, err: Error) -> Error {
    match err {
        e @ Error::ProviderUnavailable(_)
        | e @ Error::InvalidCredentials(_)
        | e @ Error::RateLimited { .. } => e,
        other => Error::Execution(format!("{} on {}: {}", tool_name, provider_id, other)),
    }
}

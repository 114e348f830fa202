//! Credential verifier seam.
//!
//! The actual check against a provider (a login probe, a cookie test) is
//! provider-specific side-effecting work; it lives behind this trait.

use std::sync::Arc;

use async_trait::async_trait;
use chatvault_core::{Credential, Error, Result};
use chatvault_registry::ProviderRegistry;

/// Checks a credential against its provider.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Returns the granted permission set on success. Fails with
    /// `InvalidCredentials` when the provider rejects the credential and
    /// `ProviderUnavailable` when the check could not be performed.
    async fn verify(&self, provider_id: &str, credential: &Credential) -> Result<Vec<String>>;
}

/// Structural verifier: accepts any credential whose secret material is
/// present and non-empty for a known provider. Stands in for real
/// per-provider probes, which are pluggable.
pub struct StructuralVerifier {
    registry: Arc<ProviderRegistry>,
}

impl StructuralVerifier {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl CredentialVerifier for StructuralVerifier {
    async fn verify(&self, provider_id: &str, credential: &Credential) -> Result<Vec<String>> {
        let descriptor = self.registry.describe(provider_id)?;

        if credential.secret.trim().is_empty() {
            let field = descriptor
                .credential_fields
                .first()
                .map(String::as_str)
                .unwrap_or("secret");
            return Err(Error::InvalidCredentials(format!(
                "{} must not be empty",
                field
            )));
        }

        Ok(vec![
            "read_conversations".to_string(),
            "monitor_sessions".to_string(),
        ])
    }
}

//! Credential validator — rate limiting and TTL-bound record caching.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chatvault_core::config::ValidationConfig;
use chatvault_core::{Credential, Error, Result, ValidationRecord};
use parking_lot::{Mutex, RwLock};
use tracing::{info, warn};

use crate::verifier::CredentialVerifier;

/// Validates credentials and caches successful records until TTL expiry.
/// The scheduler and monitor consult `fresh_record` — they never
/// re-validate on the caller's behalf.
pub struct CredentialValidator {
    verifier: Arc<dyn CredentialVerifier>,
    config: ValidationConfig,
    records: RwLock<HashMap<String, ValidationRecord>>,
    attempts: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl CredentialValidator {
    pub fn new(verifier: Arc<dyn CredentialVerifier>, config: ValidationConfig) -> Self {
        Self {
            verifier,
            config,
            records: RwLock::new(HashMap::new()),
            attempts: Mutex::new(HashMap::new()),
        }
    }

    /// Validate a credential against its provider.
    ///
    /// A cached record that is still fresh short-circuits the provider
    /// check entirely.
    pub async fn validate(
        &self,
        provider_id: &str,
        credential: &Credential,
    ) -> Result<ValidationRecord> {
        let fingerprint = credential.fingerprint();

        if let Some(record) = self.fresh_record(provider_id, &fingerprint) {
            return Ok(record);
        }

        self.note_attempt(provider_id, &fingerprint)?;

        let permissions = match self.verifier.verify(provider_id, credential).await {
            Ok(permissions) => permissions,
            Err(err) => {
                warn!(
                    "Validation failed for {}/{}: {}",
                    provider_id, fingerprint, err
                );
                return Err(err);
            }
        };

        let record = ValidationRecord::issue(
            provider_id,
            fingerprint.clone(),
            self.config.ttl_secs,
            permissions,
        );

        self.records
            .write()
            .insert(cache_key(provider_id, &fingerprint), record.clone());

        info!(
            "Credentials validated for {}/{} (expires {})",
            provider_id, fingerprint, record.expires_at
        );

        Ok(record)
    }

    /// Look up a cached record that still authorizes work.
    pub fn fresh_record(&self, provider_id: &str, fingerprint: &str) -> Option<ValidationRecord> {
        self.records
            .read()
            .get(&cache_key(provider_id, fingerprint))
            .filter(|r| r.authorizes())
            .cloned()
    }

    /// Record one validation attempt, enforcing the sliding-window limit.
    fn note_attempt(&self, provider_id: &str, fingerprint: &str) -> Result<()> {
        let key = cache_key(provider_id, fingerprint);
        let window = Duration::from_secs(self.config.rate_limit_window_secs);
        let now = Instant::now();

        let mut attempts = self.attempts.lock();
        let entries = attempts.entry(key).or_default();

        while let Some(front) = entries.front() {
            if now.duration_since(*front) > window {
                entries.pop_front();
            } else {
                break;
            }
        }

        if entries.len() >= self.config.rate_limit_attempts {
            let oldest = *entries.front().unwrap_or(&now);
            let elapsed = now.duration_since(oldest);
            let retry_after_secs = window.saturating_sub(elapsed).as_secs().max(1);
            return Err(Error::RateLimited { retry_after_secs });
        }

        entries.push_back(now);
        Ok(())
    }
}

fn cache_key(provider_id: &str, fingerprint: &str) -> String {
    format!("{}/{}", provider_id, fingerprint)
}

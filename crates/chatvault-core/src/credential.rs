//! Provider credentials and validation records.
//!
//! The secret material only ever lives in process memory; fingerprints
//! (not secrets) are what jobs, sessions, and logs reference.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// An opaque provider credential owned by the caller.
#[derive(Clone, Deserialize)]
pub struct Credential {
    pub provider: String,
    pub secret: String,
    #[serde(default)]
    pub organization_id: Option<String>,
    #[serde(default)]
    pub workspace_id: Option<String>,
}

impl Credential {
    pub fn new(provider: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            secret: secret.into(),
            organization_id: None,
            workspace_id: None,
        }
    }

    /// Stable fingerprint of the credential. Safe to log and persist.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.provider.as_bytes());
        hasher.update(b"\x00");
        hasher.update(self.secret.as_bytes());
        if let Some(org) = &self.organization_id {
            hasher.update(b"\x00");
            hasher.update(org.as_bytes());
        }
        if let Some(ws) = &self.workspace_id {
            hasher.update(b"\x00");
            hasher.update(ws.as_bytes());
        }
        let digest = hasher.finalize();
        hex::encode(&digest[..16])
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("provider", &self.provider)
            .field("secret", &"<redacted>")
            .field("organization_id", &self.organization_id)
            .field("workspace_id", &self.workspace_id)
            .finish()
    }
}

/// Outcome of validating a credential against a provider.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationRecord {
    pub provider: String,
    pub fingerprint: String,
    pub valid: bool,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub permissions: Vec<String>,
}

impl ValidationRecord {
    /// Build a successful record with the given TTL.
    pub fn issue(
        provider: impl Into<String>,
        fingerprint: impl Into<String>,
        ttl_secs: u64,
        permissions: Vec<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            provider: provider.into(),
            fingerprint: fingerprint.into(),
            valid: true,
            issued_at: now,
            expires_at: now + Duration::seconds(ttl_secs as i64),
            permissions,
        }
    }

    pub fn is_fresh(&self) -> bool {
        Utc::now() < self.expires_at
    }

    /// Whether this record may authorize a job or session to start.
    pub fn authorizes(&self) -> bool {
        self.valid && self.is_fresh()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_stable() {
        let a = Credential::new("claude", "cookie-abc");
        let b = Credential::new("claude", "cookie-abc");
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 32);
    }

    #[test]
    fn test_fingerprint_varies_by_provider_and_scope() {
        let base = Credential::new("claude", "cookie-abc");
        let other_provider = Credential::new("chatgpt", "cookie-abc");
        assert_ne!(base.fingerprint(), other_provider.fingerprint());

        let mut scoped = Credential::new("claude", "cookie-abc");
        scoped.organization_id = Some("org-1".into());
        assert_ne!(base.fingerprint(), scoped.fingerprint());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let cred = Credential::new("claude", "super-secret-cookie");
        let debug = format!("{:?}", cred);
        assert!(!debug.contains("super-secret-cookie"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_record_freshness() {
        let record = ValidationRecord::issue("claude", "fp", 3600, vec![]);
        assert!(record.is_fresh());
        assert!(record.authorizes());

        let mut expired = record.clone();
        expired.expires_at = Utc::now() - Duration::seconds(1);
        assert!(!expired.is_fresh());
        assert!(!expired.authorizes());
    }

    #[test]
    fn test_invalid_record_never_authorizes() {
        let mut record = ValidationRecord::issue("claude", "fp", 3600, vec![]);
        record.valid = false;
        assert!(record.is_fresh());
        assert!(!record.authorizes());
    }
}

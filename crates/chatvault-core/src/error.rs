//! Error types for ChatVault.

use serde::Serialize;
use thiserror::Error;

/// A single violated parameter field, reported by schema validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Schema validation failed: {}", summarize(.violations))]
    SchemaValidation { violations: Vec<FieldViolation> },

    #[error("Extraction job already running for {provider}/{fingerprint}")]
    JobAlreadyRunning {
        provider: String,
        fingerprint: String,
    },

    #[error("Monitoring session already active for {provider}/{fingerprint}")]
    SessionAlreadyActive {
        provider: String,
        fingerprint: String,
    },

    #[error("Credentials not validated for provider: {0}")]
    CredentialsNotValidated(String),

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

fn summarize(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("{} ({})", v.field, v.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl Error {
    /// Stable snake_case name for the wire and for job/session records.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::UnknownProvider(_) => "unknown_provider",
            Error::InvalidCredentials(_) => "invalid_credentials",
            Error::ProviderUnavailable(_) => "provider_unavailable",
            Error::RateLimited { .. } => "rate_limited",
            Error::SchemaValidation { .. } => "schema_validation",
            Error::JobAlreadyRunning { .. } => "job_already_running",
            Error::SessionAlreadyActive { .. } => "session_already_active",
            Error::CredentialsNotValidated(_) => "credentials_not_validated",
            Error::Execution(_) => "execution_error",
            Error::MalformedPayload(_) => "malformed_payload",
            Error::NotFound(_) => "not_found",
            Error::Internal(_) => "internal",
        }
    }

    /// Whether a caller (or the scheduler's retry loop) may retry.
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            Error::ProviderUnavailable(_) | Error::RateLimited { .. }
        )
    }
}

/// Serializable error snapshot carried by terminal jobs and sessions.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetail {
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldViolation>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

impl From<&Error> for ErrorDetail {
    fn from(err: &Error) -> Self {
        let fields = match err {
            Error::SchemaValidation { violations } => Some(violations.clone()),
            _ => None,
        };
        let retry_after_secs = match err {
            Error::RateLimited { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        };
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
            fields,
            retry_after_secs,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

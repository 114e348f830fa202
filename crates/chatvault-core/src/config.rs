//! Configuration, env-driven with defaults.

use serde::Serialize;

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u32(name: &str, default: u32) -> u32 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Credential validation tunables.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationConfig {
    /// How long a successful validation record stays fresh.
    pub ttl_secs: u64,
    /// Max validation attempts per (provider, fingerprint) in the window.
    pub rate_limit_attempts: usize,
    /// Sliding rate-limit window.
    pub rate_limit_window_secs: u64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 24 * 60 * 60,
            rate_limit_attempts: 5,
            rate_limit_window_secs: 60,
        }
    }
}

/// Extraction job tunables.
#[derive(Debug, Clone, Serialize)]
pub struct JobConfig {
    /// Total attempts per job, including the first.
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    pub backoff_cap_ms: u64,
    /// Bound on a single executor call.
    pub executor_timeout_secs: u64,
    /// Terminal jobs kept in memory before the oldest are dropped.
    pub keep_finished_jobs: usize,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base_ms: 500,
            backoff_cap_ms: 30_000,
            executor_timeout_secs: 30,
            keep_finished_jobs: 100,
        }
    }
}

/// Monitoring session tunables.
#[derive(Debug, Clone, Serialize)]
pub struct MonitorConfig {
    /// Used when the start request carries no polling_interval parameter.
    pub default_poll_interval_secs: u64,
    /// Consecutive poll failures before a session transitions to Error.
    pub max_consecutive_failures: u32,
    /// Cap on the failure backoff delay.
    pub backoff_cap_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            default_poll_interval_secs: 30,
            max_consecutive_failures: 5,
            backoff_cap_secs: 300,
        }
    }
}

/// Top-level configuration.
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | `CHATVAULT_PORT` | `3004` | HTTP server port |
/// | `CHATVAULT_VALIDATION_TTL_SECS` | `86400` | Validation record TTL |
/// | `CHATVAULT_JOB_MAX_ATTEMPTS` | `3` | Extraction attempts per job |
/// | `CHATVAULT_EXECUTOR_TIMEOUT_SECS` | `30` | Bound on one executor call |
/// | `CHATVAULT_POLL_INTERVAL_SECS` | `30` | Default monitoring interval |
#[derive(Debug, Clone, Serialize)]
pub struct ChatVaultConfig {
    pub port: u16,
    pub validation: ValidationConfig,
    pub jobs: JobConfig,
    pub monitor: MonitorConfig,
}

impl Default for ChatVaultConfig {
    fn default() -> Self {
        Self {
            port: 3004,
            validation: ValidationConfig::default(),
            jobs: JobConfig::default(),
            monitor: MonitorConfig::default(),
        }
    }
}

impl ChatVaultConfig {
    pub fn from_env() -> Self {
        let port = std::env::var("CHATVAULT_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3004);

        let validation = ValidationConfig {
            ttl_secs: env_u64("CHATVAULT_VALIDATION_TTL_SECS", 24 * 60 * 60),
            ..ValidationConfig::default()
        };

        let jobs = JobConfig {
            max_attempts: env_u32("CHATVAULT_JOB_MAX_ATTEMPTS", 3).max(1),
            executor_timeout_secs: env_u64("CHATVAULT_EXECUTOR_TIMEOUT_SECS", 30),
            ..JobConfig::default()
        };

        let monitor = MonitorConfig {
            default_poll_interval_secs: env_u64("CHATVAULT_POLL_INTERVAL_SECS", 30),
            ..MonitorConfig::default()
        };

        Self {
            port,
            validation,
            jobs,
            monitor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ChatVaultConfig::default();
        assert_eq!(config.validation.ttl_secs, 86400);
        assert_eq!(config.jobs.max_attempts, 3);
        assert_eq!(config.monitor.default_poll_interval_secs, 30);
        assert_eq!(config.monitor.max_consecutive_failures, 5);
    }
}

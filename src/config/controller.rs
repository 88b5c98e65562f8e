//! # Controller Configuration
//!
//! Controller-level settings loaded from environment variables.

use super::VaultConfig;
use crate::constants::{
    DEFAULT_BACKOFF_MAX_SECS, DEFAULT_BACKOFF_MIN_SECS, DEFAULT_METRICS_PORT,
    DEFAULT_RECONCILE_INTERVAL_SECS, DEFAULT_VAULT_TIMEOUT_SECS, VAULT_ADDR_ENV, VAULT_TOKEN_ENV,
};
use std::time::Duration;
use thiserror::Error;

/// Startup configuration errors
///
/// These abort the process before the watch loop starts; they are never
/// raised from inside a reconciliation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),
    #[error("invalid Vault address '{address}': {reason}")]
    InvalidVaultAddress { address: String, reason: String },
}

/// Controller-level configuration
///
/// Vault address and token are required. Everything else has a default and
/// can be overridden via environment variables.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Vault connection settings (`VAULT_HOST`, `VAULT_TOKEN`, `VAULT_TIMEOUT_SECS`)
    pub vault: VaultConfig,
    /// Routine re-check interval after a successful reconciliation (`RECONCILE_INTERVAL_SECS`)
    pub reconcile_interval_secs: u64,
    /// First Fibonacci backoff step for retryable errors (`BACKOFF_MIN_SECS`)
    pub backoff_min_secs: u64,
    /// Backoff cap for retryable errors (`BACKOFF_MAX_SECS`)
    pub backoff_max_secs: u64,
    /// Port for `/metrics`, `/healthz` and `/readyz` (`METRICS_PORT`)
    pub metrics_port: u16,
}

impl ControllerConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    ///
    /// `from_env` delegates here; tests pass a map instead of mutating the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let address = lookup(VAULT_ADDR_ENV)
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing(VAULT_ADDR_ENV))?;
        let token = lookup(VAULT_TOKEN_ENV)
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing(VAULT_TOKEN_ENV))?;
        let timeout_secs =
            parse_or_default(&lookup, "VAULT_TIMEOUT_SECS", DEFAULT_VAULT_TIMEOUT_SECS);

        let vault = VaultConfig::new(address, token, Duration::from_secs(timeout_secs.max(1)))?;

        // Fibonacci from zero never grows
        let backoff_min_secs =
            parse_or_default(&lookup, "BACKOFF_MIN_SECS", DEFAULT_BACKOFF_MIN_SECS).max(1);
        let backoff_max_secs =
            parse_or_default(&lookup, "BACKOFF_MAX_SECS", DEFAULT_BACKOFF_MAX_SECS)
                .max(backoff_min_secs);

        Ok(Self {
            vault,
            reconcile_interval_secs: parse_or_default(
                &lookup,
                "RECONCILE_INTERVAL_SECS",
                DEFAULT_RECONCILE_INTERVAL_SECS,
            )
            .max(1),
            backoff_min_secs,
            backoff_max_secs,
            metrics_port: parse_or_default(&lookup, "METRICS_PORT", DEFAULT_METRICS_PORT),
        })
    }

    /// Routine re-check interval
    #[must_use]
    pub fn reconcile_interval(&self) -> Duration {
        Duration::from_secs(self.reconcile_interval_secs)
    }
}

/// Read and parse a value, falling back to the default when unset or malformed
fn parse_or_default<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

//! # Vault Configuration
//!
//! Connection settings for the external Vault store.

use super::ConfigError;
use std::time::Duration;
use zeroize::Zeroizing;

/// Vault connection settings
///
/// Built once at startup and handed to [`crate::provider::vault::VaultKvClient::new`].
/// The token is zeroized on drop and never printed.
#[derive(Clone)]
pub struct VaultConfig {
    address: String,
    token: Zeroizing<String>,
    timeout: Duration,
}

impl VaultConfig {
    /// Validate and build a Vault configuration
    ///
    /// The address must be an absolute `http(s)` URL; a trailing `/` is dropped
    /// so request paths can be appended verbatim.
    pub fn new(
        address: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let address = address.into();
        let token = Zeroizing::new(token.into());

        let trimmed = address.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(ConfigError::Missing(crate::constants::VAULT_ADDR_ENV));
        }
        if token.trim().is_empty() {
            return Err(ConfigError::Missing(crate::constants::VAULT_TOKEN_ENV));
        }

        let url = reqwest::Url::parse(trimmed).map_err(|e| ConfigError::InvalidVaultAddress {
            address: trimmed.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidVaultAddress {
                address: trimmed.to_string(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        Ok(Self {
            address: trimmed.to_string(),
            token,
            timeout,
        })
    }

    /// Vault base address without trailing slash
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Fixed per-request timeout
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl std::fmt::Debug for VaultConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultConfig")
            .field("address", &self.address)
            .field("token", &"***")
            .field("timeout", &self.timeout)
            .finish()
    }
}

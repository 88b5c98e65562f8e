//! # Provider Modules
//!
//! The external secret store the controller mirrors into.
//!
//! Reconciliation talks to the store only through [`KvSecretStore`], so the
//! engine can be driven by the Vault client in production and by an in-memory
//! store in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

mod error;
pub mod vault;

pub use error::{StoreError, StoreOperation};

/// Field set of a secret as stored in the external store
///
/// Values come back from the store as JSON, so they stay `serde_json::Value`
/// rather than being coerced to strings.
pub type KvData = BTreeMap<String, serde_json::Value>;

/// Version metadata returned by a successful write
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteMetadata {
    /// New version number of the secret
    #[serde(default)]
    pub version: Option<u64>,
    /// RFC3339 creation time of the new version
    #[serde(default)]
    pub created_time: Option<String>,
}

/// Read/write access to a versioned key/value secret store
///
/// Paths are `<mount>/<path>`. Implementations never retry internally.
#[async_trait]
pub trait KvSecretStore: Send + Sync {
    /// Read the latest field set at `path`
    ///
    /// Returns `Ok(None)` when no secret exists at the path, which is
    /// distinct from failing to reach the store.
    async fn read(&self, path: &str) -> Result<Option<KvData>, StoreError>;

    /// Replace the field set at `path` with `data`
    ///
    /// Full overwrite: fields not present in `data` are gone afterwards.
    async fn write(&self, path: &str, data: &KvData) -> Result<WriteMetadata, StoreError>;
}

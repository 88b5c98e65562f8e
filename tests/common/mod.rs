//! Common test utilities
//!
//! Shared setup for the integration tests: rustls initialization and
//! in-memory stand-ins for the cluster and for Vault.

#![allow(dead_code)]

use async_trait::async_trait;
use reverse_vault_secret_controller::controller::reconciler::{
    BindingResolver, ClusterSecret, ResolveError, ResolvedBinding,
};
use reverse_vault_secret_controller::crd::BindingKey;
use reverse_vault_secret_controller::provider::{
    KvData, KvSecretStore, StoreError, StoreOperation, WriteMetadata,
};
use std::collections::HashMap;
use std::sync::{Mutex, Once};

static RUSTLS_INIT: Once = Once::new();

/// Initialize rustls crypto provider for tests
///
/// Uses a `Once` so it is only installed once across all tests in a binary.
pub fn init_rustls() {
    RUSTLS_INIT.call_once(|| {
        rustls::crypto::ring::default_provider()
            .install_default()
            .expect("Failed to install rustls crypto provider");
    });
}

/// Cluster state as seen by the reconciler: bindings and Secrets
#[derive(Default)]
pub struct FakeCluster {
    bindings: Mutex<HashMap<BindingKey, (String, String)>>,
    secrets: Mutex<HashMap<(String, String), ClusterSecret>>,
}

impl FakeCluster {
    pub fn add_binding(&self, key: &BindingKey, secret_name: &str, vault_path: &str) {
        self.bindings.lock().unwrap().insert(
            key.clone(),
            (secret_name.to_string(), vault_path.to_string()),
        );
    }

    pub fn remove_binding(&self, key: &BindingKey) {
        self.bindings.lock().unwrap().remove(key);
    }

    pub fn put_secret(&self, namespace: &str, name: &str, pairs: &[(&str, &str)]) {
        let data = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.as_bytes().to_vec()))
            .collect();
        self.secrets
            .lock()
            .unwrap()
            .insert((namespace.to_string(), name.to_string()), data);
    }
}

#[async_trait]
impl BindingResolver for FakeCluster {
    async fn resolve(&self, key: &BindingKey) -> Result<Option<ResolvedBinding>, ResolveError> {
        let Some((secret_name, vault_path)) = self.bindings.lock().unwrap().get(key).cloned()
        else {
            return Ok(None);
        };
        let secret = self
            .secrets
            .lock()
            .unwrap()
            .get(&(key.namespace.clone(), secret_name.clone()))
            .cloned()
            .ok_or_else(|| ResolveError::SecretNotFound {
                binding: key.clone(),
                namespace: key.namespace.clone(),
                name: secret_name.clone(),
            })?;
        Ok(Some(ResolvedBinding {
            key: key.clone(),
            secret_name,
            vault_path,
            secret,
        }))
    }
}

/// Full-overwrite KV store keyed by `<mount>/<path>`
#[derive(Default)]
pub struct InMemoryKvStore {
    secrets: Mutex<HashMap<String, (KvData, u64)>>,
    writes: Mutex<Vec<String>>,
    pub unreachable: std::sync::atomic::AtomicBool,
}

impl InMemoryKvStore {
    pub fn get(&self, path: &str) -> Option<KvData> {
        self.secrets
            .lock()
            .unwrap()
            .get(path)
            .map(|(data, _)| data.clone())
    }

    pub fn seed(&self, path: &str, data: KvData) {
        self.secrets
            .lock()
            .unwrap()
            .insert(path.to_string(), (data, 1));
    }

    pub fn delete(&self, path: &str) {
        self.secrets.lock().unwrap().remove(path);
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }

    pub fn version(&self, path: &str) -> Option<u64> {
        self.secrets.lock().unwrap().get(path).map(|(_, v)| *v)
    }

    fn check_reachable(&self, operation: StoreOperation, path: &str) -> Result<(), StoreError> {
        if self.unreachable.load(std::sync::atomic::Ordering::Relaxed) {
            return Err(StoreError::connectivity(operation, path, "connection refused"));
        }
        if !path.contains('/') {
            return Err(StoreError::InvalidPath {
                path: path.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl KvSecretStore for InMemoryKvStore {
    async fn read(&self, path: &str) -> Result<Option<KvData>, StoreError> {
        self.check_reachable(StoreOperation::Read, path)?;
        Ok(self.get(path))
    }

    async fn write(&self, path: &str, data: &KvData) -> Result<WriteMetadata, StoreError> {
        self.check_reachable(StoreOperation::Write, path)?;
        self.writes.lock().unwrap().push(path.to_string());
        let mut secrets = self.secrets.lock().unwrap();
        let version = secrets.get(path).map_or(1, |(_, v)| v + 1);
        secrets.insert(path.to_string(), (data.clone(), version));
        Ok(WriteMetadata {
            version: Some(version),
            created_time: None,
        })
    }
}

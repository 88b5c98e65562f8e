//! # Binding Resolution
//!
//! Loads a binding by key together with the Secret it references.
//! Both lookups are read-only.

use super::types::ClusterSecret;
use crate::crd::{BindingKey, ReverseVaultSecret};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::{Api, Client};
use thiserror::Error;
use tracing::debug;

/// A binding and a fresh copy of the Secret it names
#[derive(Debug, Clone)]
pub struct ResolvedBinding {
    pub key: BindingKey,
    pub secret_name: String,
    pub vault_path: String,
    pub secret: ClusterSecret,
}

#[derive(Debug, Error)]
pub enum ResolveError {
    /// The binding exists but its Secret does not (yet)
    #[error("Secret {namespace}/{name} referenced by ReverseVaultSecret {binding} not found")]
    SecretNotFound {
        binding: BindingKey,
        namespace: String,
        name: String,
    },

    #[error("failed to get {kind} {namespace}/{name}: {source}")]
    Lookup {
        kind: &'static str,
        namespace: String,
        name: String,
        #[source]
        source: kube::Error,
    },
}

/// Resolves a trigger key into a binding and its cluster Secret
#[async_trait]
pub trait BindingResolver: Send + Sync {
    /// `Ok(None)` when the binding itself is gone
    async fn resolve(&self, key: &BindingKey) -> Result<Option<ResolvedBinding>, ResolveError>;
}

/// Resolver backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeBindingResolver {
    client: Client,
}

impl std::fmt::Debug for KubeBindingResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeBindingResolver").finish_non_exhaustive()
    }
}

impl KubeBindingResolver {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BindingResolver for KubeBindingResolver {
    async fn resolve(&self, key: &BindingKey) -> Result<Option<ResolvedBinding>, ResolveError> {
        let bindings: Api<ReverseVaultSecret> =
            Api::namespaced(self.client.clone(), &key.namespace);

        let Some(binding) = bindings
            .get_opt(&key.name)
            .await
            .map_err(|source| ResolveError::Lookup {
                kind: "ReverseVaultSecret",
                namespace: key.namespace.clone(),
                name: key.name.clone(),
                source,
            })?
        else {
            return Ok(None);
        };

        // The Secret always lives in the binding's own namespace
        let secret_name = binding.spec.secret_name.clone();
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), &key.namespace);
        let secret = secrets
            .get_opt(&secret_name)
            .await
            .map_err(|source| ResolveError::Lookup {
                kind: "Secret",
                namespace: key.namespace.clone(),
                name: secret_name.clone(),
                source,
            })?
            .ok_or_else(|| ResolveError::SecretNotFound {
                binding: key.clone(),
                namespace: key.namespace.clone(),
                name: secret_name.clone(),
            })?;

        let data: ClusterSecret = secret
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|(field, bytes)| (field, bytes.0))
            .collect();

        debug!(
            "Resolved {} -> Secret {}/{} ({} fields)",
            key,
            key.namespace,
            secret_name,
            data.len()
        );

        Ok(Some(ResolvedBinding {
            key: key.clone(),
            secret_name,
            vault_path: binding.spec.vault_path,
            secret: data,
        }))
    }
}

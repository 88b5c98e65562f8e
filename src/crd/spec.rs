//! # ReverseVaultSecret Spec
//!
//! Binding between a cluster Secret and a Vault path.

use kube::{CustomResource, ResourceExt};
use serde::{Deserialize, Serialize};

/// ReverseVaultSecret Custom Resource Definition
///
/// # Example
///
/// ```yaml
/// apiVersion: reverse-vault-secret.io/v1beta1
/// kind: ReverseVaultSecret
/// metadata:
///   name: app1
///   namespace: default
/// spec:
///   secretName: app1-credentials
///   vaultPath: kv/app1
/// ```
#[derive(CustomResource, Debug, Clone, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "ReverseVaultSecret",
    group = "reverse-vault-secret.io",
    version = "v1beta1",
    namespaced,
    shortname = "rvs",
    printcolumn = r#"{"name":"Secret", "type":"string", "jsonPath":".spec.secretName"}, {"name":"Vault Path", "type":"string", "jsonPath":".spec.vaultPath"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ReverseVaultSecretSpec {
    /// Name of the Secret to mirror, looked up in the binding's namespace
    pub secret_name: String,
    /// Vault KV v2 destination in the form `<mount>/<path>`
    /// Example: "kv/app1" writes to mount `kv`, secret `app1`
    pub vault_path: String,
}

/// Namespaced identifier of a binding, as handed over by the watch
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BindingKey {
    pub namespace: String,
    pub name: String,
}

impl BindingKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Key of a binding object; cluster-scoped objects fall back to `default`
    #[must_use]
    pub fn from_binding(binding: &ReverseVaultSecret) -> Self {
        Self::new(
            binding.namespace().unwrap_or_else(|| "default".to_string()),
            binding.name_any(),
        )
    }
}

impl std::fmt::Display for BindingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

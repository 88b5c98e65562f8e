//! # Custom Resource Definitions
//!
//! The `ReverseVaultSecret` binding resource.
//!
//! A binding names a Secret in its own namespace and the Vault KV v2 path the
//! Secret is mirrored to. The controller only reads bindings.

mod spec;

pub use spec::{BindingKey, ReverseVaultSecret, ReverseVaultSecretSpec};

//! # Prelude
//!
//! Re-exports commonly used types and traits.
//!
//! ```rust
//! use reverse_vault_secret_controller::prelude::*;
//! ```

pub use crate::crd::*;

pub use crate::provider::vault::VaultKvClient;
pub use crate::provider::{KvData, KvSecretStore, StoreError, StoreOperation, WriteMetadata};

pub use crate::controller::reconciler::{
    reconcile, BindingResolver, KubeBindingResolver, ReconcileOutcome, Reconciler,
    ReconcilerError, ReconcilerSettings, ResolveError,
};

pub use crate::config::{ConfigError, ControllerConfig, VaultConfig};

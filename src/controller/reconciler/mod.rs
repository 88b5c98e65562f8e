//! # Reconciler
//!
//! Keeps a Vault KV v2 secret equal to the cluster Secret a binding names.
//!
//! ## Reconciliation Flow
//!
//! 1. Resolve the binding by key and load the Secret it references
//! 2. Read the current secret at the binding's Vault path
//! 3. Normalize the Secret's byte values to strings and compare
//! 4. Overwrite the Vault secret when they differ
//! 5. Hand a requeue decision back to the controller runtime
//!
//! Data only flows from the cluster into Vault. Nothing is ever deleted.

pub mod normalize;
pub mod reconcile;
pub mod resolve;
pub mod types;

pub use normalize::{normalize, secrets_match};
pub use reconcile::reconcile;
pub use resolve::{BindingResolver, KubeBindingResolver, ResolveError, ResolvedBinding};
pub use types::{
    ClusterSecret, ReconcileOutcome, ReconcilePhase, Reconciler, ReconcilerError,
    ReconcilerSettings,
};

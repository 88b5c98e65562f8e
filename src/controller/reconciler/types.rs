//! # Types
//!
//! Core types for the reconciler.

use super::resolve::{BindingResolver, ResolveError};
use crate::config::ControllerConfig;
use crate::controller::backoff::FibonacciBackoff;
use crate::crd::BindingKey;
use crate::provider::{KvSecretStore, StoreError, WriteMetadata};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Field name to raw bytes, as held in a Kubernetes Secret's `data`
pub type ClusterSecret = BTreeMap<String, Vec<u8>>;

/// Steps of a single reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcilePhase {
    Resolving,
    Comparing,
    Skip,
    Writing,
    Done,
}

impl ReconcilePhase {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconcilePhase::Resolving => "resolving",
            ReconcilePhase::Comparing => "comparing",
            ReconcilePhase::Skip => "skip",
            ReconcilePhase::Writing => "writing",
            ReconcilePhase::Done => "done",
        }
    }
}

/// Result of a reconciliation that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The binding no longer exists; nothing to do
    BindingNotFound,
    /// Vault already held the normalized Secret
    InSync,
    /// Vault was overwritten with the normalized Secret
    Written(WriteMetadata),
}

#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("failed to read secret from Vault at '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: StoreError,
    },

    #[error("failed to update secret in Vault at '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: StoreError,
    },
}

impl ReconcilerError {
    /// Errors that retrying cannot fix; only an edit of the binding can
    #[must_use]
    pub fn is_permanent(&self) -> bool {
        match self {
            ReconcilerError::Resolve(_) => false,
            ReconcilerError::Read { source, .. } | ReconcilerError::Write { source, .. } => {
                source.is_permanent()
            }
        }
    }
}

/// Timing knobs for requeue decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcilerSettings {
    /// Routine re-check after a successful reconciliation
    pub reconcile_interval: Duration,
    pub backoff_min_secs: u64,
    pub backoff_max_secs: u64,
}

impl From<&ControllerConfig> for ReconcilerSettings {
    fn from(config: &ControllerConfig) -> Self {
        Self {
            reconcile_interval: config.reconcile_interval(),
            backoff_min_secs: config.backoff_min_secs,
            backoff_max_secs: config.backoff_max_secs,
        }
    }
}

impl Default for ReconcilerSettings {
    fn default() -> Self {
        use crate::constants::{
            DEFAULT_BACKOFF_MAX_SECS, DEFAULT_BACKOFF_MIN_SECS, DEFAULT_RECONCILE_INTERVAL_SECS,
        };
        Self {
            reconcile_interval: Duration::from_secs(DEFAULT_RECONCILE_INTERVAL_SECS),
            backoff_min_secs: DEFAULT_BACKOFF_MIN_SECS,
            backoff_max_secs: DEFAULT_BACKOFF_MAX_SECS,
        }
    }
}

/// Shared reconciliation context
///
/// Holds no per-binding data except the retry backoff, which lives here
/// rather than in the reconcile path so a failing binding cannot stall others.
pub struct Reconciler {
    pub(super) resolver: Arc<dyn BindingResolver>,
    pub(super) store: Arc<dyn KvSecretStore>,
    settings: ReconcilerSettings,
    backoff_states: Mutex<HashMap<BindingKey, FibonacciBackoff>>,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    pub fn new(
        resolver: Arc<dyn BindingResolver>,
        store: Arc<dyn KvSecretStore>,
        settings: ReconcilerSettings,
    ) -> Self {
        Self {
            resolver,
            store,
            settings,
            backoff_states: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &ReconcilerSettings {
        &self.settings
    }

    /// Next retry delay for a failing binding
    pub fn next_error_backoff(&self, key: &BindingKey) -> Duration {
        match self.backoff_states.lock() {
            Ok(mut states) => states
                .entry(key.clone())
                .or_insert_with(|| {
                    FibonacciBackoff::new(
                        self.settings.backoff_min_secs,
                        self.settings.backoff_max_secs,
                    )
                })
                .next_backoff(),
            Err(e) => {
                warn!("Failed to lock backoff states: {}, using minimum backoff", e);
                Duration::from_secs(self.settings.backoff_min_secs)
            }
        }
    }

    /// Forget the backoff of a binding that reconciled successfully
    pub fn reset_backoff(&self, key: &BindingKey) {
        match self.backoff_states.lock() {
            Ok(mut states) => {
                states.remove(key);
            }
            Err(e) => warn!("Failed to lock backoff states: {}", e),
        }
    }
}

//! # Error Policy
//!
//! Maps a failed reconciliation to the next scheduler action.
//!
//! A malformed Vault path cannot succeed until the binding is edited, so it
//! waits for a change. Every other failure is retried with a per-binding
//! Fibonacci backoff that is reset by the next success.

use crate::controller::reconciler::{Reconciler, ReconcilerError};
use crate::crd::{BindingKey, ReverseVaultSecret};
use crate::observability::metrics;
use kube_runtime::controller::Action;
use std::sync::Arc;
use tracing::{error, info, warn};

pub fn handle_reconciliation_error(
    binding: Arc<ReverseVaultSecret>,
    error: &ReconcilerError,
    ctx: Arc<Reconciler>,
) -> Action {
    let key = BindingKey::from_binding(&binding);

    let error_span = tracing::span!(
        tracing::Level::ERROR,
        "controller.reconciliation_error",
        binding.namespace = %key.namespace,
        binding.name = %key.name,
        error = %error
    );
    let _error_guard = error_span.enter();

    error!("Reconciliation error for {}: {}", key, error);
    metrics::increment_reconciliation_errors();

    if error.is_permanent() {
        warn!("Not retrying {} until the binding changes: {}", key, error);
        metrics::increment_requeues_total("await-change");
        return Action::await_change();
    }

    let backoff = ctx.next_error_backoff(&key);
    let next_trigger_time = chrono::Utc::now()
        + chrono::Duration::from_std(backoff).unwrap_or_else(|_| chrono::Duration::zero());
    info!(
        "Retrying {} in {}s (next attempt {})",
        key,
        backoff.as_secs(),
        next_trigger_time.to_rfc3339()
    );

    metrics::increment_requeues_total("error-backoff");
    Action::requeue(backoff)
}

/// Whether a watch stream error should end the current stream
///
/// Expired resource versions and a missing CRD are logged and the stream
/// continues; anything else restarts the watch after a delay.
#[must_use]
pub fn should_restart_watch(error_string: &str) -> bool {
    let is_410 = error_string.contains("410")
        || error_string.contains("too old resource version")
        || error_string.contains("Expired");
    let is_not_found = error_string.contains("ObjectNotFound") || error_string.contains("404");

    if is_410 {
        warn!("Watch resource version expired (410), continuing");
        false
    } else if is_not_found {
        warn!(
            "ReverseVaultSecret watch returned not found, is the CRD installed? Error: {}",
            error_string
        );
        false
    } else {
        error!("Controller stream error: {}", error_string);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::reconciler::{
        BindingResolver, ReconcilerSettings, ResolveError, ResolvedBinding,
    };
    use crate::crd::ReverseVaultSecretSpec;
    use crate::provider::{KvData, KvSecretStore, StoreError, StoreOperation, WriteMetadata};
    use async_trait::async_trait;
    use std::time::Duration;

    struct NoopResolver;

    #[async_trait]
    impl BindingResolver for NoopResolver {
        async fn resolve(
            &self,
            _key: &BindingKey,
        ) -> Result<Option<ResolvedBinding>, ResolveError> {
            Ok(None)
        }
    }

    struct NoopStore;

    #[async_trait]
    impl KvSecretStore for NoopStore {
        async fn read(&self, _path: &str) -> Result<Option<KvData>, StoreError> {
            Ok(None)
        }

        async fn write(&self, _path: &str, _data: &KvData) -> Result<WriteMetadata, StoreError> {
            Ok(WriteMetadata::default())
        }
    }

    fn ctx() -> Arc<Reconciler> {
        Arc::new(Reconciler::new(
            Arc::new(NoopResolver),
            Arc::new(NoopStore),
            ReconcilerSettings {
                reconcile_interval: Duration::from_secs(60),
                backoff_min_secs: 5,
                backoff_max_secs: 12,
            },
        ))
    }

    fn binding() -> Arc<ReverseVaultSecret> {
        let mut binding = ReverseVaultSecret::new(
            "app1",
            ReverseVaultSecretSpec {
                secret_name: "app1-credentials".to_string(),
                vault_path: "secrets".to_string(),
            },
        );
        binding.metadata.namespace = Some("default".to_string());
        Arc::new(binding)
    }

    fn read_error(source: StoreError) -> ReconcilerError {
        ReconcilerError::Read {
            path: "kv/app1".to_string(),
            source,
        }
    }

    #[test]
    fn test_invalid_path_waits_for_change() {
        let error = read_error(StoreError::InvalidPath {
            path: "secrets".to_string(),
        });
        let action = handle_reconciliation_error(binding(), &error, ctx());
        assert_eq!(action, Action::await_change());
    }

    #[test]
    fn test_retryable_errors_back_off_up_to_cap() {
        let ctx = ctx();
        let error = read_error(StoreError::connectivity(
            StoreOperation::Read,
            "kv/app1",
            "connection refused",
        ));

        let delays: Vec<Action> = (0..5)
            .map(|_| handle_reconciliation_error(binding(), &error, ctx.clone()))
            .collect();

        assert_eq!(
            delays,
            vec![
                Action::requeue(Duration::from_secs(5)),
                Action::requeue(Duration::from_secs(5)),
                Action::requeue(Duration::from_secs(10)),
                Action::requeue(Duration::from_secs(12)),
                Action::requeue(Duration::from_secs(12)),
            ]
        );
    }

    #[test]
    fn test_missing_secret_is_retried() {
        let key = BindingKey::new("default", "app1");
        let error = ReconcilerError::Resolve(ResolveError::SecretNotFound {
            binding: key.clone(),
            namespace: "default".to_string(),
            name: "app1-credentials".to_string(),
        });
        let action = handle_reconciliation_error(binding(), &error, ctx());
        assert_eq!(action, Action::requeue(Duration::from_secs(5)));
    }

    #[test]
    fn test_watch_error_classification() {
        assert!(!should_restart_watch("WatchFailed: 410 Gone: too old resource version"));
        assert!(!should_restart_watch("ObjectNotFound"));
        assert!(should_restart_watch("connection reset by peer"));
    }
}

//! # Reconcile
//!
//! The decision procedure for one binding: resolve, read, compare, write.
//! Calls run strictly in that order; the write decision is always based on
//! the Vault state read in the same pass.

use super::normalize::{normalize, secrets_match};
use super::types::{ReconcileOutcome, ReconcilePhase, Reconciler, ReconcilerError};
use crate::crd::{BindingKey, ReverseVaultSecret};
use crate::observability::metrics;
use kube_runtime::controller::Action;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, info_span, Instrument};

impl Reconciler {
    /// Run one reconciliation for the binding identified by `key`
    pub async fn reconcile_binding(
        &self,
        key: &BindingKey,
    ) -> Result<ReconcileOutcome, ReconcilerError> {
        enter(ReconcilePhase::Resolving);
        let resolved = match self.resolver.resolve(key).await {
            Ok(Some(resolved)) => resolved,
            Ok(None) => {
                info!(
                    "ReverseVaultSecret {} not found, ignoring since object must be deleted",
                    key
                );
                enter(ReconcilePhase::Done);
                return Ok(ReconcileOutcome::BindingNotFound);
            }
            Err(e) => {
                error!("Failed to resolve ReverseVaultSecret {}: {}", key, e);
                return Err(e.into());
            }
        };

        let path = resolved.vault_path.as_str();
        let external = self.store.read(path).await.map_err(|source| {
            error!("Failed to read secret from Vault: {}: {}", path, source);
            ReconcilerError::Read {
                path: path.to_string(),
                source,
            }
        })?;

        enter(ReconcilePhase::Comparing);
        let normalized = normalize(&resolved.secret);
        if secrets_match(&normalized, external.as_ref()) {
            enter(ReconcilePhase::Skip);
            debug!(
                "Vault path {} already matches Secret {}/{}",
                path, key.namespace, resolved.secret_name
            );
            metrics::increment_vault_skips();
            enter(ReconcilePhase::Done);
            return Ok(ReconcileOutcome::InSync);
        }

        enter(ReconcilePhase::Writing);
        if external.is_none() {
            info!(
                "No secret at Vault path {}, writing Secret {}/{}",
                path, key.namespace, resolved.secret_name
            );
        } else {
            info!(
                "Vault path {} differs from Secret {}/{}, overwriting",
                path, key.namespace, resolved.secret_name
            );
        }

        let metadata = self.store.write(path, &normalized).await.map_err(|source| {
            error!("Failed to update secret in Vault: {}: {}", path, source);
            ReconcilerError::Write {
                path: path.to_string(),
                source,
            }
        })?;

        metrics::increment_vault_writes();
        info!(
            "Wrote {} fields to Vault path {} (version {})",
            normalized.len(),
            path,
            metadata
                .version
                .map_or_else(|| "unknown".to_string(), |v| v.to_string())
        );
        enter(ReconcilePhase::Done);
        Ok(ReconcileOutcome::Written(metadata))
    }

    /// Scheduler decision for a successful reconciliation
    ///
    /// A deleted binding needs no further work. Both a skip and a write are
    /// re-checked on the routine interval, since Secret changes are only
    /// picked up by re-comparing.
    #[must_use]
    pub fn action_for(&self, outcome: &ReconcileOutcome) -> Action {
        match outcome {
            ReconcileOutcome::BindingNotFound => Action::await_change(),
            ReconcileOutcome::InSync | ReconcileOutcome::Written(_) => {
                metrics::increment_requeues_total("interval");
                Action::requeue(self.settings().reconcile_interval)
            }
        }
    }
}

fn enter(phase: ReconcilePhase) {
    debug!(phase = phase.as_str(), "reconcile.phase");
}

/// Controller entry point for a watched binding
///
/// The watched object only supplies the key; the binding is read again so a
/// deletion racing the trigger ends quietly.
pub async fn reconcile(
    binding: Arc<ReverseVaultSecret>,
    ctx: Arc<Reconciler>,
) -> Result<Action, ReconcilerError> {
    let key = BindingKey::from_binding(&binding);
    let span = info_span!(
        "reconcile",
        binding.namespace = %key.namespace,
        binding.name = %key.name
    );

    async move {
        let start = Instant::now();
        metrics::increment_reconciliations();

        let result = ctx.reconcile_binding(&key).await;
        metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());

        let outcome = result?;
        ctx.reset_backoff(&key);
        Ok(ctx.action_for(&outcome))
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::reconciler::resolve::{BindingResolver, ResolveError, ResolvedBinding};
    use crate::controller::reconciler::types::{ClusterSecret, ReconcilerSettings};
    use crate::provider::{KvData, KvSecretStore, StoreError, StoreOperation, WriteMetadata};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Resolver returning a fixed answer
    enum ScriptedResolver {
        Found(ResolvedBinding),
        Missing,
        SecretMissing,
    }

    #[async_trait]
    impl BindingResolver for ScriptedResolver {
        async fn resolve(
            &self,
            key: &BindingKey,
        ) -> Result<Option<ResolvedBinding>, ResolveError> {
            match self {
                ScriptedResolver::Found(resolved) => Ok(Some(resolved.clone())),
                ScriptedResolver::Missing => Ok(None),
                ScriptedResolver::SecretMissing => Err(ResolveError::SecretNotFound {
                    binding: key.clone(),
                    namespace: key.namespace.clone(),
                    name: "app1-credentials".to_string(),
                }),
            }
        }
    }

    /// Store that records every call and can be told to fail
    #[derive(Default)]
    struct RecordingStore {
        current: Mutex<Option<KvData>>,
        calls: Mutex<Vec<String>>,
        fail_read: bool,
        fail_write: bool,
    }

    impl RecordingStore {
        fn holding(data: KvData) -> Self {
            Self {
                current: Mutex::new(Some(data)),
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl KvSecretStore for RecordingStore {
        async fn read(&self, path: &str) -> Result<Option<KvData>, StoreError> {
            self.calls.lock().unwrap().push(format!("read {path}"));
            if self.fail_read {
                return Err(StoreError::connectivity(
                    StoreOperation::Read,
                    path,
                    "connection refused",
                ));
            }
            Ok(self.current.lock().unwrap().clone())
        }

        async fn write(&self, path: &str, data: &KvData) -> Result<WriteMetadata, StoreError> {
            self.calls.lock().unwrap().push(format!("write {path}"));
            if self.fail_write {
                return Err(StoreError::Operation {
                    operation: StoreOperation::Write,
                    path: path.to_string(),
                    status: 403,
                    message: "permission denied".to_string(),
                });
            }
            *self.current.lock().unwrap() = Some(data.clone());
            Ok(WriteMetadata {
                version: Some(1),
                created_time: None,
            })
        }
    }

    fn key() -> BindingKey {
        BindingKey::new("default", "app1")
    }

    fn resolved(vault_path: &str, pairs: &[(&str, &str)]) -> ResolvedBinding {
        let secret: ClusterSecret = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.as_bytes().to_vec()))
            .collect();
        ResolvedBinding {
            key: key(),
            secret_name: "app1-credentials".to_string(),
            vault_path: vault_path.to_string(),
            secret,
        }
    }

    fn reconciler(resolver: ScriptedResolver, store: Arc<RecordingStore>) -> Reconciler {
        Reconciler::new(
            Arc::new(resolver),
            store,
            ReconcilerSettings {
                reconcile_interval: Duration::from_secs(30),
                backoff_min_secs: 2,
                backoff_max_secs: 20,
            },
        )
    }

    #[tokio::test]
    async fn test_missing_binding_is_no_action() {
        let store = Arc::new(RecordingStore::default());
        let reconciler = reconciler(ScriptedResolver::Missing, store.clone());

        let outcome = reconciler.reconcile_binding(&key()).await.unwrap();

        assert_eq!(outcome, ReconcileOutcome::BindingNotFound);
        assert_eq!(reconciler.action_for(&outcome), Action::await_change());
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_secret_is_retryable_error_without_store_calls() {
        let store = Arc::new(RecordingStore::default());
        let reconciler = reconciler(ScriptedResolver::SecretMissing, store.clone());

        let err = reconciler.reconcile_binding(&key()).await.unwrap_err();

        assert!(matches!(
            err,
            ReconcilerError::Resolve(ResolveError::SecretNotFound { .. })
        ));
        assert!(!err.is_permanent());
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_read_failure_skips_write() {
        let store = Arc::new(RecordingStore {
            fail_read: true,
            ..RecordingStore::default()
        });
        let reconciler = reconciler(
            ScriptedResolver::Found(resolved("kv/app1", &[("user", "u1")])),
            store.clone(),
        );

        let err = reconciler.reconcile_binding(&key()).await.unwrap_err();

        assert!(matches!(err, ReconcilerError::Read { ref path, .. } if path == "kv/app1"));
        assert!(!err.is_permanent());
        assert_eq!(store.calls(), vec!["read kv/app1"]);
    }

    #[tokio::test]
    async fn test_write_failure_is_reported_with_path() {
        let store = Arc::new(RecordingStore {
            fail_write: true,
            ..RecordingStore::default()
        });
        let reconciler = reconciler(
            ScriptedResolver::Found(resolved("kv/app1", &[("user", "u1")])),
            store.clone(),
        );

        let err = reconciler.reconcile_binding(&key()).await.unwrap_err();

        assert!(matches!(err, ReconcilerError::Write { ref path, .. } if path == "kv/app1"));
        assert!(err.to_string().contains("kv/app1"));
        assert_eq!(store.calls(), vec!["read kv/app1", "write kv/app1"]);
    }

    #[tokio::test]
    async fn test_read_happens_before_write() {
        let store = Arc::new(RecordingStore::holding(
            serde_json::from_value(json!({"user": "old"})).unwrap(),
        ));
        let reconciler = reconciler(
            ScriptedResolver::Found(resolved("kv/app1", &[("user", "new")])),
            store.clone(),
        );

        let outcome = reconciler.reconcile_binding(&key()).await.unwrap();

        assert!(matches!(outcome, ReconcileOutcome::Written(_)));
        assert_eq!(store.calls(), vec!["read kv/app1", "write kv/app1"]);
        assert_eq!(reconciler.action_for(&outcome), Action::requeue(Duration::from_secs(30)));
    }

    #[tokio::test]
    async fn test_in_sync_requeues_on_interval() {
        let store = Arc::new(RecordingStore::holding(
            serde_json::from_value(json!({"user": "u1"})).unwrap(),
        ));
        let reconciler = reconciler(
            ScriptedResolver::Found(resolved("kv/app1", &[("user", "u1")])),
            store.clone(),
        );

        let outcome = reconciler.reconcile_binding(&key()).await.unwrap();

        assert_eq!(outcome, ReconcileOutcome::InSync);
        assert_eq!(store.calls(), vec!["read kv/app1"]);
        assert_eq!(reconciler.action_for(&outcome), Action::requeue(Duration::from_secs(30)));
    }

    #[tokio::test]
    async fn test_reconcile_entry_resets_backoff_on_success() {
        let store = Arc::new(RecordingStore::default());
        let reconciler = Arc::new(reconciler(
            ScriptedResolver::Found(resolved("kv/app1", &[("user", "u1")])),
            store,
        ));

        // Three failures advance the sequence past its first steps
        assert_eq!(reconciler.next_error_backoff(&key()), Duration::from_secs(2));
        assert_eq!(reconciler.next_error_backoff(&key()), Duration::from_secs(2));
        assert_eq!(reconciler.next_error_backoff(&key()), Duration::from_secs(4));

        let mut binding = ReverseVaultSecret::new(
            "app1",
            crate::crd::ReverseVaultSecretSpec {
                secret_name: "app1-credentials".to_string(),
                vault_path: "kv/app1".to_string(),
            },
        );
        binding.metadata.namespace = Some("default".to_string());

        let action = reconcile(Arc::new(binding), reconciler.clone()).await.unwrap();

        assert_eq!(action, Action::requeue(Duration::from_secs(30)));
        assert_eq!(reconciler.next_error_backoff(&key()), Duration::from_secs(2));
    }
}

//! # Metrics
//!
//! Prometheus metrics for monitoring the controller.
//!
//! ## Metrics Exposed
//!
//! - `reverse_vault_secret_reconciliations_total` - Total number of reconciliations
//! - `reverse_vault_secret_reconciliation_errors_total` - Total number of failed reconciliations
//! - `reverse_vault_secret_reconciliation_duration_seconds` - Duration of reconciliations
//! - `reverse_vault_secret_vault_writes_total` - Secrets overwritten in Vault
//! - `reverse_vault_secret_vault_skips_total` - Reconciliations that found Vault already in sync
//! - `reverse_vault_secret_vault_operations_total` - Vault calls by operation and result
//! - `reverse_vault_secret_vault_operation_duration_seconds` - Vault call latency by operation
//! - `reverse_vault_secret_requeues_total` - Requeue decisions by reason

use anyhow::Result;
use prometheus::{Histogram, HistogramVec, IntCounter, IntCounterVec, Registry};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "reverse_vault_secret_reconciliations_total",
        "Total number of reconciliations",
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "reverse_vault_secret_reconciliation_errors_total",
        "Total number of reconciliation errors",
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "reverse_vault_secret_reconciliation_duration_seconds",
            "Duration of reconciliation in seconds",
        )
        .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 20.0]),
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static VAULT_WRITES_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "reverse_vault_secret_vault_writes_total",
        "Total number of secrets overwritten in Vault",
    )
    .expect("Failed to create VAULT_WRITES_TOTAL metric - this should never happen")
});

static VAULT_SKIPS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "reverse_vault_secret_vault_skips_total",
        "Total number of reconciliations where Vault already matched the cluster Secret",
    )
    .expect("Failed to create VAULT_SKIPS_TOTAL metric - this should never happen")
});

static VAULT_OPERATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "reverse_vault_secret_vault_operations_total",
            "Total number of Vault operations by operation and result",
        ),
        &["operation", "result"],
    )
    .expect("Failed to create VAULT_OPERATIONS_TOTAL metric - this should never happen")
});

static VAULT_OPERATION_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        prometheus::HistogramOpts::new(
            "reverse_vault_secret_vault_operation_duration_seconds",
            "Duration of Vault operations in seconds",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
        &["operation"],
    )
    .expect("Failed to create VAULT_OPERATION_DURATION metric - this should never happen")
});

static REQUEUES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "reverse_vault_secret_requeues_total",
            "Total number of requeue decisions by reason",
        ),
        &["reason"],
    )
    .expect("Failed to create REQUEUES_TOTAL metric - this should never happen")
});

pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(VAULT_WRITES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(VAULT_SKIPS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(VAULT_OPERATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(VAULT_OPERATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(REQUEUES_TOTAL.clone()))?;

    Ok(())
}

pub fn increment_reconciliations() {
    RECONCILIATIONS_TOTAL.inc();
}

pub fn increment_reconciliation_errors() {
    RECONCILIATION_ERRORS_TOTAL.inc();
}

pub fn observe_reconciliation_duration(duration: f64) {
    RECONCILIATION_DURATION.observe(duration);
}

pub fn increment_vault_writes() {
    VAULT_WRITES_TOTAL.inc();
}

pub fn increment_vault_skips() {
    VAULT_SKIPS_TOTAL.inc();
}

/// Record one Vault call; `result` is `ok`, `absent` or `error`
pub fn record_vault_operation(operation: &str, result: &str, duration: f64) {
    VAULT_OPERATIONS_TOTAL
        .with_label_values(&[operation, result])
        .inc();
    VAULT_OPERATION_DURATION
        .with_label_values(&[operation])
        .observe(duration);
}

pub fn increment_requeues_total(reason: &str) {
    REQUEUES_TOTAL.with_label_values(&[reason]).inc();
}

//! # Reverse Vault Secret Controller
//!
//! Watches `ReverseVaultSecret` bindings in all namespaces and keeps the
//! named Vault KV v2 secrets equal to their cluster Secrets.
//!
//! ## Configuration
//!
//! - `VAULT_HOST` / `VAULT_TOKEN` - required, startup fails without them
//! - `VAULT_TIMEOUT_SECS` - per-request Vault timeout (default 10)
//! - `RECONCILE_INTERVAL_SECS` - routine re-check interval (default 60)
//! - `BACKOFF_MIN_SECS` / `BACKOFF_MAX_SECS` - retry backoff bounds (default 5 / 300)
//! - `METRICS_PORT` - metrics and health check port (default 5000)
//! - `RUST_LOG` - tracing filter

use anyhow::Result;
use reverse_vault_secret_controller::runtime::{initialization, watch_loop};

#[tokio::main]
async fn main() -> Result<()> {
    let init = initialization::initialize().await?;

    watch_loop::run_watch_loop(init.bindings, init.reconciler, init.server_state).await
}

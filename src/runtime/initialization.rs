//! # Initialization
//!
//! Controller startup: rustls setup, tracing, metrics, server startup,
//! configuration, and the Kubernetes and Vault clients.

use crate::config::ControllerConfig;
use crate::constants::{
    DEFAULT_LOG_FILTER, DEFAULT_SERVER_POLL_INTERVAL_MS, DEFAULT_SERVER_STARTUP_TIMEOUT_SECS,
};
use crate::controller::reconciler::{KubeBindingResolver, Reconciler, ReconcilerSettings};
use crate::controller::server::{start_server, ServerState};
use crate::crd::ReverseVaultSecret;
use crate::observability;
use crate::provider::vault::VaultKvClient;
use anyhow::{Context, Result};
use kube::{api::Api, Client};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Everything the watch loop needs
pub struct InitializationResult {
    /// API for ReverseVaultSecret bindings in all namespaces
    pub bindings: Api<ReverseVaultSecret>,
    /// Reconciler context
    pub reconciler: Arc<Reconciler>,
    /// Server state for health checks
    pub server_state: Arc<ServerState>,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult")
            .field("server_ready", &self.server_state.is_ready())
            .finish_non_exhaustive()
    }
}

/// Initialize the controller runtime
///
/// Configuration errors abort startup here, before any binding is watched.
pub async fn initialize() -> Result<InitializationResult> {
    // Required for rustls 0.23+ when no default provider is selected via features.
    // Fails only if a provider is already installed, which is fine.
    let _ = rustls::crypto::ring::default_provider().install_default();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .init();

    info!("Starting ReverseVaultSecret controller");
    info!(
        "Build info: timestamp={}, git_hash={}",
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_GIT_HASH")
    );

    let config = ControllerConfig::from_env().context("Invalid controller configuration")?;
    info!(
        "Vault: {} (timeout {}s), reconcile interval {}s, backoff {}s..{}s",
        config.vault.address(),
        config.vault.timeout().as_secs(),
        config.reconcile_interval_secs,
        config.backoff_min_secs,
        config.backoff_max_secs
    );

    observability::metrics::register_metrics()?;

    let server_state = Arc::new(ServerState::default());
    let server_state_clone = server_state.clone();
    let server_port = config.metrics_port;
    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(server_port, server_state_clone).await {
            error!("HTTP server error: {}", e);
        }
    });
    wait_for_server_ready(&server_state, &server_handle).await?;

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;
    let bindings: Api<ReverseVaultSecret> = Api::all(client.clone());

    let store = VaultKvClient::new(&config.vault).context("Failed to create Vault client")?;
    let reconciler = Arc::new(Reconciler::new(
        Arc::new(KubeBindingResolver::new(client)),
        Arc::new(store),
        ReconcilerSettings::from(&config),
    ));

    info!("Controller initialized, starting watch loop...");

    Ok(InitializationResult {
        bindings,
        reconciler,
        server_state,
    })
}

/// Wait for the HTTP server to bind
async fn wait_for_server_ready(
    server_state: &Arc<ServerState>,
    server_handle: &tokio::task::JoinHandle<()>,
) -> Result<()> {
    let startup_timeout = Duration::from_secs(DEFAULT_SERVER_STARTUP_TIMEOUT_SECS);
    let poll_interval = Duration::from_millis(DEFAULT_SERVER_POLL_INTERVAL_MS);
    let start_time = Instant::now();

    loop {
        if server_handle.is_finished() {
            return Err(anyhow::anyhow!("HTTP server failed to start"));
        }

        if server_state.is_ready() {
            info!("HTTP server is ready and accepting connections");
            return Ok(());
        }

        if start_time.elapsed() > startup_timeout {
            return Err(anyhow::anyhow!(
                "HTTP server failed to become ready within {} seconds",
                startup_timeout.as_secs()
            ));
        }

        tokio::time::sleep(poll_interval).await;
    }
}

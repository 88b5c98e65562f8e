//! # Watch Loop
//!
//! Watches ReverseVaultSecret bindings in all namespaces and feeds them to
//! the reconciler. Each binding is reconciled by at most one task at a time;
//! different bindings proceed independently.

use crate::constants::DEFAULT_WATCH_RESTART_DELAY_SECS;
use crate::controller::reconciler::{reconcile, Reconciler, ReconcilerError};
use crate::controller::server::ServerState;
use crate::crd::{BindingKey, ReverseVaultSecret};
use crate::runtime::error_policy::{handle_reconciliation_error, should_restart_watch};
use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt};
use kube::api::{Api, DynamicObject};
use kube_runtime::controller::{Action, Error as ControllerError};
use kube_runtime::reflector::ObjectRef;
use kube_runtime::{watcher, Controller};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn, Instrument};

type ControllerEvent = Result<
    (ObjectRef<ReverseVaultSecret>, Action),
    ControllerError<ReconcilerError, watcher::Error>,
>;

/// Run the controller until a shutdown signal arrives
///
/// The watch is restarted after a delay whenever its stream ends or fails.
pub async fn run_watch_loop(
    bindings: Api<ReverseVaultSecret>,
    reconciler: Arc<Reconciler>,
    server_state: Arc<ServerState>,
) -> Result<(), anyhow::Error> {
    let restart_delay = Duration::from_secs(DEFAULT_WATCH_RESTART_DELAY_SECS);

    // Fail readiness as soon as shutdown starts so no new traffic is routed here
    spawn_readiness_on_shutdown(shutdown_signal()?, server_state.clone());

    loop {
        if !server_state.is_ready() {
            info!("Shutdown requested, exiting watch loop");
            break;
        }

        info!("Starting controller watch loop...");
        Controller::new(bindings.clone(), watcher::Config::default())
            .shutdown_on_signal()
            .run(reconcile, handle_reconciliation_error, reconciler.clone())
            .take_while(|event| futures::future::ready(handle_event(&reconciler, event)))
            .for_each(|_| futures::future::ready(()))
            .instrument(tracing::info_span!("controller.watch"))
            .await;

        // The stream also ends on SIGTERM/SIGINT; the delay gives the signal
        // task time to clear readiness before the check at the top of the loop
        warn!(
            "Controller watch stream ended, restarting in {} seconds unless shutting down...",
            restart_delay.as_secs()
        );
        tokio::time::sleep(restart_delay).await;
    }

    info!("Controller stopped gracefully");
    Ok(())
}

/// Resolves with the signal name on SIGINT or SIGTERM
///
/// The SIGTERM listener is registered before this returns, so a signal sent
/// right afterwards is not missed.
#[cfg(unix)]
pub fn shutdown_signal() -> std::io::Result<BoxFuture<'static, &'static str>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    Ok(async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => "SIGINT",
            _ = terminate.recv() => "SIGTERM",
        }
    }
    .boxed())
}

#[cfg(not(unix))]
pub fn shutdown_signal() -> std::io::Result<BoxFuture<'static, &'static str>> {
    Ok(async {
        let _ = tokio::signal::ctrl_c().await;
        "ctrl-c"
    }
    .boxed())
}

/// Clear readiness once `signal` resolves
pub fn spawn_readiness_on_shutdown<F>(signal: F, server_state: Arc<ServerState>) -> JoinHandle<()>
where
    F: Future<Output = &'static str> + Send + 'static,
{
    tokio::spawn(async move {
        let name = signal.await;
        info!("Received {}, initiating graceful shutdown...", name);
        server_state.set_ready(false);
    })
}

/// Handle one controller event; `false` ends the current watch stream
fn handle_event(reconciler: &Reconciler, event: &ControllerEvent) -> bool {
    match event {
        Ok((object, action)) => {
            debug!("Reconciled {}: {:?}", object, action);
            true
        }
        // Already handled by the error policy
        Err(ControllerError::ReconcilerFailed(_, object)) => {
            debug!("Reconciliation of {} failed, requeued", object);
            true
        }
        // Deleted while queued; reconcile never runs again for it
        Err(ControllerError::ObjectNotFound(object)) => {
            debug!("{} left the cache before reconciling", object);
            reconciler.reset_backoff(&binding_key(object));
            true
        }
        Err(e) => !should_restart_watch(&format!("{e:?}")),
    }
}

fn binding_key(object: &ObjectRef<DynamicObject>) -> BindingKey {
    BindingKey::new(
        object
            .namespace
            .clone()
            .unwrap_or_else(|| "default".to_string()),
        object.name.clone(),
    )
}

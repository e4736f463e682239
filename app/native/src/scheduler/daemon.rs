//! Foreground scheduler loop.
//!
//! Wakes every tick, starts due jobs on the [`LocalJobSystem`], and exits on
//! Ctrl-C after in-flight runs have finished.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::MissedTickBehavior;

use super::{Connectivity, LocalJobSystem, SchedulerError};

/// Runs the scheduler until Ctrl-C.
///
/// # Errors
///
/// Returns `SchedulerError::Spawn` if the async runtime cannot be created.
pub fn run(
    system: &LocalJobSystem,
    network: Arc<dyn Connectivity>,
    tick: Duration,
) -> Result<(), SchedulerError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| SchedulerError::Spawn(format!("failed to start runtime: {err}")))?;

    runtime.block_on(run_until(system.clone(), network, tick, async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    }));

    tracing::info!("waiting for running jobs");
    system.wait_all();
    Ok(())
}

/// Dispatch loop that stops when `shutdown` completes.
///
/// Jobs left running by a previous process are recovered first.
pub async fn run_until<F>(
    system: LocalJobSystem,
    network: Arc<dyn Connectivity>,
    tick: Duration,
    shutdown: F,
) where
    F: Future<Output = ()>,
{
    match system.recover() {
        Ok(0) => {}
        Ok(recovered) => tracing::warn!(recovered, "reset jobs interrupted by a previous run"),
        Err(err) => tracing::warn!(error = %err, "failed to recover job registry"),
    }

    tracing::info!(
        registry = %system.registry_path().display(),
        tick_secs = tick.as_secs(),
        "scheduler started"
    );

    let mut ticker = tokio::time::interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            () = &mut shutdown => {
                tracing::info!("shutdown requested");
                break;
            }
            _ = ticker.tick() => {
                let system = system.clone();
                let network = Arc::clone(&network);
                let dispatched = tokio::task::spawn_blocking(move || {
                    system.dispatch_due(Utc::now(), network.as_ref())
                })
                .await;

                match dispatched {
                    Ok(Ok(started)) if started.is_empty() => tracing::trace!("nothing due"),
                    Ok(Ok(started)) => tracing::info!(count = started.len(), "dispatched jobs"),
                    Ok(Err(err)) => tracing::warn!(error = %err, "dispatch failed"),
                    Err(err) => tracing::error!(error = %err, "dispatch task aborted"),
                }
            }
        }
    }
}

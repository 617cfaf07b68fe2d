//! Periodic reclamation of expired booking locks.
//!
//! Spawns the expiry sweep on a fixed interval using
//! `tokio::time::interval`. Runs until the cancellation token fires.
//! The sweep itself is single-flight across instances (advisory
//! lock), so running this task in every replica is safe.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use voyago_core::clock::Clock;
use voyago_db::DbPool;

use crate::config::EngineConfig;
use crate::engine::reaper;

/// Run the expiry reaper loop until `cancel` is triggered.
pub async fn run(
    pool: DbPool,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
    cancel: CancellationToken,
) {
    let interval_secs = config.reaper_interval_secs;
    tracing::info!(interval_secs, "Expiry reaper started");

    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Expiry reaper stopping");
                break;
            }
            _ = interval.tick() => {
                let now = clock.now();
                match reaper::sweep_once(&pool, now, config.default_capacity).await {
                    Ok(stats) if stats.skipped => {}
                    Ok(stats) => {
                        if stats.examined > 0 {
                            tracing::info!(
                                examined = stats.examined,
                                reaped = stats.reaped,
                                raced = stats.raced,
                                failed = stats.failed,
                                "Expiry sweep complete",
                            );
                        } else {
                            tracing::debug!("Expiry sweep: nothing to reap");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Expiry sweep failed");
                    }
                }
            }
        }
    }
}

//! Off-path model rebuilds.
//!
//! Builds are CPU-bound, so they run on tokio's blocking pool and only the
//! final pointer swap happens on the async side. Shutdown is a `watch`
//! signal raced against both the interval timer and the build in flight.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::recommender::{HybridRecommender, PreparedBuild};
use crate::responses::RebuildSummary;

async fn prepare_on_blocking_pool(recommender: &Arc<HybridRecommender>) -> Result<PreparedBuild> {
    let recommender = Arc::clone(recommender);
    tokio::task::spawn_blocking(move || recommender.prepare_rebuild())
        .await
        .context("Model rebuild task failed")
}

/// Rebuild on the blocking pool, then publish.
pub async fn rebuild_in_background(recommender: Arc<HybridRecommender>) -> Result<RebuildSummary> {
    let prepared = prepare_on_blocking_pool(&recommender).await?;
    Ok(recommender.publish(prepared))
}

/// Periodic rebuild loop running on its own tokio task
pub struct RebuildScheduler {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl RebuildScheduler {
    /// Start the loop: wait `interval`, rebuild, repeat.
    pub fn spawn(recommender: Arc<HybridRecommender>, interval: Duration) -> Self {
        let (shutdown, signal) = watch::channel(false);
        let handle = tokio::spawn(run(recommender, interval, signal));
        info!("Rebuild scheduler started (every {:?})", interval);
        Self { shutdown, handle }
    }

    /// Signal the loop and wait for it to exit.
    ///
    /// A build still running is abandoned and never published.
    pub async fn shutdown(self) {
        self.shutdown.send_replace(true);
        if let Err(e) = self.handle.await {
            error!("Rebuild scheduler task ended abnormally: {}", e);
        }
        info!("Rebuild scheduler stopped");
    }
}

async fn run(recommender: Arc<HybridRecommender>, interval: Duration, mut signal: watch::Receiver<bool>) {
    loop {
        tokio::select! {
            _ = signal.changed() => break,
            _ = tokio::time::sleep(interval) => {}
        }

        tokio::select! {
            _ = signal.changed() => {
                warn!("Shutdown during rebuild, discarding the build in flight");
                break;
            }
            prepared = prepare_on_blocking_pool(&recommender) => match prepared {
                Ok(prepared) => {
                    recommender.publish(prepared);
                }
                Err(e) => error!("Scheduled rebuild failed, retrying next interval: {:#}", e),
            },
        }
    }
}

//! Metrics polling loop
//!
//! One background task with two cadences: the normal interval while ticks
//! succeed, a longer backoff after a failed tick. A failure never stops
//! the loop; only the manager's shutdown signal does.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Timing knobs for the polling loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    /// Delay between ticks while everything is healthy.
    pub poll_interval: Duration,
    /// Delay before the next attempt after a failed tick.
    pub backoff_interval: Duration,
    /// Upper bound on one tab's process-id query, so a hung engine cannot
    /// stall the whole tick.
    pub pid_query_timeout: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            backoff_interval: Duration::from_secs(5),
            pid_query_timeout: Duration::from_millis(500),
        }
    }
}

/// One execution of the periodic metrics-gathering cycle.
#[async_trait]
pub(crate) trait Tick: Send {
    async fn run(&mut self) -> anyhow::Result<()>;
}

/// Drive `tick` until the shutdown signal arrives (or its sender is gone).
pub(crate) async fn run(
    mut tick: impl Tick,
    config: PollerConfig,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        let delay = match tick.run().await {
            Ok(()) => config.poll_interval,
            Err(error) => {
                tracing::warn!(%error, "metrics tick failed, backing off");
                config.backoff_interval
            }
        };

        tokio::select! {
            _ = shutdown.recv() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    tracing::debug!("metrics polling loop stopped");
}

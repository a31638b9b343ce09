//! Pass Scheduler - drives the task runner from a ticker
//!
//! One pass runs immediately, then one per tick. Passes are awaited to
//! completion on the calling task, so they can never overlap; a slow pass
//! simply delays the next tick.

use std::sync::Arc;

use tracing::info;

use super::runner::TaskRunner;
use super::shutdown::ShutdownToken;
use crate::port::Ticker;

/// Fixed-interval driver for `TaskRunner::run_pass`
pub struct PassScheduler {
    runner: Arc<TaskRunner>,
}

impl PassScheduler {
    pub fn new(runner: Arc<TaskRunner>) -> Self {
        Self { runner }
    }

    /// Run passes until `shutdown` fires
    ///
    /// Returns the number of passes executed. The first pass always runs;
    /// shutdown is only observed between passes.
    pub async fn run<T: Ticker>(&self, mut ticker: T, mut shutdown: ShutdownToken) -> u64 {
        info!(
            interval_secs = self.runner.config().update_interval().as_secs(),
            tasks = self.runner.config().tasks().len(),
            "Pass scheduler started"
        );

        self.runner.run_pass().await;
        let mut passes = 1u64;

        loop {
            tokio::select! {
                biased;
                _ = ticker.tick() => {
                    self.runner.run_pass().await;
                    passes += 1;
                }
                _ = shutdown.wait() => {
                    info!("Pass scheduler interrupted");
                    break;
                }
            }
        }

        info!(passes, "Pass scheduler stopped");
        passes
    }
}

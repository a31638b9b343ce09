// Ticker Port
// Fixed-interval trigger for passes; lives outside the task runner

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// Source of pass triggers
#[async_trait]
pub trait Ticker: Send {
    /// Wait until the next pass is due
    async fn tick(&mut self);
}

/// Production ticker backed by `tokio::time::interval`.
///
/// The first tick fires one period after creation (the initial pass is run
/// by the scheduler itself). A pass that overruns the period delays the next
/// tick instead of bursting to catch up.
pub struct IntervalTicker {
    interval: Interval,
}

impl IntervalTicker {
    pub fn new(period: Duration) -> Self {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }
}

#[async_trait]
impl Ticker for IntervalTicker {
    async fn tick(&mut self) {
        self.interval.tick().await;
    }
}

pub mod mocks {
    use super::*;
    use tokio::sync::mpsc;

    /// Handle used by tests to fire ticks
    #[derive(Clone)]
    pub struct TickSender {
        tx: mpsc::UnboundedSender<()>,
    }

    impl TickSender {
        pub fn tick(&self) {
            let _ = self.tx.send(());
        }
    }

    /// Ticker that fires only when a test asks it to
    pub struct ManualTicker {
        rx: mpsc::UnboundedReceiver<()>,
    }

    impl ManualTicker {
        pub fn channel() -> (TickSender, Self) {
            let (tx, rx) = mpsc::unbounded_channel();
            (TickSender { tx }, Self { rx })
        }
    }

    #[async_trait]
    impl Ticker for ManualTicker {
        async fn tick(&mut self) {
            if self.rx.recv().await.is_none() {
                // All senders dropped: never tick again
                std::future::pending::<()>().await;
            }
        }
    }
}

//! Fixed-period cycle scheduler.
//!
//! Runs one cycle immediately, then one per period, strictly one at a
//! time. Cancellation is only observed between cycles, so a cycle in
//! progress always drains before the scheduler returns.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::engine::DetectionEngine;

pub struct Scheduler {
    engine: DetectionEngine,
    period: Duration,
}

impl Scheduler {
    pub fn new(engine: DetectionEngine, period: Duration) -> Self {
        Self { engine, period }
    }

    /// Run cycles until `cancel` fires. Returns the number of cycles run.
    pub async fn run(self, cancel: CancellationToken) -> u64 {
        let mut ticker = tokio::time::interval(self.period);
        // A cycle that overruns the period pushes the next one back rather
        // than triggering a catch-up burst.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut cycles: u64 = 0;

        tracing::info!(period_secs = self.period.as_secs_f64(), "Scheduler started");

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!(cycles, "Scheduler stopping");
                    break;
                }
                _ = ticker.tick() => {
                    self.engine.run_cycle().await;
                    cycles += 1;
                }
            }
        }

        cycles
    }
}

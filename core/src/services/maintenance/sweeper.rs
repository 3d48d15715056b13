//! Periodic eviction of expired challenges and elapsed rate windows
//!
//! Lazy expiry on every read path is what keeps verification correct; the
//! sweep only bounds memory for phones that never come back.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::services::clock::Clock;
use crate::services::verification::{ChallengeStore, IssuanceRateLimiter};

/// Summary of one sweep pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    /// Expired challenges evicted
    pub challenges_purged: usize,
    /// Elapsed rate windows dropped
    pub windows_purged: usize,
    /// Failures encountered; the pass continues past them
    pub errors: Vec<String>,
}

impl SweepReport {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn total_purged(&self) -> usize {
        self.challenges_purged + self.windows_purged
    }
}

/// Runs `purge_expired` on the store and the limiter
pub struct ExpirySweeper {
    store: Arc<dyn ChallengeStore>,
    limiter: Arc<dyn IssuanceRateLimiter>,
    clock: Arc<dyn Clock>,
    interval: Duration,
}

impl ExpirySweeper {
    pub fn new(
        store: Arc<dyn ChallengeStore>,
        limiter: Arc<dyn IssuanceRateLimiter>,
        clock: Arc<dyn Clock>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            limiter,
            clock,
            interval,
        }
    }

    /// Run a single sweep
    pub async fn sweep_once(&self) -> SweepReport {
        let now = self.clock.now();
        let mut report = SweepReport::default();

        match self.store.purge_expired(now).await {
            Ok(count) => report.challenges_purged = count,
            Err(e) => {
                error!(event = "sweep_failed", target_state = "challenges", error = %e, "Challenge sweep failed");
                report.errors.push(format!("challenge sweep: {}", e));
            }
        }

        match self.limiter.purge_expired(now).await {
            Ok(count) => report.windows_purged = count,
            Err(e) => {
                error!(event = "sweep_failed", target_state = "rate_windows", error = %e, "Rate window sweep failed");
                report.errors.push(format!("rate window sweep: {}", e));
            }
        }

        if report.total_purged() > 0 {
            info!(
                event = "sweep_completed",
                challenges = report.challenges_purged,
                windows = report.windows_purged,
                "Expired state evicted"
            );
        } else {
            debug!(event = "sweep_completed", "Nothing to evict");
        }

        report
    }

    /// Start sweeping on a tokio interval
    ///
    /// The first tick fires immediately. Abort the returned handle to stop.
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                event = "sweeper_started",
                interval_seconds = self.interval.as_secs(),
                "Expiry sweeper started"
            );

            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                self.sweep_once().await;
            }
        })
    }
}

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::checker::ListChecker;

/// Periodically reloads the list snapshot.
pub struct ListReloader {
    checker: Arc<ListChecker>,
    check_interval: Duration,
}

impl ListReloader {
    pub fn new(checker: Arc<ListChecker>, check_interval: Duration) -> Self {
        ListReloader {
            checker,
            check_interval,
        }
    }

    /// Start the reload loop.
    ///
    /// Returns `None` when the interval is zero: lists then only change on
    /// an explicit reload request.
    pub fn start(self) -> Option<tokio::task::JoinHandle<()>> {
        if self.check_interval.is_zero() {
            info!("Periodic list reload disabled");
            return None;
        }

        let handle = tokio::spawn(async move {
            let mut ticker = interval(self.check_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; the initial load already ran
            ticker.tick().await;

            loop {
                ticker.tick().await;

                // Failures are logged by the checker and keep the old snapshot
                let checker = self.checker.clone();
                match tokio::task::spawn_blocking(move || checker.reload()).await {
                    Ok(Ok(summary)) => {
                        debug!(generation = summary.generation, "Periodic list reload")
                    }
                    Ok(Err(_)) => {}
                    Err(e) => warn!(error = %e, "List reload task failed"),
                }
            }
        });

        Some(handle)
    }
}

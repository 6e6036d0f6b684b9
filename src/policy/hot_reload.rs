use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::interval;
use tracing::{error, info, warn};

use crate::domain::ScoringPolicy;

use super::loader::{PolicyError, PolicyLoader};

/// Watch for policy changes and broadcast updates.
pub struct PolicyWatcher {
    loader: PolicyLoader,
    check_interval: Duration,
    last_version: Option<String>,
}

impl PolicyWatcher {
    /// Create a new policy watcher.
    pub fn new(loader: PolicyLoader, check_interval: Duration) -> Self {
        PolicyWatcher {
            loader,
            check_interval,
            last_version: None,
        }
    }

    /// Start watching for policy changes.
    ///
    /// Returns a receiver that will receive new policies when the version
    /// changes. A failed initial load publishes an empty policy; a failed
    /// reload keeps the current one.
    pub fn start(
        mut self,
    ) -> (
        watch::Receiver<Arc<ScoringPolicy>>,
        tokio::task::JoinHandle<()>,
    ) {
        let initial = match self.loader.load() {
            Ok(policy) => {
                self.last_version = Some(policy.version.clone());
                info!(
                    version = %policy.version,
                    rules = policy.rules.len(),
                    active = policy.active_count(),
                    "Loaded initial scoring policy"
                );
                Arc::new(policy)
            }
            Err(e) => {
                error!(path = self.loader.policy_path(), error = %e, "Failed to load initial scoring policy");
                Arc::new(ScoringPolicy::empty())
            }
        };

        let (tx, rx) = watch::channel(initial);

        let handle = tokio::spawn(async move {
            if self.check_interval.is_zero() {
                return;
            }

            let mut interval = interval(self.check_interval);

            loop {
                interval.tick().await;

                match self.check_for_updates(&tx) {
                    Ok(true) => info!("Scoring policy reloaded successfully"),
                    Ok(false) => {} // No changes
                    Err(e) => warn!("Error checking for policy updates: {}", e),
                }
            }
        });

        (rx, handle)
    }

    /// Check for policy updates and broadcast if the version changed.
    fn check_for_updates(
        &mut self,
        tx: &watch::Sender<Arc<ScoringPolicy>>,
    ) -> Result<bool, PolicyError> {
        let policy = self.loader.load()?;

        if self.last_version.as_ref() == Some(&policy.version) {
            return Ok(false);
        }

        info!(
            "Policy version changed: {:?} -> {}",
            self.last_version, policy.version
        );

        self.last_version = Some(policy.version.clone());
        let _ = tx.send(Arc::new(policy));

        Ok(true)
    }
}

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::domain::ListFlags;
use crate::observability::MetricsRegistry;

use super::snapshot::{ListSnapshot, SnapshotCounts};
use super::source::{ListSource, ListSourceError};

/// Summary of a successful reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadSummary {
    pub generation: u64,
    pub counts: SnapshotCounts,
}

/// Screens identifiers against the active list snapshot.
///
/// Lookups read the snapshot through a lock-free pointer; reloads build a
/// complete snapshot on the side and publish it with one atomic store, so a
/// lookup sees either the old or the new snapshot, never a mix.
pub struct ListChecker {
    source: Arc<dyn ListSource>,
    current: ArcSwap<ListSnapshot>,
    /// Serializes reloads so generations are published in order
    reload_lock: Mutex<u64>,
    metrics: Arc<MetricsRegistry>,
}

impl ListChecker {
    /// Create a checker with an empty snapshot. Nothing is loaded yet.
    pub fn new(source: Arc<dyn ListSource>) -> Self {
        ListChecker {
            source,
            current: ArcSwap::from_pointee(ListSnapshot::empty()),
            reload_lock: Mutex::new(0),
            metrics: Arc::new(MetricsRegistry::new()),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Create a checker and perform the initial load.
    ///
    /// A failed initial load is logged and leaves the empty snapshot active;
    /// lookups then report every flag as false.
    pub fn load(source: Arc<dyn ListSource>, metrics: Arc<MetricsRegistry>) -> Self {
        let checker = ListChecker::new(source).with_metrics(metrics);
        if let Err(e) = checker.reload() {
            warn!(error = %e, "Starting with empty lists");
        }
        checker
    }

    /// Report membership of each identifier in its lists.
    ///
    /// Never fails: with no loaded snapshot all flags are false.
    pub fn check(&self, customer_id: &str, ip: &str, device_id: &str) -> ListFlags {
        let snapshot = self.current.load();
        let flags = snapshot.check(customer_id, ip, device_id);

        debug!(
            customer_id = customer_id,
            ip = ip,
            device_id = device_id,
            generation = snapshot.generation,
            customer_permissive = flags.customer_permissive,
            customer_restrictive = flags.customer_restrictive,
            ip_restrictive = flags.ip_restrictive,
            device_restrictive = flags.device_restrictive,
            "Lists checked"
        );

        flags
    }

    /// Replace the active snapshot with freshly loaded data.
    ///
    /// On failure the current snapshot stays active untouched.
    pub fn reload(&self) -> Result<ReloadSummary, ListSourceError> {
        let mut generation = self.reload_lock.lock();

        let data = match self.source.load() {
            Ok(data) => data,
            Err(e) => {
                self.metrics.record_list_reload(false);
                error!(
                    source = %self.source.describe(),
                    error = %e,
                    active_generation = *generation,
                    "Failed to reload lists, keeping current snapshot"
                );
                return Err(e);
            }
        };

        let next = *generation + 1;
        let snapshot = ListSnapshot::from_data(data, next);

        let conflicts = snapshot.conflicting_customers();
        if !conflicts.is_empty() {
            warn!(
                count = conflicts.len(),
                "Customers present on both permissive and restrictive lists"
            );
        }

        let counts = snapshot.counts();
        self.current.store(Arc::new(snapshot));
        *generation = next;
        self.metrics.record_list_reload(true);

        info!(
            source = %self.source.describe(),
            generation = next,
            cpf_permissive = counts.customer_permissive,
            cpf_restrictive = counts.customer_restrictive,
            ip_restrictive = counts.ip_restrictive,
            device_restrictive = counts.device_restrictive,
            "Lists reloaded"
        );

        Ok(ReloadSummary {
            generation: next,
            counts,
        })
    }

    /// The snapshot currently in use.
    pub fn snapshot(&self) -> Arc<ListSnapshot> {
        self.current.load_full()
    }
}

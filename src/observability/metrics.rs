use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::domain::Decision;

/// Metrics registry for the application.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Total risk analyses processed
    pub analyses_total: AtomicU64,

    /// Analyses by outcome
    pub analyses_approved: AtomicU64,
    pub analyses_denied: AtomicU64,

    /// Analyses rejected by input validation
    pub validation_rejections: AtomicU64,

    /// Fallbacks applied at the orchestrator boundary
    pub list_check_fallbacks: AtomicU64,
    pub scoring_fallbacks: AtomicU64,

    /// Analysis latency buckets
    pub latency_under_1ms: AtomicU64,
    pub latency_1_5ms: AtomicU64,
    pub latency_5_10ms: AtomicU64,
    pub latency_10_50ms: AtomicU64,
    pub latency_50_100ms: AtomicU64,
    pub latency_over_100ms: AtomicU64,

    /// Rule evaluation counts
    pub rules_evaluated_total: AtomicU64,
    pub rules_matched_total: AtomicU64,
    pub rules_skipped_total: AtomicU64,

    /// List snapshot reloads
    pub list_reloads_total: AtomicU64,
    pub list_reload_errors: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry.
    pub fn new() -> Self {
        MetricsRegistry::default()
    }

    /// Record an analysis outcome.
    pub fn record_decision(&self, decision: Decision) {
        self.analyses_total.fetch_add(1, Ordering::Relaxed);

        match decision {
            Decision::Approved => {
                self.analyses_approved.fetch_add(1, Ordering::Relaxed);
            }
            Decision::Denied => {
                self.analyses_denied.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn record_validation_rejection(&self) {
        self.validation_rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_list_check_fallback(&self) {
        self.list_check_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_scoring_fallback(&self) {
        self.scoring_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    /// Record analysis latency.
    pub fn record_latency(&self, start: Instant) {
        let micros = start.elapsed().as_micros() as u64;

        if micros < 1000 {
            self.latency_under_1ms.fetch_add(1, Ordering::Relaxed);
        } else if micros < 5000 {
            self.latency_1_5ms.fetch_add(1, Ordering::Relaxed);
        } else if micros < 10000 {
            self.latency_5_10ms.fetch_add(1, Ordering::Relaxed);
        } else if micros < 50000 {
            self.latency_10_50ms.fetch_add(1, Ordering::Relaxed);
        } else if micros < 100000 {
            self.latency_50_100ms.fetch_add(1, Ordering::Relaxed);
        } else {
            self.latency_over_100ms.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record the outcome of evaluating one rule.
    pub fn record_rule_evaluation(&self, outcome: RuleOutcome) {
        self.rules_evaluated_total.fetch_add(1, Ordering::Relaxed);
        match outcome {
            RuleOutcome::Matched => {
                self.rules_matched_total.fetch_add(1, Ordering::Relaxed);
            }
            RuleOutcome::Skipped => {
                self.rules_skipped_total.fetch_add(1, Ordering::Relaxed);
            }
            RuleOutcome::NotMatched => {}
        }
    }

    /// Record a list reload.
    pub fn record_list_reload(&self, success: bool) {
        self.list_reloads_total.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.list_reload_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Export metrics in Prometheus format.
    pub fn to_prometheus(&self) -> String {
        format!(
            r#"# HELP riskgate_analyses_total Total number of risk analyses
# TYPE riskgate_analyses_total counter
riskgate_analyses_total {}

# HELP riskgate_analyses Risk analyses by decision
# TYPE riskgate_analyses counter
riskgate_analyses{{decision="approved"}} {}
riskgate_analyses{{decision="denied"}} {}

# HELP riskgate_validation_rejections_total Analyses denied by input validation
# TYPE riskgate_validation_rejections_total counter
riskgate_validation_rejections_total {}

# HELP riskgate_fallbacks_total Dependency failures replaced by a fallback value
# TYPE riskgate_fallbacks_total counter
riskgate_fallbacks_total{{dependency="lists"}} {}
riskgate_fallbacks_total{{dependency="scoring"}} {}

# HELP riskgate_analysis_latency_bucket Analysis latency histogram
# TYPE riskgate_analysis_latency_bucket counter
riskgate_analysis_latency_bucket{{le="0.001"}} {}
riskgate_analysis_latency_bucket{{le="0.005"}} {}
riskgate_analysis_latency_bucket{{le="0.01"}} {}
riskgate_analysis_latency_bucket{{le="0.05"}} {}
riskgate_analysis_latency_bucket{{le="0.1"}} {}
riskgate_analysis_latency_bucket{{le="+Inf"}} {}

# HELP riskgate_rules_evaluated_total Total rule evaluations
# TYPE riskgate_rules_evaluated_total counter
riskgate_rules_evaluated_total {}

# HELP riskgate_rules_matched_total Rules whose condition held
# TYPE riskgate_rules_matched_total counter
riskgate_rules_matched_total {}

# HELP riskgate_rules_skipped_total Rules skipped because their condition could not be read
# TYPE riskgate_rules_skipped_total counter
riskgate_rules_skipped_total {}

# HELP riskgate_list_reloads_total List snapshot reload attempts
# TYPE riskgate_list_reloads_total counter
riskgate_list_reloads_total {}

# HELP riskgate_list_reload_errors_total Failed list snapshot reloads
# TYPE riskgate_list_reload_errors_total counter
riskgate_list_reload_errors_total {}
"#,
            self.analyses_total.load(Ordering::Relaxed),
            self.analyses_approved.load(Ordering::Relaxed),
            self.analyses_denied.load(Ordering::Relaxed),
            self.validation_rejections.load(Ordering::Relaxed),
            self.list_check_fallbacks.load(Ordering::Relaxed),
            self.scoring_fallbacks.load(Ordering::Relaxed),
            self.latency_under_1ms.load(Ordering::Relaxed),
            self.latency_1_5ms.load(Ordering::Relaxed),
            self.latency_5_10ms.load(Ordering::Relaxed),
            self.latency_10_50ms.load(Ordering::Relaxed),
            self.latency_50_100ms.load(Ordering::Relaxed),
            self.latency_over_100ms.load(Ordering::Relaxed),
            self.rules_evaluated_total.load(Ordering::Relaxed),
            self.rules_matched_total.load(Ordering::Relaxed),
            self.rules_skipped_total.load(Ordering::Relaxed),
            self.list_reloads_total.load(Ordering::Relaxed),
            self.list_reload_errors.load(Ordering::Relaxed),
        )
    }
}

/// Result of evaluating a single rule, as counted by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOutcome {
    Matched,
    NotMatched,
    /// Condition could not be interpreted; the rule contributed nothing
    Skipped,
}

/// Guard for timing operations.
pub struct TimingGuard<'a> {
    registry: &'a MetricsRegistry,
    start: Instant,
}

impl<'a> TimingGuard<'a> {
    pub fn new(registry: &'a MetricsRegistry) -> Self {
        TimingGuard {
            registry,
            start: Instant::now(),
        }
    }
}

impl<'a> Drop for TimingGuard<'a> {
    fn drop(&mut self) {
        self.registry.record_latency(self.start);
    }
}

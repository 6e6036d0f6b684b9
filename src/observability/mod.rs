pub mod metrics;
pub mod tracing;

pub use metrics::{MetricsRegistry, RuleOutcome, TimingGuard};
pub use tracing::{init_test_tracing, init_tracing};

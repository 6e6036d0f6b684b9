pub mod analysis;
pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod lists;
pub mod observability;
pub mod policy;
pub mod rules;
pub mod storage;

pub use analysis::{DecisionPolicy, RiskAnalyzer};
pub use config::Config;
pub use domain::{Decision, RiskScore, Rule, TransactionAttributes};
pub use lists::ListChecker;
pub use rules::{RuleEvaluator, ScoringService};

pub mod condition;
pub mod evaluator;
pub mod scoring;

pub use condition::{Condition, ConditionError};
pub use evaluator::{Evaluation, RuleEvaluator};
pub use scoring::{select_applicable, ScoringError, ScoringService};

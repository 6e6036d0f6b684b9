use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::{RiskScore, Rule, RuleId, TransactionContext};
use crate::observability::{MetricsRegistry, RuleOutcome};

use super::condition::Condition;
use super::scoring::ScoringError;

/// Per-rule breakdown of one evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    /// Rules whose condition held
    pub matched: Vec<RuleId>,
    /// Rules skipped because their condition could not be read
    pub skipped: Vec<RuleId>,
    /// Raw sum of matched points, before the floor is applied
    pub total: i64,
}

impl Evaluation {
    pub fn score(&self) -> RiskScore {
        RiskScore::from_total(self.total)
    }
}

/// Scores a transaction context against a set of rules.
///
/// The evaluator decides activation and condition outcomes only. Which
/// rules are passed in is the caller's choice, and any set is tolerated.
/// Rules are independent: the score is the sum of matched points, so the
/// order of `rules` never matters.
#[derive(Debug, Clone)]
pub struct RuleEvaluator {
    metrics: Arc<MetricsRegistry>,
}

impl Default for RuleEvaluator {
    fn default() -> Self {
        RuleEvaluator::new(Arc::new(MetricsRegistry::new()))
    }
}

impl RuleEvaluator {
    pub fn new(metrics: Arc<MetricsRegistry>) -> Self {
        RuleEvaluator { metrics }
    }

    /// Compute the risk score, floored at 1.
    ///
    /// Fails fast, before any rule runs, when the transaction has no type or
    /// a missing/non-positive value.
    pub fn evaluate(
        &self,
        ctx: &TransactionContext,
        rules: &[Rule],
    ) -> Result<RiskScore, ScoringError> {
        self.evaluate_detailed(ctx, rules).map(|e| e.score())
    }

    /// Same as [`RuleEvaluator::evaluate`], keeping the per-rule breakdown.
    pub fn evaluate_detailed(
        &self,
        ctx: &TransactionContext,
        rules: &[Rule],
    ) -> Result<Evaluation, ScoringError> {
        ctx.attributes.validate_for_scoring()?;

        let mut evaluation = Evaluation::default();

        for rule in rules.iter().filter(|r| r.active) {
            match Condition::parse(&rule.condition) {
                Ok(condition) => {
                    if let Condition::Unknown(kind) = &condition {
                        warn!(rule_id = %rule.id, rule = %rule.name, kind = %kind, "Unknown condition type");
                    }

                    if condition.evaluate(ctx) {
                        evaluation.total += i64::from(rule.points);
                        evaluation.matched.push(rule.id);
                        self.metrics.record_rule_evaluation(RuleOutcome::Matched);
                        debug!(
                            rule_id = %rule.id,
                            rule = %rule.name,
                            condition = %condition,
                            points = rule.points,
                            total = evaluation.total,
                            "Rule matched"
                        );
                    } else {
                        self.metrics.record_rule_evaluation(RuleOutcome::NotMatched);
                    }
                }
                Err(e) => {
                    evaluation.skipped.push(rule.id);
                    self.metrics.record_rule_evaluation(RuleOutcome::Skipped);
                    warn!(rule_id = %rule.id, rule = %rule.name, error = %e, "Skipping rule with unreadable condition");
                }
            }
        }

        debug!(
            tx_type = ctx.tx_type(),
            rules = rules.len(),
            matched = evaluation.matched.len(),
            skipped = evaluation.skipped.len(),
            total = evaluation.total,
            score = %evaluation.score(),
            "Rules evaluated"
        );

        Ok(evaluation)
    }
}

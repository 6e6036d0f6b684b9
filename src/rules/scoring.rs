use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error};

use crate::domain::{
    applicable_tx_types, ListFlags, RiskScore, Rule, TransactionAttributes, TransactionContext,
    ValidationError,
};
use crate::storage::RuleStore;

use super::evaluator::RuleEvaluator;

/// Reasons a score could not be computed.
#[derive(Error, Debug)]
pub enum ScoringError {
    #[error("invalid transaction: {0}")]
    Invalid(#[from] ValidationError),

    #[error("rule store query failed: {0}")]
    RuleStore(anyhow::Error),
}

/// Computes risk scores against the rules of a [`RuleStore`].
#[derive(Clone)]
pub struct ScoringService {
    store: Arc<dyn RuleStore>,
    evaluator: RuleEvaluator,
}

impl ScoringService {
    pub fn new(store: Arc<dyn RuleStore>, evaluator: RuleEvaluator) -> Self {
        ScoringService { store, evaluator }
    }

    /// Score a transaction given its list flags.
    ///
    /// Only active rules of type `DEFAULT` or the transaction's own type
    /// take part, whatever the store returns.
    pub async fn calculate_score(
        &self,
        attributes: &TransactionAttributes,
        flags: ListFlags,
    ) -> Result<RiskScore, ScoringError> {
        attributes.validate_for_scoring()?;

        let tx_types = applicable_tx_types(&attributes.tx_type);
        let rules = self
            .store
            .list_active_rules_for(&tx_types)
            .await
            .map_err(|e| {
                error!(tx_type = %attributes.tx_type, store = %self.store.describe(), error = %e, "Rule query failed");
                ScoringError::RuleStore(e)
            })?;

        let rules = select_applicable(rules, &attributes.tx_type);
        let ctx = TransactionContext::new(attributes.clone(), flags);
        let score = self.evaluator.evaluate(&ctx, &rules)?;

        debug!(
            customer_id = %attributes.customer_id,
            tx_type = %attributes.tx_type,
            rules = rules.len(),
            score = %score,
            "Score calculated"
        );

        Ok(score)
    }

    pub fn store(&self) -> &Arc<dyn RuleStore> {
        &self.store
    }
}

/// Keep only the active rules selected for `tx_type`.
pub fn select_applicable(rules: Vec<Rule>, tx_type: &str) -> Vec<Rule> {
    rules
        .into_iter()
        .filter(|r| r.active && r.applies_to(tx_type))
        .collect()
}

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;

use crate::domain::{Rule, ScoringPolicy};

/// Source of scoring rules.
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Active rules whose transaction type is one of `tx_types`.
    async fn list_active_rules_for(&self, tx_types: &[String]) -> anyhow::Result<Vec<Rule>>;

    /// Short label used in logs and readiness output.
    fn describe(&self) -> String;
}

/// Rule store backed by the hot-reloaded YAML policy.
///
/// Every query reads the latest published policy, so a reload takes
/// effect on the next request.
pub struct PolicyRuleStore {
    policy: watch::Receiver<Arc<ScoringPolicy>>,
}

impl PolicyRuleStore {
    pub fn new(policy: watch::Receiver<Arc<ScoringPolicy>>) -> Self {
        PolicyRuleStore { policy }
    }

    /// Version of the policy currently served.
    pub fn version(&self) -> String {
        self.policy.borrow().version.clone()
    }
}

#[async_trait]
impl RuleStore for PolicyRuleStore {
    async fn list_active_rules_for(&self, tx_types: &[String]) -> anyhow::Result<Vec<Rule>> {
        let policy = self.policy.borrow().clone();
        Ok(policy.active_rules_for(tx_types).cloned().collect())
    }

    fn describe(&self) -> String {
        format!("policy {}", self.version())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{applicable_tx_types, RuleId};

    fn policy(version: &str, yaml_rules: &str) -> ScoringPolicy {
        serde_yaml::from_str(&format!(
            "policy_version: \"{}\"\nrules:\n{}",
            version, yaml_rules
        ))
        .unwrap()
    }

    #[tokio::test]
    async fn test_reads_latest_policy() {
        let (tx, rx) = watch::channel(Arc::new(policy(
            "v1",
            "  - { id: 1, name: a, tx_type: DEFAULT, condition: { type: cpf_restrictive_list }, points: 800 }\n",
        )));
        let store = PolicyRuleStore::new(rx);
        let types = applicable_tx_types("PIX");

        let rules = store.list_active_rules_for(&types).await.unwrap();
        assert_eq!(rules.len(), 1);

        tx.send(Arc::new(policy(
            "v2",
            "  - { id: 1, name: a, tx_type: DEFAULT, condition: { type: cpf_restrictive_list }, points: 800 }\n  - { id: 2, name: b, tx_type: PIX, condition: { type: ip_restrictive_list }, points: 300 }\n  - { id: 3, name: c, tx_type: TED, condition: { type: ip_restrictive_list }, points: 300 }\n",
        )))
        .unwrap();

        let ids: Vec<RuleId> = store
            .list_active_rules_for(&types)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![RuleId(1), RuleId(2)]);
        assert_eq!(store.describe(), "policy v2");
    }
}

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::domain::Rule;

use super::traits::RuleStore;

/// In-memory rule store for testing.
#[derive(Debug, Default)]
pub struct MockRuleStore {
    rules: Mutex<Vec<Rule>>,
    fail: AtomicBool,
    queries: Mutex<Vec<Vec<String>>>,
    query_count: AtomicUsize,
}

impl MockRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: Vec<Rule>) -> Self {
        let store = Self::default();
        *store.rules.lock() = rules;
        store
    }

    /// Add a rule (for testing).
    pub fn add_rule(&self, rule: Rule) {
        self.rules.lock().push(rule);
    }

    /// Make every query fail (for testing).
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::Relaxed);
    }

    /// Type sets of the queries seen so far (for assertions).
    pub fn get_queries(&self) -> Vec<Vec<String>> {
        self.queries.lock().clone()
    }

    pub fn query_count(&self) -> usize {
        self.query_count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl RuleStore for MockRuleStore {
    async fn list_active_rules_for(&self, tx_types: &[String]) -> anyhow::Result<Vec<Rule>> {
        self.query_count.fetch_add(1, Ordering::Relaxed);
        self.queries.lock().push(tx_types.to_vec());

        if self.fail.load(Ordering::Relaxed) {
            anyhow::bail!("rule store unavailable");
        }

        Ok(self
            .rules
            .lock()
            .iter()
            .filter(|r| r.active && tx_types.contains(&r.tx_type))
            .cloned()
            .collect())
    }

    fn describe(&self) -> String {
        "mock".to_string()
    }
}

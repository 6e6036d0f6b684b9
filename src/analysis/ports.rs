use async_trait::async_trait;

use crate::domain::{ListFlags, RiskScore, TransactionAttributes};

/// Screening-list lookup, local or remote.
#[async_trait]
pub trait ListsPort: Send + Sync {
    async fn check_lists(&self, attributes: &TransactionAttributes) -> anyhow::Result<ListFlags>;
}

/// Score calculation, local or remote.
#[async_trait]
pub trait ScoringPort: Send + Sync {
    async fn calculate_score(
        &self,
        attributes: &TransactionAttributes,
        flags: ListFlags,
    ) -> anyhow::Result<RiskScore>;
}

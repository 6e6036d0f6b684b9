use async_trait::async_trait;

use crate::domain::{ListFlags, RiskScore, TransactionAttributes};
use crate::lists::ListChecker;
use crate::rules::ScoringService;

use super::ports::{ListsPort, ScoringPort};

#[async_trait]
impl ListsPort for ListChecker {
    async fn check_lists(&self, attributes: &TransactionAttributes) -> anyhow::Result<ListFlags> {
        Ok(self.check(
            &attributes.customer_id,
            &attributes.ip,
            &attributes.device_id,
        ))
    }
}

#[async_trait]
impl ScoringPort for ScoringService {
    async fn calculate_score(
        &self,
        attributes: &TransactionAttributes,
        flags: ListFlags,
    ) -> anyhow::Result<RiskScore> {
        Ok(ScoringService::calculate_score(self, attributes, flags).await?)
    }
}

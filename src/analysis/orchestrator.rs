use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::domain::{Decision, ListFlags, RiskScore, TransactionAttributes};
use crate::observability::MetricsRegistry;

use super::ports::{ListsPort, ScoringPort};

/// Thresholds and substitutions used to reach a decision.
#[derive(Debug, Clone, Copy)]
pub struct DecisionPolicy {
    /// Highest score still approved
    pub medium_risk_max_score: u32,
    /// Score used when no score could be obtained
    pub fallback_score: RiskScore,
    /// Bound on each downstream call
    pub call_timeout: Duration,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        DecisionPolicy {
            medium_risk_max_score: 699,
            fallback_score: RiskScore::new(500),
            call_timeout: Duration::from_millis(2000),
        }
    }
}

impl DecisionPolicy {
    pub fn decide(&self, score: RiskScore) -> Decision {
        if score.is_high_risk(self.medium_risk_max_score) {
            Decision::Denied
        } else {
            Decision::Approved
        }
    }
}

/// Trace of one analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub decision: Decision,
    /// `None` when validation rejected the transaction
    pub score: Option<RiskScore>,
    pub flags: Option<ListFlags>,
    pub list_fallback: bool,
    pub score_fallback: bool,
}

impl Analysis {
    fn rejected() -> Self {
        Analysis {
            decision: Decision::Denied,
            score: None,
            flags: None,
            list_fallback: false,
            score_fallback: false,
        }
    }
}

/// Runs the validate, screen, score, decide pipeline for one transaction.
///
/// Stateless across requests. Every failure resolves to a decision:
/// invalid input is denied, a failed list check continues with no flags
/// set, a failed score uses the policy's fallback score.
#[derive(Clone)]
pub struct RiskAnalyzer {
    lists: Arc<dyn ListsPort>,
    scoring: Arc<dyn ScoringPort>,
    policy: DecisionPolicy,
    metrics: Arc<MetricsRegistry>,
}

impl RiskAnalyzer {
    pub fn new(
        lists: Arc<dyn ListsPort>,
        scoring: Arc<dyn ScoringPort>,
        policy: DecisionPolicy,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        RiskAnalyzer {
            lists,
            scoring,
            policy,
            metrics,
        }
    }

    pub fn policy(&self) -> &DecisionPolicy {
        &self.policy
    }

    pub async fn analyze(&self, attributes: &TransactionAttributes) -> Decision {
        self.analyze_detailed(attributes).await.decision
    }

    pub async fn analyze_detailed(&self, attributes: &TransactionAttributes) -> Analysis {
        let start = Instant::now();
        let analysis_id = Uuid::new_v4();
        let analysis = self
            .run(attributes)
            .instrument(info_span!("analysis", id = %analysis_id))
            .await;

        self.metrics.record_decision(analysis.decision);
        self.metrics.record_latency(start);

        info!(
            analysis_id = %analysis_id,
            customer_id = %attributes.customer_id,
            tx_type = %attributes.tx_type,
            score = analysis.score.map(|s| s.value()),
            decision = %analysis.decision,
            list_fallback = analysis.list_fallback,
            score_fallback = analysis.score_fallback,
            latency_ms = start.elapsed().as_millis() as u64,
            "Risk analysis completed"
        );

        analysis
    }

    async fn run(&self, attributes: &TransactionAttributes) -> Analysis {
        if let Err(e) = attributes.validate() {
            warn!(customer_id = %attributes.customer_id, error = %e, "Transaction rejected");
            self.metrics.record_validation_rejection();
            return Analysis::rejected();
        }

        let (flags, list_fallback) =
            match bounded(self.policy.call_timeout, self.lists.check_lists(attributes)).await {
                Ok(flags) => (flags, false),
                Err(e) => {
                    warn!(customer_id = %attributes.customer_id, error = %e, "List check failed, continuing without list data");
                    self.metrics.record_list_check_fallback();
                    (ListFlags::none(), true)
                }
            };

        let (score, score_fallback) = match bounded(
            self.policy.call_timeout,
            self.scoring.calculate_score(attributes, flags),
        )
        .await
        {
            Ok(score) => (score, false),
            Err(e) => {
                warn!(
                    customer_id = %attributes.customer_id,
                    fallback_score = %self.policy.fallback_score,
                    error = %e,
                    "Scoring failed, using fallback score"
                );
                self.metrics.record_scoring_fallback();
                (self.policy.fallback_score, true)
            }
        };

        Analysis {
            decision: self.policy.decide(score),
            score: Some(score),
            flags: Some(flags),
            list_fallback,
            score_fallback,
        }
    }
}

async fn bounded<T>(
    limit: Duration,
    call: impl Future<Output = anyhow::Result<T>>,
) -> anyhow::Result<T> {
    match timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(anyhow::anyhow!("timed out after {:?}", limit)),
    }
}

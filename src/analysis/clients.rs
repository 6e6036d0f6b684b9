use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

use crate::api::{ListsCheckRequest, ListsCheckResponse, ScoreRequest, ScoreResponse};
use crate::auth::{AuthError, ServiceTokens, RISK_ANALYSIS_SERVICE};
use crate::domain::{ListFlags, RiskScore, TransactionAttributes};

use super::ports::{ListsPort, ScoringPort};

/// Failures of an outbound service call.
///
/// The orchestrator treats all of them alike, as an unreachable service.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("service rejected our credentials")]
    Unauthorized,

    #[error("service responded with status {0}")]
    Status(StatusCode),

    #[error("could not sign service token: {0}")]
    Token(#[from] AuthError),
}

/// Shared plumbing of the HTTP adapters.
struct ServiceCall {
    base_url: String,
    client: Client,
    tokens: Arc<ServiceTokens>,
}

impl ServiceCall {
    fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        tokens: Arc<ServiceTokens>,
    ) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(ServiceCall {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            tokens,
        })
    }

    async fn post<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp, ClientError>
    where
        Req: serde::Serialize + Sync,
        Resp: serde::de::DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        // Fresh token per call so expiry never needs tracking.
        let token = self.tokens.issue(RISK_ANALYSIS_SERVICE)?;

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!(url = %url, error = %e, "Service call failed");
                ClientError::Request(e)
            })?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ClientError::Unauthorized),
            status if !status.is_success() => Err(ClientError::Status(status)),
            _ => Ok(response.json::<Resp>().await?),
        }
    }
}

/// HTTP adapter for a remote list service.
pub struct ListsClient {
    call: ServiceCall,
}

impl ListsClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        tokens: Arc<ServiceTokens>,
    ) -> Result<Self, ClientError> {
        Ok(ListsClient {
            call: ServiceCall::new(base_url, timeout, tokens)?,
        })
    }

    pub async fn check(
        &self,
        attributes: &TransactionAttributes,
    ) -> Result<ListFlags, ClientError> {
        let request = ListsCheckRequest::from_attributes(attributes);
        let response: ListsCheckResponse = self.call.post("/lists/check", &request).await?;
        debug!(customer_id = %attributes.customer_id, "Remote list check completed");
        Ok(response.into())
    }
}

#[async_trait]
impl ListsPort for ListsClient {
    async fn check_lists(&self, attributes: &TransactionAttributes) -> anyhow::Result<ListFlags> {
        Ok(self.check(attributes).await?)
    }
}

/// HTTP adapter for a remote scoring service.
pub struct ScoringClient {
    call: ServiceCall,
}

impl ScoringClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        tokens: Arc<ServiceTokens>,
    ) -> Result<Self, ClientError> {
        Ok(ScoringClient {
            call: ServiceCall::new(base_url, timeout, tokens)?,
        })
    }

    pub async fn score(
        &self,
        attributes: &TransactionAttributes,
        flags: ListFlags,
    ) -> Result<RiskScore, ClientError> {
        let request = ScoreRequest::new(attributes, flags);
        let response: ScoreResponse = self
            .call
            .post("/decision-engine/calculate-score", &request)
            .await?;
        Ok(RiskScore::new(response.score))
    }
}

#[async_trait]
impl ScoringPort for ScoringClient {
    async fn calculate_score(
        &self,
        attributes: &TransactionAttributes,
        flags: ListFlags,
    ) -> anyhow::Result<RiskScore> {
        Ok(self.score(attributes, flags).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn tokens() -> Arc<ServiceTokens> {
        Arc::new(ServiceTokens::new("secret", Duration::from_secs(60)))
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let call = ServiceCall::new("http://lists:8080/", Duration::from_millis(100), tokens())
            .unwrap();
        assert_eq!(call.base_url, "http://lists:8080");
    }

    #[tokio::test]
    async fn test_unreachable_service_is_an_error() {
        // Nothing listens on port 9 (discard) on a test host.
        let client =
            ListsClient::new("http://127.0.0.1:9", Duration::from_millis(200), tokens()).unwrap();
        let attributes = TransactionAttributes::new("1", "ip", "d", "PIX", Decimal::ONE);

        assert!(client.check_lists(&attributes).await.is_err());
    }
}

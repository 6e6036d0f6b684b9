//! Service identity for calls between the screening, scoring and analysis
//! surfaces.
//!
//! Tokens are HS256 JWTs signed with a shared secret. A caller exchanges a
//! registered client id for a token and presents it as a bearer token.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Subject carried by every service token.
pub const SERVICE_SUBJECT: &str = "service-communication";

pub const LISTS_SERVICE: &str = "lists-service";
pub const DECISION_ENGINE_SERVICE: &str = "decision-engine-service";
pub const RISK_ANALYSIS_SERVICE: &str = "risk-analysis-service";

/// Built-in client registry: client id -> service name.
pub const DEFAULT_CLIENTS: [(&str, &str); 3] = [
    ("7f073c43-d91b-4138-b7f0-85f8d73490bf", LISTS_SERVICE),
    ("a1b2c3d4-e5f6-7890-abcd-ef1234567890", DECISION_ENGINE_SERVICE),
    ("12345678-90ab-cdef-1234-567890abcdef", RISK_ANALYSIS_SERVICE),
];

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("missing Authorization header")]
    MissingHeader,

    #[error("Authorization header is not a bearer token")]
    MalformedHeader,

    #[error("unknown client id: {0}")]
    UnknownClient(String),

    #[error("invalid or expired token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
}

/// Claims of a service token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceClaims {
    pub sub: String,
    pub iss: String,
    pub service: String,
    pub iat: i64,
    pub exp: i64,
}

/// A freshly issued token, as returned by `GET /auth/token`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToken {
    pub token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub client_id: String,
    pub service_name: String,
}

/// Issues and verifies service tokens.
pub struct ServiceTokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
    clients: BTreeMap<String, String>,
}

impl ServiceTokens {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        ServiceTokens {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
            clients: DEFAULT_CLIENTS
                .iter()
                .map(|(id, name)| (id.to_string(), name.to_string()))
                .collect(),
        }
    }

    /// Register an extra client id.
    pub fn with_client(mut self, client_id: impl Into<String>, service: impl Into<String>) -> Self {
        self.clients.insert(client_id.into(), service.into());
        self
    }

    pub fn clients(&self) -> &BTreeMap<String, String> {
        &self.clients
    }

    /// Sign a token for `service`.
    pub fn issue(&self, service: &str) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = ServiceClaims {
            sub: SERVICE_SUBJECT.to_string(),
            iss: service.to_string(),
            service: service.to_string(),
            iat: now,
            exp: now + self.ttl.as_secs() as i64,
        };

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// Exchange a registered client id for a token.
    pub fn issue_for_client(&self, client_id: &str) -> Result<IssuedToken, AuthError> {
        let service = self
            .clients
            .get(client_id)
            .ok_or_else(|| AuthError::UnknownClient(client_id.to_string()))?;

        Ok(IssuedToken {
            token: self.issue(service)?,
            token_type: "Bearer".to_string(),
            expires_in: self.ttl.as_secs(),
            client_id: client_id.to_string(),
            service_name: service.clone(),
        })
    }

    pub fn verify(&self, token: &str) -> Result<ServiceClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let data = decode::<ServiceClaims>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }

    /// Verify the value of an `Authorization` header.
    pub fn verify_header(&self, header: Option<&str>) -> Result<ServiceClaims, AuthError> {
        let header = header.ok_or(AuthError::MissingHeader)?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::MalformedHeader)?;
        self.verify(token.trim())
    }
}

/// Rejects requests without a valid service token.
///
/// Verified claims are attached to the request extensions.
pub async fn require_service_token(
    State(tokens): State<Arc<ServiceTokens>>,
    mut req: Request,
    next: Next,
) -> Response {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match tokens.verify_header(header) {
        Ok(claims) => {
            debug!(service = %claims.service, path = %req.uri().path(), "Service token accepted");
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(e) => {
            warn!(path = %req.uri().path(), error = %e, "Rejected request");
            unauthorized(&e)
        }
    }
}

fn unauthorized(err: &AuthError) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "error": err.to_string() })),
    )
        .into_response()
}

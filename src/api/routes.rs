use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use std::time::Instant;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::analysis::RiskAnalyzer;
use crate::auth::{require_service_token, ServiceTokens};
use crate::domain::Decision;
use crate::lists::ListChecker;
use crate::observability::MetricsRegistry;
use crate::rules::ScoringService;

use super::request::{ListsCheckRequest, RiskAnalysisRequest, ScoreRequest, TokenQuery};
use super::response::{
    ClientIdEntry, ErrorResponse, HealthResponse, ListsCheckResponse, ReadyResponse,
    ReloadResponse, RiskAnalysisResponse, ScoreResponse,
};

/// Shared application state.
pub struct AppState {
    /// Decision pipeline behind `/risk-analysis`
    pub analyzer: RiskAnalyzer,

    /// Local list checker behind `/lists/*`
    pub lists: Arc<ListChecker>,

    /// Local scoring service behind `/decision-engine/*`
    pub scoring: ScoringService,

    pub tokens: Arc<ServiceTokens>,

    pub metrics: Arc<MetricsRegistry>,

    /// Require a service token on business endpoints
    pub auth_enabled: bool,

    /// Application start time
    pub start_time: Instant,

    /// Application version
    pub version: String,
}

/// Create the application router.
pub fn create_router(state: Arc<AppState>) -> Router {
    let mut protected = Router::new()
        .route("/risk-analysis", post(handle_risk_analysis))
        .route("/lists/check", post(handle_lists_check))
        .route("/lists/reload", post(handle_lists_reload))
        .route(
            "/decision-engine/calculate-score",
            post(handle_calculate_score),
        );

    if state.auth_enabled {
        protected = protected.route_layer(middleware::from_fn_with_state(
            state.tokens.clone(),
            require_service_token,
        ));
    }

    Router::new()
        .merge(protected)
        .route("/auth/token", get(handle_token))
        .route("/auth/client-ids", get(handle_client_ids))
        .route("/health", get(handle_health))
        .route("/ready", get(handle_ready))
        .route("/metrics", get(handle_metrics))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}

/// Handle risk analysis requests.
///
/// A body that cannot be read is denied like any other invalid input.
async fn handle_risk_analysis(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RiskAnalysisRequest>, JsonRejection>,
) -> Json<RiskAnalysisResponse> {
    let Json(req) = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Unreadable risk analysis request");
            state.metrics.record_validation_rejection();
            state.metrics.record_decision(Decision::Denied);
            return Json(RiskAnalysisResponse {
                tx_decision: Decision::Denied,
            });
        }
    };

    let decision = state.analyzer.analyze(&req.to_attributes()).await;

    Json(RiskAnalysisResponse {
        tx_decision: decision,
    })
}

async fn handle_lists_check(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ListsCheckRequest>,
) -> Response {
    if let Some(field) = req.missing_field() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(format!("{} is required", field))),
        )
            .into_response();
    }

    let flags = state.lists.check(&req.cpf, &req.ip, &req.device_id);
    Json(ListsCheckResponse::from(flags)).into_response()
}

async fn handle_lists_reload(State(state): State<Arc<AppState>>) -> Response {
    // Reading the list file blocks
    let lists = state.lists.clone();
    let result = match tokio::task::spawn_blocking(move || lists.reload()).await {
        Ok(result) => result.map_err(|e| e.to_string()),
        Err(e) => Err(format!("reload task failed: {}", e)),
    };

    match result {
        Ok(summary) => {
            info!(generation = summary.generation, "Lists reloaded on request");
            Json(ReloadResponse::ok(summary.generation, summary.counts)).into_response()
        }
        Err(message) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(message)),
        )
            .into_response(),
    }
}

/// Score a transaction whose list flags are already known.
///
/// Any failure answers 500 carrying the fallback score.
async fn handle_calculate_score(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ScoreRequest>,
) -> Response {
    match state
        .scoring
        .calculate_score(&req.to_attributes(), req.flags())
        .await
    {
        Ok(score) => Json(ScoreResponse {
            score: score.value(),
        })
        .into_response(),
        Err(e) => {
            error!(customer_id = %req.cpf, error = %e, "Score calculation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ScoreResponse {
                    score: state.analyzer.policy().fallback_score.value(),
                }),
            )
                .into_response()
        }
    }
}

async fn handle_token(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TokenQuery>,
) -> Response {
    match state.tokens.issue_for_client(&query.client_id) {
        Ok(issued) => {
            info!(service = %issued.service_name, "Issued service token");
            Json(issued).into_response()
        }
        Err(e) => {
            warn!(client_id = %query.client_id, error = %e, "Token request refused");
            (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(e.to_string()))).into_response()
        }
    }
}

async fn handle_client_ids(State(state): State<Arc<AppState>>) -> Json<Vec<ClientIdEntry>> {
    Json(
        state
            .tokens
            .clients()
            .iter()
            .map(|(client_id, service_name)| ClientIdEntry {
                client_id: client_id.clone(),
                service_name: service_name.clone(),
            })
            .collect(),
    )
}

/// Health check endpoint.
async fn handle_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// Readiness check endpoint.
///
/// Not ready until a list snapshot has loaded at least once.
async fn handle_ready(State(state): State<Arc<AppState>>) -> Response {
    let snapshot = state.lists.snapshot();
    let ready = ReadyResponse {
        ready: snapshot.is_loaded(),
        lists_loaded: snapshot.is_loaded(),
        lists_generation: snapshot.generation,
        rule_source: state.scoring.store().describe(),
    };

    let status = if ready.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(ready)).into_response()
}

/// Metrics endpoint (Prometheus format).
async fn handle_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let metrics = format!(
        r#"# HELP riskgate_uptime_seconds Application uptime in seconds
# TYPE riskgate_uptime_seconds counter
riskgate_uptime_seconds {}

{}"#,
        state.start_time.elapsed().as_secs(),
        state.metrics.to_prometheus(),
    );

    (
        StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; charset=utf-8",
        )],
        metrics,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::DecisionPolicy;
    use crate::domain::{Rule, RuleId, DEFAULT_TX_TYPE};
    use crate::lists::{JsonFileListSource, ListData, StaticListSource};
    use crate::rules::RuleEvaluator;
    use crate::storage::MockRuleStore;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::ServiceExt;

    struct TestApp {
        state: Arc<AppState>,
        store: Arc<MockRuleStore>,
    }

    fn test_app(auth_enabled: bool) -> TestApp {
        let metrics = Arc::new(MetricsRegistry::new());
        let lists = Arc::new(ListChecker::load(
            Arc::new(StaticListSource::new(ListData {
                cpf_restrictive_list: vec!["11111111111".to_string()],
                ip_restrictive_list: vec!["6.6.6.6".to_string()],
                ..ListData::default()
            })),
            metrics.clone(),
        ));

        let store = Arc::new(MockRuleStore::with_rules(vec![
            Rule {
                id: RuleId(1),
                name: "restrictive cpf".to_string(),
                description: String::new(),
                tx_type: DEFAULT_TX_TYPE.to_string(),
                condition: json!({"type": "cpf_restrictive_list"}),
                points: 800,
                active: true,
            },
            Rule {
                id: RuleId(2),
                name: "mid value".to_string(),
                description: String::new(),
                tx_type: "PIX".to_string(),
                condition: json!({"type": "value_range", "min": 0, "max": 5000}),
                points: 50,
                active: true,
            },
        ]));
        let scoring = ScoringService::new(store.clone(), RuleEvaluator::new(metrics.clone()));

        let analyzer = RiskAnalyzer::new(
            lists.clone(),
            Arc::new(scoring.clone()),
            DecisionPolicy::default(),
            metrics.clone(),
        );

        let state = Arc::new(AppState {
            analyzer,
            lists,
            scoring,
            tokens: Arc::new(ServiceTokens::new("test-secret", Duration::from_secs(60))),
            metrics,
            auth_enabled,
            start_time: Instant::now(),
            version: "0.1.0-test".to_string(),
        });

        TestApp { state, store }
    }

    fn bearer(state: &AppState) -> String {
        format!(
            "Bearer {}",
            state.tokens.issue(crate::auth::RISK_ANALYSIS_SERVICE).unwrap()
        )
    }

    fn post_json(uri: &str, auth: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_router(test_app(true).state);

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_risk_analysis_requires_token() {
        let app = create_router(test_app(true).state);

        let response = app
            .oneshot(post_json("/risk-analysis", None, "{}"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(json_body(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_risk_analysis_restricted_customer_denied() {
        let test = test_app(true);
        let auth = bearer(&test.state);
        let app = create_router(test.state);

        let response = app
            .oneshot(post_json(
                "/risk-analysis",
                Some(&auth),
                r#"{"cpf":"11111111111","ip":"10.0.0.1","deviceId":"d1","txType":"PIX","txValue":1000}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({"txDecision": "Denied"}));
    }

    #[tokio::test]
    async fn test_risk_analysis_clean_customer_approved() {
        let app = create_router(test_app(false).state);

        let response = app
            .oneshot(post_json(
                "/risk-analysis",
                None,
                r#"{"cpf":"22222222222","ip":"10.0.0.1","deviceId":"d1","txType":"PIX","txValue":"100.00"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(json_body(response).await["txDecision"], "Approved");
    }

    #[tokio::test]
    async fn test_malformed_body_is_denied() {
        let test = test_app(false);
        let metrics = test.state.metrics.clone();
        let app = create_router(test.state);

        let response = app
            .oneshot(post_json("/risk-analysis", None, "{not json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["txDecision"], "Denied");
        assert_eq!(
            metrics
                .analyses_denied
                .load(std::sync::atomic::Ordering::Relaxed),
            1
        );
    }

    #[tokio::test]
    async fn test_lists_check() {
        let app = create_router(test_app(false).state);

        let response = app
            .oneshot(post_json(
                "/lists/check",
                None,
                r#"{"cpf":"11111111111","ip":"6.6.6.6","deviceId":"d1"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({
                "cpf": { "inPermissiveList": false, "inRestrictiveList": true },
                "ip": { "inRestrictiveList": true },
                "deviceId": { "inRestrictiveList": false }
            })
        );
    }

    #[tokio::test]
    async fn test_lists_check_blank_field() {
        let app = create_router(test_app(false).state);

        let response = app
            .oneshot(post_json(
                "/lists/check",
                None,
                r#"{"cpf":"1","ip":"","deviceId":"d1"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_lists_reload() {
        let app = create_router(test_app(false).state);

        let response = app
            .oneshot(post_json("/lists/reload", None, ""))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["generation"], 2);
        assert_eq!(body["cpfRestrictive"], 1);
    }

    #[tokio::test]
    async fn test_lists_reload_failure_keeps_serving() {
        let mut test = test_app(false);
        Arc::get_mut(&mut test.state).unwrap().lists = Arc::new(ListChecker::new(Arc::new(
            JsonFileListSource::new("/nonexistent/lists.json"),
        )));
        let app = create_router(test.state);

        let response = app
            .clone()
            .oneshot(post_json("/lists/reload", None, ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json_body(response).await["error"].is_string());

        let response = app
            .oneshot(post_json(
                "/lists/check",
                None,
                r#"{"cpf":"11111111111","ip":"10.0.0.1","deviceId":"d1"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_calculate_score() {
        let app = create_router(test_app(false).state);

        let response = app
            .oneshot(post_json(
                "/decision-engine/calculate-score",
                None,
                r#"{"cpf":"1","ip":"ip","deviceId":"d","txType":"PIX","txValue":1000,
                    "cpfInPermissiveList":false,"cpfInRestrictiveList":true,
                    "ipInRestrictiveList":false,"deviceIdInRestrictiveList":false}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({"score": 850}));
    }

    #[tokio::test]
    async fn test_calculate_score_value_just_above_bound() {
        let app = create_router(test_app(false).state);

        let response = app
            .oneshot(post_json(
                "/decision-engine/calculate-score",
                None,
                r#"{"cpf":"1","ip":"ip","deviceId":"d","txType":"PIX","txValue":5000.0000000000000001,
                    "cpfInPermissiveList":false,"cpfInRestrictiveList":false,
                    "ipInRestrictiveList":false,"deviceIdInRestrictiveList":false}"#,
            ))
            .await
            .unwrap();

        // The 0..5000 rule must not match, leaving only the floor
        assert_eq!(json_body(response).await, json!({"score": 1}));
    }

    #[tokio::test]
    async fn test_calculate_score_failure_returns_fallback() {
        let test = test_app(false);
        test.store.set_failing(true);
        let app = create_router(test.state);

        let response = app
            .oneshot(post_json(
                "/decision-engine/calculate-score",
                None,
                r#"{"cpf":"1","ip":"ip","deviceId":"d","txType":"PIX","txValue":10}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await, json!({"score": 500}));
    }

    #[tokio::test]
    async fn test_token_endpoint() {
        let test = test_app(true);
        let tokens = test.state.tokens.clone();
        let app = create_router(test.state);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/auth/token?clientId=a1b2c3d4-e5f6-7890-abcd-ef1234567890")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["serviceName"], "decision-engine-service");
        assert_eq!(body["tokenType"], "Bearer");
        assert!(tokens.verify(body["token"].as_str().unwrap()).is_ok());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/auth/token?clientId=unknown")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_client_ids_endpoint() {
        let app = create_router(test_app(true).state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/auth/client-ids")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let body = json_body(response).await;
        assert_eq!(body.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_ready_and_metrics() {
        let app = create_router(test_app(true).state);

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["rule_source"], "mock");

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("riskgate_uptime_seconds"));
        assert!(text.contains("riskgate_list_reloads_total 1"));
    }
}

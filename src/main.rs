use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};

use riskgate::analysis::{
    DecisionPolicy, ListsClient, ListsPort, RiskAnalyzer, ScoringClient, ScoringPort,
};
use riskgate::api::routes::{create_router, AppState};
use riskgate::auth::ServiceTokens;
use riskgate::config::Config;
use riskgate::lists::{JsonFileListSource, ListChecker, ListReloader};
use riskgate::observability::{init_tracing, MetricsRegistry};
use riskgate::policy::{PolicyLoader, PolicyWatcher};
use riskgate::rules::{RuleEvaluator, ScoringService};
use riskgate::storage::{PolicyRuleStore, PostgresRuleStore, RuleStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse configuration
    let config = Config::parse();

    // Initialize tracing
    init_tracing(&config.log_level, config.log_json);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting riskgate risk decision service"
    );

    let metrics = Arc::new(MetricsRegistry::new());
    let tokens = Arc::new(ServiceTokens::new(&config.jwt_secret, config.jwt_ttl()));

    // Screening lists
    let lists = Arc::new(ListChecker::load(
        Arc::new(JsonFileListSource::new(config.lists_path.clone())),
        metrics.clone(),
    ));
    let lists_handle = ListReloader::new(lists.clone(), config.lists_reload_interval()).start();

    // Rule source: Postgres when configured, the YAML policy otherwise
    let mut policy_handle = None;
    let store: Arc<dyn RuleStore> = match &config.database_url {
        Some(url) => {
            let store = PostgresRuleStore::connect(url, 1, config.db_max_connections).await?;
            store.run_migrations().await?;
            info!("Serving rules from Postgres");
            Arc::new(store)
        }
        None => {
            let loader = PolicyLoader::new(config.rules_path.to_string_lossy());
            let watcher = PolicyWatcher::new(loader, config.rules_reload_interval());
            let (policy_rx, handle) = watcher.start();
            policy_handle = Some(handle);
            Arc::new(PolicyRuleStore::new(policy_rx))
        }
    };

    let scoring = ScoringService::new(store, RuleEvaluator::new(metrics.clone()));

    // Orchestrator ports: remote services when configured, in-process otherwise
    let lists_port: Arc<dyn ListsPort> = match &config.lists_service_url {
        Some(url) => {
            info!(url = %url, "Using remote list service");
            Arc::new(ListsClient::new(
                url.as_str(),
                config.call_timeout(),
                tokens.clone(),
            )?)
        }
        None => lists.clone(),
    };
    let scoring_port: Arc<dyn ScoringPort> = match &config.scoring_service_url {
        Some(url) => {
            info!(url = %url, "Using remote scoring service");
            Arc::new(ScoringClient::new(
                url.as_str(),
                config.call_timeout(),
                tokens.clone(),
            )?)
        }
        None => Arc::new(scoring.clone()),
    };

    let policy: DecisionPolicy = config.decision_policy();
    if !config.scoring_fails_closed() {
        warn!(
            fallback_score = config.scoring_fallback_score,
            medium_risk_max_score = config.medium_risk_max_score,
            "Scoring failures will approve transactions"
        );
    }
    if !config.auth_enabled {
        warn!("Service token checks are disabled");
    }

    let analyzer = RiskAnalyzer::new(lists_port, scoring_port, policy, metrics.clone());

    // Create application state
    let state = Arc::new(AppState {
        analyzer,
        lists,
        scoring,
        tokens,
        metrics,
        auth_enabled: config.auth_enabled,
        start_time: Instant::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    });

    // Create router
    let app = create_router(state);

    // Parse listen address
    let addr: SocketAddr = config.listen_addr.parse()?;

    info!(addr = %addr, "Starting HTTP server");

    // Create TCP listener
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Run server with graceful shutdown
    if config.graceful_shutdown {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
    } else {
        axum::serve(listener, app).await?;
    }

    // Cleanup
    info!("Shutting down...");
    if let Some(handle) = policy_handle {
        handle.abort();
    }
    if let Some(handle) = lists_handle {
        handle.abort();
    }

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Received shutdown signal");
}

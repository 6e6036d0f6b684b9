use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::analysis::DecisionPolicy;
use crate::domain::RiskScore;

/// Default shared secret for service tokens. Override it in any real
/// deployment.
pub const DEFAULT_JWT_SECRET: &str = "acme-risk-analysis-secret-key-for-internal-communication";

/// Risk gate configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "riskgate")]
#[command(about = "List-screening and rule-scoring risk decision service")]
pub struct Config {
    /// HTTP server listen address
    #[arg(long, default_value = "0.0.0.0:8080", env = "RISKGATE_LISTEN_ADDR")]
    pub listen_addr: String,

    /// Path to the screening lists JSON file
    #[arg(long, default_value = "lists.json", env = "RISKGATE_LISTS_PATH")]
    pub lists_path: PathBuf,

    /// List reload interval in seconds (0 reloads only on request)
    #[arg(long, default_value = "0", env = "RISKGATE_LISTS_RELOAD_SECS")]
    pub lists_reload_secs: u64,

    /// Path to the scoring rules YAML file
    #[arg(long, default_value = "rules.yaml", env = "RISKGATE_RULES_PATH")]
    pub rules_path: PathBuf,

    /// Rules reload check interval in seconds
    #[arg(long, default_value = "30", env = "RISKGATE_RULES_RELOAD_SECS")]
    pub rules_reload_secs: u64,

    /// Postgres URL; when set, rules are read from the database
    #[arg(long, env = "RISKGATE_DATABASE_URL")]
    pub database_url: Option<String>,

    /// Maximum database pool connections
    #[arg(long, default_value = "10", env = "RISKGATE_DB_MAX_CONNECTIONS")]
    pub db_max_connections: u32,

    /// Highest score that is still approved
    #[arg(long, default_value = "699", env = "RISKGATE_MEDIUM_RISK_MAX_SCORE")]
    pub medium_risk_max_score: u32,

    /// Score assumed when scoring fails
    #[arg(long, default_value = "500", env = "RISKGATE_SCORING_FALLBACK_SCORE")]
    pub scoring_fallback_score: u32,

    /// Base URL of a remote list service (in-process when unset)
    #[arg(long, env = "RISKGATE_LISTS_SERVICE_URL")]
    pub lists_service_url: Option<String>,

    /// Base URL of a remote scoring service (in-process when unset)
    #[arg(long, env = "RISKGATE_SCORING_SERVICE_URL")]
    pub scoring_service_url: Option<String>,

    /// Timeout for each downstream call in milliseconds
    #[arg(long, default_value = "2000", env = "RISKGATE_CALL_TIMEOUT_MS")]
    pub call_timeout_ms: u64,

    /// Shared secret for service tokens
    #[arg(long, default_value = DEFAULT_JWT_SECRET, env = "RISKGATE_JWT_SECRET", hide_default_value = true)]
    pub jwt_secret: String,

    /// Service token lifetime in seconds
    #[arg(long, default_value = "3600", env = "RISKGATE_JWT_TTL_SECS")]
    pub jwt_ttl_secs: u64,

    /// Require service tokens on business endpoints
    #[arg(long, default_value = "true", env = "RISKGATE_AUTH_ENABLED", action = clap::ArgAction::Set)]
    pub auth_enabled: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, default_value = "false", env = "RISKGATE_LOG_JSON", action = clap::ArgAction::Set)]
    pub log_json: bool,

    /// Enable graceful shutdown
    #[arg(long, default_value = "true", env = "RISKGATE_GRACEFUL_SHUTDOWN", action = clap::ArgAction::Set)]
    pub graceful_shutdown: bool,
}

impl Config {
    /// Get list reload interval as Duration.
    pub fn lists_reload_interval(&self) -> Duration {
        Duration::from_secs(self.lists_reload_secs)
    }

    /// Get rules reload interval as Duration.
    pub fn rules_reload_interval(&self) -> Duration {
        Duration::from_secs(self.rules_reload_secs)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    pub fn jwt_ttl(&self) -> Duration {
        Duration::from_secs(self.jwt_ttl_secs)
    }

    pub fn decision_policy(&self) -> DecisionPolicy {
        DecisionPolicy {
            medium_risk_max_score: self.medium_risk_max_score,
            fallback_score: RiskScore::new(self.scoring_fallback_score),
            call_timeout: self.call_timeout(),
        }
    }

    /// Returns true if a failed score would deny the transaction.
    pub fn scoring_fails_closed(&self) -> bool {
        self.scoring_fallback_score > self.medium_risk_max_score
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listen_addr: "0.0.0.0:8080".to_string(),
            lists_path: PathBuf::from("lists.json"),
            lists_reload_secs: 0,
            rules_path: PathBuf::from("rules.yaml"),
            rules_reload_secs: 30,
            database_url: None,
            db_max_connections: 10,
            medium_risk_max_score: 699,
            scoring_fallback_score: 500,
            lists_service_url: None,
            scoring_service_url: None,
            call_timeout_ms: 2000,
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            jwt_ttl_secs: 3600,
            auth_enabled: true,
            log_level: "info".to_string(),
            log_json: false,
            graceful_shutdown: true,
        }
    }
}

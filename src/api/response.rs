use serde::{Deserialize, Serialize};

use crate::domain::{Decision, ListFlags};
use crate::lists::SnapshotCounts;

/// Response of `POST /risk-analysis`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAnalysisResponse {
    pub tx_decision: Decision,
}

/// Customer membership in both customer lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerListStatus {
    pub in_permissive_list: bool,
    pub in_restrictive_list: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestrictiveListStatus {
    pub in_restrictive_list: bool,
}

/// Response of `POST /lists/check`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListsCheckResponse {
    pub cpf: CustomerListStatus,
    pub ip: RestrictiveListStatus,
    pub device_id: RestrictiveListStatus,
}

impl From<ListFlags> for ListsCheckResponse {
    fn from(flags: ListFlags) -> Self {
        ListsCheckResponse {
            cpf: CustomerListStatus {
                in_permissive_list: flags.customer_permissive,
                in_restrictive_list: flags.customer_restrictive,
            },
            ip: RestrictiveListStatus {
                in_restrictive_list: flags.ip_restrictive,
            },
            device_id: RestrictiveListStatus {
                in_restrictive_list: flags.device_restrictive,
            },
        }
    }
}

impl From<ListsCheckResponse> for ListFlags {
    fn from(response: ListsCheckResponse) -> Self {
        ListFlags {
            customer_permissive: response.cpf.in_permissive_list,
            customer_restrictive: response.cpf.in_restrictive_list,
            ip_restrictive: response.ip.in_restrictive_list,
            device_restrictive: response.device_id.in_restrictive_list,
        }
    }
}

/// Response of `POST /lists/reload`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReloadResponse {
    pub status: String,
    pub generation: u64,
    pub cpf_permissive: usize,
    pub cpf_restrictive: usize,
    pub ip_restrictive: usize,
    pub device_restrictive: usize,
}

impl ReloadResponse {
    pub fn ok(generation: u64, counts: SnapshotCounts) -> Self {
        ReloadResponse {
            status: "ok".to_string(),
            generation,
            cpf_permissive: counts.customer_permissive,
            cpf_restrictive: counts.customer_restrictive,
            ip_restrictive: counts.ip_restrictive,
            device_restrictive: counts.device_restrictive,
        }
    }
}

/// Response of `POST /decision-engine/calculate-score`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoreResponse {
    pub score: u32,
}

/// Entry of `GET /auth/client-ids`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientIdEntry {
    pub client_id: String,
    pub service_name: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// Readiness check response.
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    pub ready: bool,
    pub lists_loaded: bool,
    pub lists_generation: u64,
    pub rule_source: String,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        ErrorResponse {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lists_check_response_shape() {
        let flags = ListFlags {
            customer_permissive: true,
            customer_restrictive: true,
            ip_restrictive: false,
            device_restrictive: true,
        };

        let json = serde_json::to_value(ListsCheckResponse::from(flags)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "cpf": { "inPermissiveList": true, "inRestrictiveList": true },
                "ip": { "inRestrictiveList": false },
                "deviceId": { "inRestrictiveList": true }
            })
        );
    }

    #[test]
    fn test_risk_analysis_response_shape() {
        let json = serde_json::to_string(&RiskAnalysisResponse {
            tx_decision: Decision::Denied,
        })
        .unwrap();
        assert_eq!(json, r#"{"txDecision":"Denied"}"#);
    }
}

pub mod request;
pub mod response;
pub mod routes;

pub use request::{ListsCheckRequest, RiskAnalysisRequest, ScoreRequest, TokenQuery};
pub use response::{
    ClientIdEntry, CustomerListStatus, ErrorResponse, HealthResponse, ListsCheckResponse,
    ReadyResponse, ReloadResponse, RestrictiveListStatus, RiskAnalysisResponse, ScoreResponse,
};
pub use routes::{create_router, AppState};

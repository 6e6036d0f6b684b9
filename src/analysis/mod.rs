pub mod clients;
pub mod local;
pub mod orchestrator;
pub mod ports;

pub use clients::{ClientError, ListsClient, ScoringClient};
pub use orchestrator::{Analysis, DecisionPolicy, RiskAnalyzer};
pub use ports::{ListsPort, ScoringPort};

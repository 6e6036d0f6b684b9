pub mod checker;
pub mod reload;
pub mod snapshot;
pub mod source;

pub use checker::{ListChecker, ReloadSummary};
pub use reload::ListReloader;
pub use snapshot::{ListSnapshot, MemberSet, SnapshotCounts};
pub use source::{JsonFileListSource, ListData, ListSource, ListSourceError, StaticListSource};

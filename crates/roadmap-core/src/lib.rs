pub mod config;
pub mod error;
pub mod paths;
pub mod refs;
pub mod store;
pub mod types;

pub use config::{GitConfig, RoadmapConfig};
pub use error::GitError;
pub use paths::RoadmapPaths;
pub use refs::ProposedUpdate;
pub use store::IssueStore;
pub use types::*;

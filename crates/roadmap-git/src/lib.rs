pub mod branches;
pub mod commits;
pub mod exec;
pub mod facade;
pub mod repo;

#[cfg(test)]
pub(crate) mod test_support;

pub use branches::{Branch, BranchManager, BranchOutcome};
pub use commits::{Commit, CommitAnalyzer};
pub use exec::{GitExecutor, RepoContext};
pub use facade::{GitContext, GitIntegration};
pub use repo::{RepositoryInfo, RepositoryReader};

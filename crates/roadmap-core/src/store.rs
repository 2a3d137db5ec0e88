use crate::types::{Issue, IssueUpdate, NewIssue};

/// The issue persistence collaborator.
///
/// The git engine never touches issue files directly; it only reads issues and
/// proposes changes through this contract. Implementations are expected to make
/// `update` atomic per issue. Errors here are contract violations and propagate
/// to the caller, except inside hook handlers and the sync batch loop.
pub trait IssueStore {
    fn get(&self, id: &str) -> anyhow::Result<Option<Issue>>;

    fn create(&self, new: NewIssue) -> anyhow::Result<Issue>;

    /// Apply `update` to issue `id`. Returns `None` when the issue does not exist.
    fn update(&self, id: &str, update: &IssueUpdate) -> anyhow::Result<Option<Issue>>;

    fn list(&self) -> anyhow::Result<Vec<Issue>>;

    fn assign_to_milestone(&self, id: &str, milestone: &str) -> anyhow::Result<bool>;
}

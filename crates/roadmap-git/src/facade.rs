use serde::Serialize;
use std::collections::BTreeMap;

use roadmap_core::{GitConfig, GitError, Issue, IssueStore, IssueUpdate};

use crate::branches::{extract_issue_id, BranchManager, BranchOutcome};
use crate::commits::{Commit, CommitAnalyzer};
use crate::exec::{GitExecutor, RepoContext};
use crate::repo::{RepositoryInfo, RepositoryReader};

/// What `roadmap git status` shows.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct GitContext {
    pub is_repository: bool,
    pub current_branch: Option<String>,
    pub linked_issue_id: Option<String>,
    pub linked_issue_title: Option<String>,
    pub remote_url: Option<String>,
}

/// The surface the issue tracker and the CLI talk to.
pub struct GitIntegration {
    git: GitExecutor,
    config: GitConfig,
}

impl GitIntegration {
    pub fn new(ctx: RepoContext, config: GitConfig) -> Self {
        Self {
            git: GitExecutor::new(ctx),
            config,
        }
    }

    pub fn executor(&self) -> &GitExecutor {
        &self.git
    }

    pub fn config(&self) -> &GitConfig {
        &self.config
    }

    pub fn is_repository(&self) -> bool {
        self.git.is_repository()
    }

    pub fn repository(&self) -> RepositoryReader<'_> {
        RepositoryReader::new(&self.git)
    }

    pub fn branches(&self) -> BranchManager<'_> {
        BranchManager::new(&self.git, &self.config)
    }

    pub fn commits(&self) -> CommitAnalyzer<'_> {
        CommitAnalyzer::new(&self.git)
    }

    pub fn repository_info(&self) -> RepositoryInfo {
        self.repository().info()
    }

    pub fn current_branch(&self) -> Option<String> {
        self.repository().current_branch()
    }

    pub fn current_user(&self) -> Option<String> {
        self.repository().user_name()
    }

    pub fn current_email(&self) -> Option<String> {
        self.repository().user_email()
    }

    /// Repository state plus the issue the current branch points at, if any.
    /// Store failures only blank out the linked issue.
    pub fn context(&self, store: &dyn IssueStore) -> GitContext {
        if !self.is_repository() {
            return GitContext::default();
        }
        let current_branch = self.current_branch();
        let linked = current_branch.as_deref().and_then(|branch| {
            self.issue_for_branch(store, branch)
                .map_err(|e| tracing::debug!(branch, error = %e, "linked issue lookup failed"))
                .ok()
                .flatten()
        });
        let linked_issue_id = linked
            .as_ref()
            .map(|i| i.id.clone())
            .or_else(|| current_branch.as_deref().and_then(extract_issue_id));
        GitContext {
            is_repository: true,
            current_branch,
            linked_issue_id,
            linked_issue_title: linked.map(|i| i.title),
            remote_url: self.repository().remote_url(),
        }
    }

    pub fn suggest_branch_name(&self, issue: &Issue) -> String {
        self.branches().suggest_name(issue)
    }

    pub fn create_branch_for_issue(
        &self,
        issue: &Issue,
        checkout: bool,
        force: bool,
    ) -> Result<BranchOutcome, GitError> {
        self.branches().create_branch_for(issue, checkout, force)
    }

    /// Commits within the configured window that reference `issue_id`.
    pub fn commits_for_issue(&self, issue_id: &str, since: Option<&str>) -> Vec<Commit> {
        self.commits()
            .commits_referencing_in(issue_id, self.config.commit_window, since)
    }

    pub fn branch_issue_map(&self) -> BTreeMap<String, String> {
        self.branches().branch_issue_map()
    }

    /// The issue a branch belongs to: the id in its name, or else an issue
    /// that already lists the branch in `git_branches`.
    pub fn issue_for_branch(
        &self,
        store: &dyn IssueStore,
        branch: &str,
    ) -> anyhow::Result<Option<Issue>> {
        if let Some(id) = extract_issue_id(branch) {
            if let Some(issue) = store.get(&id)? {
                return Ok(Some(issue));
            }
        }
        Ok(store.list()?.into_iter().find(|i| i.has_branch(branch)))
    }

    /// Add `branch` (default: the current branch) to the issue's `git_branches`.
    /// `Ok(None)` when the issue doesn't exist.
    pub fn link_branch_to_issue(
        &self,
        store: &dyn IssueStore,
        issue_id: &str,
        branch: Option<&str>,
    ) -> anyhow::Result<Option<Issue>> {
        let branch = match branch {
            Some(b) => b.to_string(),
            None => match self.current_branch() {
                Some(b) => b,
                None => {
                    anyhow::bail!("no current branch to link (detached HEAD or not a repository)")
                }
            },
        };
        let Some(issue) = store.get(issue_id)? else {
            return Ok(None);
        };
        if issue.has_branch(&branch) {
            return Ok(Some(issue));
        }
        let mut branches = issue.git_branches.clone();
        branches.push(branch);
        let update = IssueUpdate {
            git_branches: Some(branches),
            ..IssueUpdate::default()
        };
        store.update(issue_id, &update)
    }

    pub fn auto_create_issue_from_branch(
        &self,
        store: &dyn IssueStore,
        branch: Option<&str>,
    ) -> Option<Issue> {
        self.branches().auto_create_issue_from_branch(store, branch)
    }
}

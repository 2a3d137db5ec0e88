pub mod plan;

pub use plan::plan_issue_sync;

use serde::Serialize;

use roadmap_core::{Issue, IssueStatus, IssueStore};
use roadmap_git::{Commit, GitIntegration};

/// One issue's planned change, recorded in dry-run mode.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlannedSync {
    pub issue_id: String,
    pub new_commits: usize,
    pub status: Option<IssueStatus>,
    pub progress_percentage: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct SyncReport {
    pub issues_scanned: usize,
    pub issues_updated: usize,
    pub commits_linked: usize,
    /// `(issue_id, message)` for every issue that failed to sync.
    pub errors: Vec<(String, String)>,
    /// Filled only in dry-run mode.
    pub planned: Vec<PlannedSync>,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Reconciles issues with the commits that reference them.
pub struct SyncOrchestrator<'a> {
    integration: &'a GitIntegration,
    store: &'a dyn IssueStore,
    dry_run: bool,
}

impl<'a> SyncOrchestrator<'a> {
    pub fn new(integration: &'a GitIntegration, store: &'a dyn IssueStore) -> Self {
        Self {
            integration,
            store,
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Apply every issue's planned update. A failing issue is recorded in
    /// the report and the batch carries on.
    pub fn sync_all(&self, issues: &[Issue], commits: &[Commit]) -> SyncReport {
        let now = roadmap_core::now_utc();
        let mut report = SyncReport {
            issues_scanned: issues.len(),
            ..SyncReport::default()
        };
        for issue in issues {
            let Some(update) = plan_issue_sync(issue, commits, now) else {
                continue;
            };
            let new_commits = update
                .git_commits
                .as_ref()
                .map_or(0, |log| log.len().saturating_sub(issue.git_commits.len()));

            if self.dry_run {
                report.planned.push(PlannedSync {
                    issue_id: issue.id.clone(),
                    new_commits,
                    status: update.status,
                    progress_percentage: update.progress_percentage,
                });
                continue;
            }

            match self.store.update(&issue.id, &update) {
                Ok(Some(_)) => {
                    report.issues_updated += 1;
                    report.commits_linked += new_commits;
                }
                Ok(None) => {
                    report
                        .errors
                        .push((issue.id.clone(), "issue no longer exists".to_string()));
                }
                Err(e) => {
                    tracing::warn!(issue = %issue.id, error = %e, "issue sync failed");
                    report.errors.push((issue.id.clone(), format!("{e:#}")));
                }
            }
        }
        report
    }

    /// Sync every stored issue against the given commits.
    pub fn sync_commits(&self, commits: &[Commit]) -> anyhow::Result<SyncReport> {
        let issues = self.store.list()?;
        Ok(self.sync_all(&issues, commits))
    }

    /// Sync every stored issue against the last `count` commits on HEAD.
    pub fn sync_repository(&self, count: usize) -> anyhow::Result<SyncReport> {
        if !self.integration.is_repository() {
            anyhow::bail!("not inside a git repository");
        }
        let commits = self.integration.commits().recent_commits(count, None);
        self.sync_commits(&commits)
    }

    /// Single-issue sync over the configured commit window.
    /// `Ok(None)` when the issue doesn't exist; unchanged issues come back as-is.
    pub fn update_issue_from_git_activity(&self, issue_id: &str) -> anyhow::Result<Option<Issue>> {
        let Some(issue) = self.store.get(issue_id)? else {
            return Ok(None);
        };
        let commits = self.integration.commits_for_issue(&issue.id, None);
        match plan_issue_sync(&issue, &commits, roadmap_core::now_utc()) {
            Some(update) if !self.dry_run => self.store.update(&issue.id, &update),
            _ => Ok(Some(issue)),
        }
    }
}

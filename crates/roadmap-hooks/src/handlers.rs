//! What an installed hook does once it re-enters the binary.
//!
//! Handlers run inline inside the user's git command, so they stay cheap
//! and never fail: every error becomes an `Error` line in the activity log.

use roadmap_core::refs::clamp_progress;
use roadmap_core::{
    GitCommitRecord, IssueStatus, IssueStore, IssueUpdate, RoadmapConfig, RoadmapPaths,
};
use roadmap_git::{Commit, GitExecutor, GitIntegration, RepoContext};
use roadmap_store::JsonIssueStore;
use roadmap_sync::SyncOrchestrator;

use crate::activity::{ActivityLog, ActivityType};
use crate::registry::HookEvent;

/// Entry point for `roadmap internal-hook-handler <event> [args..]`.
///
/// Does nothing outside a repository or when the repository has no
/// `.roadmap/` workspace.
pub fn run_hook(ctx: RepoContext, event: &str, args: &[String]) {
    let executor = GitExecutor::new(ctx.clone());
    let Some(root) = executor.repo_root() else {
        tracing::debug!(event, "hook fired outside a repository");
        return;
    };
    let paths = RoadmapPaths::discover(root);
    if !paths.is_initialized() {
        tracing::debug!(event, "no roadmap workspace, hook ignored");
        return;
    }
    let log = ActivityLog::for_repo(&executor);
    let event: HookEvent = match event.parse() {
        Ok(e) => e,
        Err(e) => {
            log.record(ActivityType::Error, &e.to_string());
            return;
        }
    };

    let config = RoadmapConfig::load(&paths);
    let integration = GitIntegration::new(ctx, config.git);
    let store = JsonIssueStore::new(paths);
    HookRunner::new(&integration, &store, log).run(event, args);
}

pub struct HookRunner<'a> {
    integration: &'a GitIntegration,
    store: &'a dyn IssueStore,
    log: ActivityLog,
}

impl<'a> HookRunner<'a> {
    pub fn new(
        integration: &'a GitIntegration,
        store: &'a dyn IssueStore,
        log: ActivityLog,
    ) -> Self {
        Self {
            integration,
            store,
            log,
        }
    }

    pub fn run(&self, event: HookEvent, args: &[String]) {
        let result = match event {
            HookEvent::PostCommit => self.on_commit(),
            HookEvent::PostCheckout => self.on_checkout(args),
            HookEvent::PrePush => self.on_pre_push(),
            HookEvent::PostMerge => self.on_merge(),
        };
        if let Err(e) = result {
            tracing::debug!(%event, error = %e, "hook handler failed");
            self.log.record(ActivityType::Error, &format!("{event}: {e:#}"));
        }
    }

    fn on_commit(&self) -> anyhow::Result<()> {
        let Some(commit) = self.integration.commits().commit("HEAD") else {
            return Ok(());
        };
        self.log.record(
            ActivityType::Commit,
            &format!("{} {}", commit.short_hash(), commit.message),
        );
        for id in commit.roadmap_references() {
            if let Err(e) = self.link_commit(&id, &commit) {
                self.log
                    .record(ActivityType::Error, &format!("post-commit {id}: {e:#}"));
            }
        }
        Ok(())
    }

    /// Append `commit` to the issue's log and apply what its message implies.
    /// Closed issues only get the log entry.
    fn link_commit(&self, issue_id: &str, commit: &Commit) -> anyhow::Result<()> {
        let Some(issue) = self.store.get(issue_id)? else {
            return Ok(());
        };
        if issue.has_commit(&commit.hash) {
            return Ok(());
        }
        let mut log = issue.git_commits.clone();
        log.push(GitCommitRecord {
            hash: commit.hash.clone(),
            message: commit.message.clone(),
            timestamp: commit.timestamp,
            progress: commit.progress().map(clamp_progress),
            completion: commit.is_completion(),
        });
        let mut update = IssueUpdate {
            git_commits: Some(log),
            ..IssueUpdate::default()
        };

        let proposed = commit.updates();
        if !issue.status.is_closed() {
            update.progress_percentage = proposed.progress_percentage;
            if let Some(status) = proposed.status.filter(|s| *s != issue.status) {
                update.status = Some(status);
                if status.is_closed() {
                    update.completed_date = Some(roadmap_core::now_utc());
                }
            }
        }

        self.store.update(issue_id, &update)?;
        let mut detail = format!("{issue_id}: linked {}", commit.short_hash());
        if let Some(status) = update.status {
            detail.push_str(&format!(", status {status}"));
        }
        if let Some(progress) = update.progress_percentage {
            detail.push_str(&format!(", progress {progress}%"));
        }
        self.log.record(ActivityType::IssueUpdate, &detail);
        Ok(())
    }

    /// Args are git's `<prev-head> <new-head> <branch-flag>`; file checkouts
    /// (flag 0) are ignored.
    fn on_checkout(&self, args: &[String]) -> anyhow::Result<()> {
        if args.get(2).map(String::as_str) == Some("0") {
            return Ok(());
        }
        let Some(branch) = self.integration.current_branch() else {
            return Ok(());
        };
        self.log.record(ActivityType::Checkout, &branch);
        let config = self.integration.config();

        match self.integration.issue_for_branch(self.store, &branch)? {
            Some(issue) if config.auto_link_branches => {
                let newly_linked = !issue.has_branch(&branch);
                if newly_linked {
                    self.integration
                        .link_branch_to_issue(self.store, &issue.id, Some(&branch))?;
                }
                let started = issue.status == IssueStatus::Todo;
                if started {
                    let update = IssueUpdate {
                        status: Some(IssueStatus::InProgress),
                        ..IssueUpdate::default()
                    };
                    self.store.update(&issue.id, &update)?;
                }
                if newly_linked || started {
                    let mut detail = format!("{}: linked branch {branch}", issue.id);
                    if started {
                        detail.push_str(", status in-progress");
                    }
                    self.log.record(ActivityType::IssueUpdate, &detail);
                }
            }
            Some(_) => {}
            None if config.auto_create_issues => {
                if let Some(created) = self
                    .integration
                    .auto_create_issue_from_branch(self.store, Some(&branch))
                {
                    self.log.record(
                        ActivityType::IssueCreated,
                        &format!("{}: {} (from {branch})", created.id, created.title),
                    );
                }
            }
            None => {}
        }
        Ok(())
    }

    fn on_pre_push(&self) -> anyhow::Result<()> {
        let commits = self.window();
        self.log.record(
            ActivityType::PrePush,
            &format!("scanning {} commits", commits.len()),
        );
        self.sync(&commits)
    }

    fn on_merge(&self) -> anyhow::Result<()> {
        let commits = self
            .integration
            .commits()
            .commits_in_range("ORIG_HEAD..HEAD")
            .unwrap_or_else(|| self.window());
        self.log.record(
            ActivityType::Merge,
            &format!("scanning {} commits", commits.len()),
        );
        self.sync(&commits)
    }

    fn window(&self) -> Vec<Commit> {
        let count = self.integration.config().hook_commit_window;
        self.integration.commits().recent_commits(count, None)
    }

    fn sync(&self, commits: &[Commit]) -> anyhow::Result<()> {
        let report = SyncOrchestrator::new(self.integration, self.store).sync_commits(commits)?;
        for (id, message) in &report.errors {
            self.log
                .record(ActivityType::Error, &format!("sync {id}: {message}"));
        }
        self.log.record(
            ActivityType::Sync,
            &format!(
                "{} issues updated, {} commits linked",
                report.issues_updated, report.commits_linked
            ),
        );
        Ok(())
    }
}

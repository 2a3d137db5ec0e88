use std::collections::HashSet;
use time::OffsetDateTime;

use roadmap_core::refs::clamp_progress;
use roadmap_core::{GitCommitRecord, Issue, IssueStatus, IssueUpdate};
use roadmap_git::Commit;

/// Work out what syncing `commits` into `issue` would change.
///
/// `commits` is expected in `git log` order (newest first). Only commits that
/// reference the issue and are not yet in its log are considered; they are
/// appended oldest first. Returns `None` when nothing qualifies, so an issue
/// without new activity is never touched.
pub fn plan_issue_sync(
    issue: &Issue,
    commits: &[Commit],
    now: OffsetDateTime,
) -> Option<IssueUpdate> {
    let mut seen = HashSet::new();
    let mut fresh: Vec<&Commit> = commits
        .iter()
        .filter(|c| c.references(&issue.id))
        .filter(|c| !issue.has_commit(&c.hash))
        .filter(|c| seen.insert(c.hash.as_str()))
        .collect();
    if fresh.is_empty() {
        return None;
    }
    // Oldest first; equal timestamps keep chronological (reverse log) order.
    fresh.reverse();
    fresh.sort_by_key(|c| c.timestamp);

    let mut max_progress: Option<f64> = None;
    let mut completion = false;
    let mut records = Vec::with_capacity(fresh.len());
    for commit in &fresh {
        let progress = commit.progress().map(clamp_progress);
        if let Some(p) = progress {
            if max_progress.map_or(true, |max| p > max) {
                max_progress = Some(p);
            }
        }
        completion |= commit.is_completion();
        records.push(GitCommitRecord {
            hash: commit.hash.clone(),
            message: commit.message.clone(),
            timestamp: commit.timestamp,
            progress,
            completion: false,
        });
    }
    if completion {
        if let Some(last) = records.last_mut() {
            last.completion = true;
        }
    }

    let mut log = issue.git_commits.clone();
    log.extend(records);
    let mut update = IssueUpdate {
        git_commits: Some(log),
        ..IssueUpdate::default()
    };

    if completion {
        update.progress_percentage = Some(100.0);
    } else if let Some(p) = max_progress {
        update.progress_percentage = Some(p);
    }

    if completion && !issue.status.is_closed() {
        update.status = Some(IssueStatus::Closed);
        update.completed_date = Some(now);
    } else if max_progress.is_some_and(|p| p > 0.0) && issue.status == IssueStatus::Todo {
        update.status = Some(IssueStatus::InProgress);
    }
    Some(update)
}

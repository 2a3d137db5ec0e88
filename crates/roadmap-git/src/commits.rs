use serde::Serialize;
use std::collections::BTreeSet;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use roadmap_core::refs::{self, ProposedUpdate};

use crate::exec::GitExecutor;

/// Commits scanned when a caller doesn't ask for a specific window.
pub const DEFAULT_COMMIT_WINDOW: usize = 100;

const LOG_FORMAT: &str = "--pretty=format:%H|%an|%aI|%s";

/// An immutable snapshot of one commit, rebuilt from `git log` on every query.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Commit {
    pub hash: String,
    pub author: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub message: String,
    pub files_changed: Vec<String>,
    pub insertions: u64,
    pub deletions: u64,
}

impl Commit {
    pub fn short_hash(&self) -> &str {
        &self.hash[..self.hash.len().min(8)]
    }

    pub fn roadmap_references(&self) -> BTreeSet<String> {
        refs::extract_references(&self.message)
    }

    pub fn references(&self, issue_id: &str) -> bool {
        self.roadmap_references()
            .contains(&issue_id.to_ascii_lowercase())
    }

    pub fn progress(&self) -> Option<f64> {
        refs::extract_progress(&self.message)
    }

    pub fn is_completion(&self) -> bool {
        refs::is_completion(&self.message)
    }

    pub fn is_wip(&self) -> bool {
        refs::is_wip(&self.message)
    }

    pub fn updates(&self) -> ProposedUpdate {
        refs::updates_from_message(&self.message)
    }
}

/// Parse one `hash|author|date|subject` line. `None` for malformed lines.
pub fn parse_log_line(line: &str) -> Option<Commit> {
    let mut fields = line.splitn(4, '|');
    let hash = fields.next()?.trim();
    let author = fields.next()?;
    let date = fields.next()?;
    let message = fields.next()?;
    if hash.is_empty() || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let timestamp = OffsetDateTime::parse(date.trim(), &Rfc3339).ok()?;
    Some(Commit {
        hash: hash.to_string(),
        author: author.to_string(),
        timestamp,
        message: message.to_string(),
        files_changed: Vec::new(),
        insertions: 0,
        deletions: 0,
    })
}

/// Parse `git show --numstat` output into (files, insertions, deletions).
/// Binary files report `-` counts and contribute zero lines.
pub fn parse_numstat(text: &str) -> (Vec<String>, u64, u64) {
    let mut files = Vec::new();
    let mut insertions = 0;
    let mut deletions = 0;
    for line in text.lines() {
        let mut cols = line.splitn(3, '\t');
        let (Some(ins), Some(del), Some(path)) = (cols.next(), cols.next(), cols.next()) else {
            continue;
        };
        insertions += ins.parse::<u64>().unwrap_or(0);
        deletions += del.parse::<u64>().unwrap_or(0);
        files.push(path.to_string());
    }
    (files, insertions, deletions)
}

pub struct CommitAnalyzer<'a> {
    git: &'a GitExecutor,
}

impl<'a> CommitAnalyzer<'a> {
    pub fn new(git: &'a GitExecutor) -> Self {
        Self { git }
    }

    /// The most recent `count` commits on HEAD, newest first.
    /// `since` is passed to `git log --since` (e.g. `2 weeks ago`, `2026-01-01`).
    pub fn recent_commits(&self, count: usize, since: Option<&str>) -> Vec<Commit> {
        let count_arg = format!("-n{count}");
        let since_arg = since.map(|s| format!("--since={s}"));
        let mut args = vec!["log", count_arg.as_str(), LOG_FORMAT];
        if let Some(since) = since_arg.as_deref() {
            args.push(since);
        }
        self.log(&args)
    }

    /// Commits in a revision range such as `ORIG_HEAD..HEAD`.
    /// `None` when the range can't be resolved.
    pub fn commits_in_range(&self, range: &str) -> Option<Vec<Commit>> {
        let output = self.git.run(&["log", LOG_FORMAT, range])?;
        Some(self.parse_log(&output))
    }

    /// A single commit by revision (`HEAD`, a hash, a branch).
    pub fn commit(&self, rev: &str) -> Option<Commit> {
        let output = self.git.run(&["log", "-n1", LOG_FORMAT, rev])?;
        self.parse_log(&output).into_iter().next()
    }

    /// Commits in the default window whose references include `issue_id`.
    pub fn commits_referencing(&self, issue_id: &str, since: Option<&str>) -> Vec<Commit> {
        self.commits_referencing_in(issue_id, DEFAULT_COMMIT_WINDOW, since)
    }

    pub fn commits_referencing_in(
        &self,
        issue_id: &str,
        count: usize,
        since: Option<&str>,
    ) -> Vec<Commit> {
        self.recent_commits(count, since)
            .into_iter()
            .filter(|c| c.references(issue_id))
            .collect()
    }

    pub fn updates_from(&self, commit: &Commit) -> ProposedUpdate {
        commit.updates()
    }

    fn log(&self, args: &[&str]) -> Vec<Commit> {
        match self.git.run(args) {
            Some(output) => self.parse_log(&output),
            None => Vec::new(),
        }
    }

    fn parse_log(&self, output: &str) -> Vec<Commit> {
        output
            .lines()
            .filter(|l| !l.trim().is_empty())
            .filter_map(|line| {
                let parsed = parse_log_line(line);
                if parsed.is_none() {
                    tracing::debug!(line, "skipping malformed log line");
                }
                parsed
            })
            .map(|mut commit| {
                self.attach_stats(&mut commit);
                commit
            })
            .collect()
    }

    fn attach_stats(&self, commit: &mut Commit) {
        if let Some(stats) = self
            .git
            .run(&["show", "--numstat", "--format=", &commit.hash])
        {
            let (files, ins, del) = parse_numstat(&stats);
            commit.files_changed = files;
            commit.insertions = ins;
            commit.deletions = del;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::RepoContext;
    use crate::test_support::{commit_file, init_repo};
    use roadmap_core::IssueStatus;

    #[test]
    fn parse_log_line_fields() {
        let c = parse_log_line(
            "0123456789abcdef0123456789abcdef01234567|Ada Lovelace|2026-03-01T10:00:00+01:00|Add parser | with pipe",
        )
        .unwrap();
        assert_eq!(c.author, "Ada Lovelace");
        assert_eq!(c.message, "Add parser | with pipe");
        assert_eq!(c.short_hash(), "01234567");
        assert_eq!(c.timestamp.year(), 2026);
    }

    #[test]
    fn malformed_lines_are_rejected() {
        assert!(parse_log_line("abc|only two").is_none());
        assert!(parse_log_line("abcdef|me|not-a-date|msg").is_none());
        assert!(parse_log_line("zzzz|me|2026-03-01T10:00:00Z|msg").is_none());
    }

    #[test]
    fn numstat_counts_and_binary_files() {
        let (files, ins, del) =
            parse_numstat("3\t1\tsrc/lib.rs\n-\t-\tlogo.png\n10\t0\tREADME.md\n");
        assert_eq!(files, vec!["src/lib.rs", "logo.png", "README.md"]);
        assert_eq!(ins, 13);
        assert_eq!(del, 1);
    }

    #[test]
    fn commit_derived_signals() {
        let mut c = parse_log_line("abcdef12|me|2026-03-01T10:00:00Z|x").unwrap();
        c.message = "Login form [roadmap:ABC12345] [progress:40%]".into();
        assert!(c.references("abc12345"));
        assert_eq!(c.progress(), Some(40.0));
        assert!(!c.is_completion());
        assert!(!c.is_wip());

        c.message = "WIP: start session handling".into();
        assert!(c.is_wip());
        assert_eq!(c.updates().status, Some(IssueStatus::InProgress));
    }

    #[test]
    fn recent_commits_reads_history_with_stats() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        commit_file(dir.path(), "a.txt", "one\ntwo\n", "Start [roadmap:abc12345]");
        commit_file(dir.path(), "b.txt", "x\n", "Unrelated change");

        let exec = GitExecutor::new(RepoContext::new(dir.path()));
        let analyzer = CommitAnalyzer::new(&exec);
        let commits = analyzer.recent_commits(10, None);
        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].message, "Unrelated change");
        assert_eq!(commits[1].files_changed, vec!["a.txt"]);
        assert_eq!(commits[1].insertions, 2);
        assert_eq!(commits[1].author, "Test");

        let limited = analyzer.recent_commits(1, None);
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn commits_referencing_filters_by_id() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        commit_file(dir.path(), "a.txt", "a", "Work [roadmap:abc12345]");
        commit_file(dir.path(), "b.txt", "b", "Other [roadmap:ffff0000]");
        commit_file(dir.path(), "c.txt", "c", "fixes #abc12345");

        let exec = GitExecutor::new(RepoContext::new(dir.path()));
        let hits = CommitAnalyzer::new(&exec).commits_referencing("abc12345", None);
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|c| c.references("abc12345")));
    }

    #[test]
    fn single_commit_and_range_lookup() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        let first = commit_file(dir.path(), "a.txt", "a", "first");
        commit_file(dir.path(), "b.txt", "b", "second");
        commit_file(dir.path(), "c.txt", "c", "third");

        let exec = GitExecutor::new(RepoContext::new(dir.path()));
        let analyzer = CommitAnalyzer::new(&exec);
        assert_eq!(analyzer.commit("HEAD").unwrap().message, "third");

        let range = format!("{first}..HEAD");
        let in_range = analyzer.commits_in_range(&range).unwrap();
        assert_eq!(in_range.len(), 2);
        assert!(analyzer.commits_in_range("nope..HEAD").is_none());
    }

    #[test]
    fn empty_repository_has_no_commits() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        let exec = GitExecutor::new(RepoContext::new(dir.path()));
        assert!(CommitAnalyzer::new(&exec).recent_commits(5, None).is_empty());
    }
}

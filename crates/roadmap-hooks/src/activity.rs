use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use roadmap_git::GitExecutor;

pub const LOG_FILE_NAME: &str = "roadmap-hooks.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityType {
    Commit,
    Checkout,
    PrePush,
    Merge,
    IssueUpdate,
    IssueCreated,
    Sync,
    Error,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Commit => "Commit",
            Self::Checkout => "Checkout",
            Self::PrePush => "PrePush",
            Self::Merge => "Merge",
            Self::IssueUpdate => "IssueUpdate",
            Self::IssueCreated => "IssueCreated",
            Self::Sync => "Sync",
            Self::Error => "Error",
        }
    }
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-only `<git-dir>/roadmap-hooks.log`. Every write is best-effort.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    path: Option<PathBuf>,
}

impl ActivityLog {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// The log for a repository; a no-op sink outside one.
    pub fn for_repo(git: &GitExecutor) -> Self {
        Self {
            path: git.git_dir().map(|dir| dir.join(LOG_FILE_NAME)),
        }
    }

    pub fn record(&self, kind: ActivityType, detail: &str) {
        let Some(path) = &self.path else {
            return;
        };
        // One line per entry, whatever the detail contains.
        let detail = detail.replace(['\n', '\r'], " ");
        let line = format!("{} - {kind}: {detail}\n", roadmap_core::now_rfc3339());
        let written = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut f| f.write_all(line.as_bytes()));
        if let Err(e) = written {
            tracing::debug!(path = %path.display(), error = %e, "activity log write failed");
        }
    }

    /// The last `n` lines, oldest first. Empty when the log can't be read.
    pub fn tail(&self, n: usize) -> Vec<String> {
        let Some(content) = self
            .path
            .as_ref()
            .and_then(|p| std::fs::read_to_string(p).ok())
        else {
            return Vec::new();
        };
        let lines: Vec<&str> = content.lines().collect();
        let start = lines.len().saturating_sub(n);
        lines[start..].iter().map(|l| l.to_string()).collect()
    }
}

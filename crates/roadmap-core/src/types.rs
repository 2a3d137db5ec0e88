use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Issue ID format: 8 lowercase hex characters (e.g. `abc12345`).
pub type IssueId = String;

/// Commit hash as printed by `git log --format=%H`.
pub type CommitHash = String;

/// Lifecycle status of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum IssueStatus {
    #[default]
    Todo,
    #[serde(alias = "in_progress")]
    InProgress,
    Blocked,
    Review,
    #[serde(alias = "done")]
    Closed,
}

impl IssueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in-progress",
            Self::Blocked => "blocked",
            Self::Review => "review",
            Self::Closed => "closed",
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl std::fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "critical" => Ok(Self::Critical),
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => anyhow::bail!("unknown priority: {other} (critical, high, medium, low)"),
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IssueType {
    #[default]
    Feature,
    Bug,
    Documentation,
    Other,
}

impl IssueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Feature => "feature",
            Self::Bug => "bug",
            Self::Documentation => "documentation",
            Self::Other => "other",
        }
    }
}

impl std::str::FromStr for IssueType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "feature" => Ok(Self::Feature),
            "bug" => Ok(Self::Bug),
            "documentation" | "docs" => Ok(Self::Documentation),
            "other" => Ok(Self::Other),
            other => {
                anyhow::bail!("unknown issue type: {other} (feature, bug, documentation, other)")
            }
        }
    }
}

impl std::fmt::Display for IssueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One commit linked to an issue. The log is append-only and unique by `hash`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GitCommitRecord {
    pub hash: CommitHash,
    pub message: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    #[serde(default)]
    pub completion: bool,
}

/// The issue fields this engine reads and proposes changes to.
///
/// Every git-related field is always present: an issue with no history has
/// empty `git_commits` / `git_branches` rather than missing ones.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Issue {
    pub id: IssueId,
    pub title: String,
    #[serde(default)]
    pub status: IssueStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub issue_type: IssueType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_percentage: Option<f64>,
    #[serde(default)]
    pub git_commits: Vec<GitCommitRecord>,
    #[serde(default)]
    pub git_branches: Vec<String>,
    #[serde(default)]
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated: OffsetDateTime,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub completed_date: Option<OffsetDateTime>,
}

impl Issue {
    pub fn has_commit(&self, hash: &str) -> bool {
        self.git_commits.iter().any(|c| c.hash == hash)
    }

    pub fn has_branch(&self, branch: &str) -> bool {
        self.git_branches.iter().any(|b| b == branch)
    }
}

/// Fields accepted by `IssueStore::create`.
#[derive(Debug, Clone, Default)]
pub struct NewIssue {
    pub title: String,
    pub status: IssueStatus,
    pub priority: Priority,
    pub issue_type: IssueType,
    pub assignee: Option<String>,
    pub milestone: Option<String>,
    pub content: String,
    pub git_branches: Vec<String>,
}

impl NewIssue {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Partial update for `IssueStore::update`. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssueUpdate {
    pub status: Option<IssueStatus>,
    pub progress_percentage: Option<f64>,
    pub git_commits: Option<Vec<GitCommitRecord>>,
    pub git_branches: Option<Vec<String>>,
    pub assignee: Option<String>,
    pub milestone: Option<String>,
    pub completed_date: Option<OffsetDateTime>,
}

impl IssueUpdate {
    /// Apply this patch to an in-memory issue. Stores call this before persisting.
    pub fn apply_to(&self, issue: &mut Issue) {
        if let Some(status) = self.status {
            issue.status = status;
        }
        if let Some(progress) = self.progress_percentage {
            issue.progress_percentage = Some(progress);
        }
        if let Some(commits) = &self.git_commits {
            issue.git_commits = commits.clone();
        }
        if let Some(branches) = &self.git_branches {
            issue.git_branches = branches.clone();
        }
        if let Some(assignee) = &self.assignee {
            issue.assignee = Some(assignee.clone());
        }
        if let Some(milestone) = &self.milestone {
            issue.milestone = Some(milestone.clone());
        }
        if let Some(done) = self.completed_date {
            issue.completed_date = Some(done);
        }
    }
}

pub fn now_utc() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

pub fn now_rfc3339() -> String {
    now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default()
}

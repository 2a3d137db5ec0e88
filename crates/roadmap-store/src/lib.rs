use fs2::FileExt;
use std::fs;
use std::io::Write;
use std::path::Path;

use roadmap_core::{Issue, IssueStore, IssueUpdate, NewIssue, RoadmapPaths};

/// Atomic write: write to temp file in same dir, then rename.
pub fn write_atomic(path: &Path, data: &[u8]) -> anyhow::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("no parent dir for {}", path.display()))?;
    fs::create_dir_all(parent)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(data)?;
    tmp.flush()?;
    tmp.persist(path)?;
    Ok(())
}

/// File-based exclusive lock guard.
pub struct LockGuard {
    _file: fs::File,
}

/// Acquire an exclusive file lock (blocking). Creates the lock file if needed.
pub fn lock_file(path: &Path) -> anyhow::Result<LockGuard> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path)?;
    file.lock_exclusive()?;
    Ok(LockGuard { _file: file })
}

/// New issue id: first 8 hex chars of a random UUID.
pub fn new_issue_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Issues stored as one JSON file each under `.roadmap/issues/<id>.json`.
///
/// Writes take the workspace lock so that two hooks firing at once serialise
/// their read-modify-write of the same issue.
pub struct JsonIssueStore {
    paths: RoadmapPaths,
}

impl JsonIssueStore {
    pub fn new(paths: RoadmapPaths) -> Self {
        Self { paths }
    }

    /// Open the store for a repo root, creating `.roadmap/issues/` if needed.
    pub fn open(repo_root: &Path) -> anyhow::Result<Self> {
        let paths = RoadmapPaths::discover(repo_root);
        paths.ensure_layout()?;
        Ok(Self::new(paths))
    }

    pub fn paths(&self) -> &RoadmapPaths {
        &self.paths
    }

    fn read_issue(&self, id: &str) -> anyhow::Result<Option<Issue>> {
        let path = self.paths.issue_file(id);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        let issue: Issue = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("corrupt issue file {}: {e}", path.display()))?;
        Ok(Some(issue))
    }

    fn write_issue(&self, issue: &Issue) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(issue)?;
        write_atomic(&self.paths.issue_file(&issue.id), json.as_bytes())
    }

    fn is_valid_id(id: &str) -> bool {
        !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric())
    }
}

impl IssueStore for JsonIssueStore {
    fn get(&self, id: &str) -> anyhow::Result<Option<Issue>> {
        if !Self::is_valid_id(id) {
            return Ok(None);
        }
        self.read_issue(id)
    }

    fn create(&self, new: NewIssue) -> anyhow::Result<Issue> {
        if new.title.trim().is_empty() {
            anyhow::bail!("issue title must not be empty");
        }
        let _lock = lock_file(&self.paths.lock_file)?;
        let mut id = new_issue_id();
        while self.paths.issue_file(&id).exists() {
            id = new_issue_id();
        }
        let now = roadmap_core::now_utc();
        let issue = Issue {
            id,
            title: new.title,
            status: new.status,
            priority: new.priority,
            issue_type: new.issue_type,
            assignee: new.assignee,
            milestone: new.milestone,
            progress_percentage: None,
            git_commits: Vec::new(),
            git_branches: new.git_branches,
            content: new.content,
            created: now,
            updated: now,
            completed_date: None,
        };
        self.write_issue(&issue)?;
        Ok(issue)
    }

    fn update(&self, id: &str, update: &IssueUpdate) -> anyhow::Result<Option<Issue>> {
        if !Self::is_valid_id(id) {
            return Ok(None);
        }
        let _lock = lock_file(&self.paths.lock_file)?;
        let Some(mut issue) = self.read_issue(id)? else {
            return Ok(None);
        };
        update.apply_to(&mut issue);
        issue.updated = roadmap_core::now_utc();
        self.write_issue(&issue)?;
        Ok(Some(issue))
    }

    fn list(&self) -> anyhow::Result<Vec<Issue>> {
        let entries = match fs::read_dir(&self.paths.issues_dir) {
            Ok(e) => e,
            Err(_) => return Ok(Vec::new()),
        };
        let mut issues = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let parsed = fs::read_to_string(&path)
                .map_err(anyhow::Error::from)
                .and_then(|s| serde_json::from_str::<Issue>(&s).map_err(anyhow::Error::from));
            match parsed {
                Ok(issue) => issues.push(issue),
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "skipping unreadable issue")
                }
            }
        }
        issues.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.id.cmp(&b.id)));
        Ok(issues)
    }

    fn assign_to_milestone(&self, id: &str, milestone: &str) -> anyhow::Result<bool> {
        let update = IssueUpdate {
            milestone: Some(milestone.to_string()),
            ..Default::default()
        };
        Ok(self.update(id, &update)?.is_some())
    }
}

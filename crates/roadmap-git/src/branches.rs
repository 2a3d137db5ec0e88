use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use roadmap_core::config::DEFAULT_BRANCH_TEMPLATE;
use roadmap_core::{
    GitConfig, GitError, Issue, IssueStatus, IssueStore, IssueType, NewIssue, Priority,
};

use crate::exec::GitExecutor;
use crate::repo::RepositoryReader;

/// Long-lived branches that never map to an issue.
pub const PROTECTED_BRANCHES: &[&str] = &["main", "master", "develop", "dev"];

const SLUG_MAX_LEN: usize = 40;

/// Branch prefixes stripped when deriving an issue title.
const KNOWN_PREFIXES: &[&str] = &[
    "feature", "feat", "bugfix", "bug", "fix", "hotfix", "docs", "doc", "chore", "refactor",
];

static BRANCH_ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)(?:feature|bugfix|hotfix)/(?:issue-)?([0-9a-f]{8})").unwrap(),
        Regex::new(r"(?i)^([0-9a-f]{8})-").unwrap(),
        Regex::new(r"(?i)/([0-9a-f]{8})-").unwrap(),
    ]
});

static LEADING_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:issue-)?[0-9a-f]{8}(?:[-_/]|$)").unwrap());

/// Snapshot of one local branch at query time.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Branch {
    pub name: String,
    pub is_current: bool,
    pub remote: Option<String>,
    pub last_commit: Option<String>,
}

impl Branch {
    pub fn issue_id(&self) -> Option<String> {
        extract_issue_id(&self.name)
    }

    pub fn suggested_issue_type(&self) -> Option<IssueType> {
        suggested_issue_type(&self.name)
    }
}

/// Issue id embedded in a branch name. Hex-only, first matching pattern wins.
pub fn extract_issue_id(branch: &str) -> Option<String> {
    BRANCH_ID_PATTERNS.iter().find_map(|pat| {
        pat.captures(branch)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_ascii_lowercase())
    })
}

/// Issue type implied by the branch prefix (`feature/…`, `bugfix/…`, `docs/…`).
pub fn suggested_issue_type(branch: &str) -> Option<IssueType> {
    let (prefix, _) = branch.split_once('/')?;
    match prefix.to_ascii_lowercase().as_str() {
        "feature" | "feat" => Some(IssueType::Feature),
        "bugfix" | "bug" | "fix" | "hotfix" => Some(IssueType::Bug),
        "docs" | "doc" | "documentation" => Some(IssueType::Documentation),
        "chore" | "refactor" => Some(IssueType::Other),
        _ => None,
    }
}

/// Lowercase, hyphenated, alphanumeric slug of `title`, at most 40 chars.
pub fn slugify(title: &str) -> String {
    let kept: String = title
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || *c == '-')
        .collect();
    let slug = kept.split_whitespace().collect::<Vec<_>>().join("-");
    let slug = slug.to_ascii_lowercase();
    let truncated: String = slug.chars().take(SLUG_MAX_LEN).collect();
    truncated.trim_end_matches('-').to_string()
}

pub fn branch_prefix(issue: &Issue) -> &'static str {
    if issue.issue_type == IssueType::Bug {
        "bugfix"
    } else if issue.issue_type == IssueType::Documentation {
        "docs"
    } else if issue.priority == Priority::Critical {
        "hotfix"
    } else {
        "feature"
    }
}

/// Render a branch template. `None` on unknown placeholders or unbalanced braces.
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> Option<String> {
    let mut out = String::new();
    let mut chars = template.chars();
    while let Some(c) = chars.next() {
        match c {
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next()? {
                        '}' => break,
                        '{' => return None,
                        ch => name.push(ch),
                    }
                }
                let (_, value) = vars.iter().find(|(k, _)| *k == name)?;
                out.push_str(value);
            }
            '}' => return None,
            ch => out.push(ch),
        }
    }
    let out = out.trim_end_matches(['-', '/']).to_string();
    (!out.is_empty()).then_some(out)
}

/// Human title from a branch name: `feature/abc12345-add-user-login` → `Add User Login`.
pub fn derive_title(branch: &str) -> String {
    let mut rest = branch;
    if let Some((prefix, tail)) = branch.split_once('/') {
        if KNOWN_PREFIXES.contains(&prefix.to_ascii_lowercase().as_str()) {
            rest = tail;
        }
    }
    let rest = LEADING_ID.replace(rest, "");
    let spaced: String = rest
        .chars()
        .map(|c| if matches!(c, '-' | '_' | '/') { ' ' } else { c })
        .collect();
    spaced
        .split_whitespace()
        .enumerate()
        .map(|(i, word)| {
            let lower = word.to_lowercase();
            if i == 0 || word.chars().count() > 3 {
                capitalize(&lower)
            } else {
                lower
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// What `create_branch_for` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchOutcome {
    Created(String),
    CheckedOutExisting(String),
    AlreadyExists(String),
}

impl BranchOutcome {
    pub fn name(&self) -> &str {
        match self {
            Self::Created(n) | Self::CheckedOutExisting(n) | Self::AlreadyExists(n) => n,
        }
    }
}

pub struct BranchManager<'a> {
    git: &'a GitExecutor,
    template: Option<String>,
}

impl<'a> BranchManager<'a> {
    pub fn new(git: &'a GitExecutor, config: &GitConfig) -> Self {
        Self {
            git,
            template: config.branch_template.clone(),
        }
    }

    pub fn current_branch(&self) -> Option<String> {
        RepositoryReader::new(self.git).current_branch()
    }

    pub fn list_branches(&self) -> Vec<Branch> {
        let Some(output) = self.git.run(&[
            "branch",
            "--format=%(HEAD)|%(refname:short)|%(upstream:short)|%(objectname)",
        ]) else {
            return Vec::new();
        };
        output
            .lines()
            .filter_map(|line| {
                let mut cols = line.splitn(4, '|');
                let head = cols.next()?;
                let name = cols.next()?.trim();
                if name.is_empty() || name.starts_with('(') {
                    // "(HEAD detached at …)"
                    return None;
                }
                let non_empty = |s: Option<&str>| {
                    s.map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                };
                Some(Branch {
                    name: name.to_string(),
                    is_current: head.trim() == "*",
                    remote: non_empty(cols.next()),
                    last_commit: non_empty(cols.next()),
                })
            })
            .collect()
    }

    pub fn branch_exists(&self, name: &str) -> bool {
        let reference = format!("refs/heads/{name}");
        self.git
            .run_ok(&["rev-parse", "--verify", "--quiet", &reference])
    }

    /// Modified, staged, or deleted tracked files. Untracked files don't count.
    pub fn has_tracked_changes(&self) -> bool {
        self.git
            .run(&["status", "--porcelain"])
            .map(|out| {
                out.lines()
                    .any(|l| !l.trim().is_empty() && !l.starts_with("??"))
            })
            .unwrap_or(false)
    }

    pub fn suggest_name(&self, issue: &Issue) -> String {
        let prefix = branch_prefix(issue);
        let slug = slugify(&issue.title);
        let vars = [
            ("prefix", prefix),
            ("id", issue.id.as_str()),
            ("slug", slug.as_str()),
            ("title", slug.as_str()),
            ("type", issue.issue_type.as_str()),
        ];
        if let Some(template) = self.template.as_deref() {
            if let Some(name) = render_template(template, &vars) {
                return name;
            }
            tracing::debug!(template, "branch template failed to render, using default");
        }
        render_template(DEFAULT_BRANCH_TEMPLATE, &vars)
            .unwrap_or_else(|| format!("{prefix}/{}", issue.id))
    }

    pub fn create_branch_for(
        &self,
        issue: &Issue,
        checkout: bool,
        force: bool,
    ) -> Result<BranchOutcome, GitError> {
        if !self.git.is_repository() {
            return Err(GitError::NotARepository);
        }
        let name = self.suggest_name(issue);
        if !force && self.has_tracked_changes() {
            return Err(GitError::DirtyWorkingTree);
        }

        if self.branch_exists(&name) {
            if !checkout {
                return Ok(BranchOutcome::AlreadyExists(name));
            }
            let args = ["checkout", name.as_str()];
            self.git
                .run(&args)
                .ok_or_else(|| GitError::command_failed(&args))?;
            return Ok(BranchOutcome::CheckedOutExisting(name));
        }

        let previous = self.current_branch();
        let args = ["checkout", "-b", name.as_str()];
        self.git
            .run(&args)
            .ok_or_else(|| GitError::command_failed(&args))?;

        if !checkout {
            if let Some(prev) = previous.as_deref() {
                let args = ["checkout", prev];
                self.git
                    .run(&args)
                    .ok_or_else(|| GitError::command_failed(&args))?;
            }
        }
        Ok(BranchOutcome::Created(name))
    }

    /// Every local branch whose name carries an issue id.
    pub fn branch_issue_map(&self) -> BTreeMap<String, String> {
        self.list_branches()
            .into_iter()
            .filter_map(|b| b.issue_id().map(|id| (b.name, id)))
            .collect()
    }

    /// Create an in-progress issue for a branch that doesn't map to one yet.
    ///
    /// Returns `None` (never an error) for protected branches, branches that
    /// already resolve to an issue, names that yield no title, and store failures.
    pub fn auto_create_issue_from_branch(
        &self,
        store: &dyn IssueStore,
        branch: Option<&str>,
    ) -> Option<Issue> {
        let name = match branch {
            Some(b) => b.to_string(),
            None => self.current_branch()?,
        };
        if PROTECTED_BRANCHES.contains(&name.as_str()) {
            return None;
        }
        if let Some(id) = extract_issue_id(&name) {
            match store.get(&id) {
                Ok(None) => {}
                Ok(Some(_)) => return None,
                Err(e) => {
                    tracing::warn!(branch = %name, error = %e, "issue lookup failed");
                    return None;
                }
            }
        }
        match store.list() {
            Ok(issues) if issues.iter().any(|i| i.has_branch(&name)) => return None,
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(branch = %name, error = %e, "issue listing failed");
                return None;
            }
        }
        let title = derive_title(&name);
        if title.is_empty() {
            return None;
        }
        let assignee = RepositoryReader::new(self.git)
            .user_name()
            .unwrap_or_else(|| "Unknown".to_string());
        let new = NewIssue {
            title,
            status: IssueStatus::InProgress,
            issue_type: suggested_issue_type(&name).unwrap_or_default(),
            assignee: Some(assignee),
            content: format!("Auto-created from branch `{name}`."),
            git_branches: vec![name.clone()],
            ..NewIssue::default()
        };
        match store.create(new) {
            Ok(issue) => Some(issue),
            Err(e) => {
                tracing::warn!(branch = %name, error = %e, "auto-create issue failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::RepoContext;
    use crate::test_support::{commit_file, git, init_repo};
    use roadmap_store::JsonIssueStore;

    fn issue(id: &str, title: &str) -> Issue {
        let now = roadmap_core::now_utc();
        Issue {
            id: id.into(),
            title: title.into(),
            status: IssueStatus::Todo,
            priority: Priority::Medium,
            issue_type: IssueType::Feature,
            assignee: None,
            milestone: None,
            progress_percentage: None,
            git_commits: Vec::new(),
            git_branches: Vec::new(),
            content: String::new(),
            created: now,
            updated: now,
            completed_date: None,
        }
    }

    fn repo_with_commit() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        commit_file(dir.path(), "README", "hi\n", "init");
        dir
    }

    #[test]
    fn extract_issue_id_patterns() {
        assert_eq!(extract_issue_id("feature/abc12345-fix-login").as_deref(), Some("abc12345"));
        assert_eq!(extract_issue_id("bugfix/issue-deadbeef").as_deref(), Some("deadbeef"));
        assert_eq!(extract_issue_id("hotfix/DEADBEEF-crash").as_deref(), Some("deadbeef"));
        assert_eq!(extract_issue_id("abc12345-quick-fix").as_deref(), Some("abc12345"));
        assert_eq!(extract_issue_id("user/abc12345-spike").as_deref(), Some("abc12345"));
        assert_eq!(extract_issue_id("main"), None);
        assert_eq!(extract_issue_id("develop"), None);
        assert_eq!(extract_issue_id("feature/login-page"), None);
        assert_eq!(extract_issue_id("feature/zzzzzzzz-x"), None);
        assert_eq!(
            extract_issue_id("feature/abc12345_login-page").as_deref(),
            Some("abc12345")
        );
        assert_eq!(
            extract_issue_id("bugfix/abc123456789-crash").as_deref(),
            Some("abc12345")
        );
    }

    #[test]
    fn branch_type_from_prefix() {
        assert_eq!(suggested_issue_type("feature/abc12345-fix-login"), Some(IssueType::Feature));
        assert_eq!(suggested_issue_type("hotfix/x"), Some(IssueType::Bug));
        assert_eq!(suggested_issue_type("docs/readme"), Some(IssueType::Documentation));
        assert_eq!(suggested_issue_type("main"), None);
        assert_eq!(suggested_issue_type("wip/thing"), None);
    }

    #[test]
    fn slugify_rules() {
        assert_eq!(slugify("Fix Login: OAuth & SSO!"), "fix-login-oauth-sso");
        assert_eq!(slugify("  spaced   out  "), "spaced-out");
        let long =
            slugify("a very long title that keeps going well past the forty character limit");
        assert!(long.len() <= 40);
        assert!(!long.ends_with('-'));
    }

    #[test]
    fn prefix_selection() {
        let mut i = issue("abc12345", "x");
        assert_eq!(branch_prefix(&i), "feature");
        i.priority = Priority::Critical;
        assert_eq!(branch_prefix(&i), "hotfix");
        i.issue_type = IssueType::Documentation;
        assert_eq!(branch_prefix(&i), "docs");
        i.issue_type = IssueType::Bug;
        assert_eq!(branch_prefix(&i), "bugfix");
    }

    #[test]
    fn template_rendering_and_fallback() {
        let vars = [("prefix", "feature"), ("id", "abc12345"), ("slug", "login")];
        assert_eq!(
            render_template("{prefix}/{id}-{slug}", &vars).as_deref(),
            Some("feature/abc12345-login")
        );
        assert_eq!(render_template("{unknown}/{id}", &vars), None);
        assert_eq!(render_template("{prefix/{id}", &vars), None);
        assert_eq!(render_template("prefix}/{id}", &vars), None);
        assert_eq!(render_template("{id", &vars), None);
    }

    #[test]
    fn suggest_name_uses_template_or_default() {
        let dir = repo_with_commit();
        let exec = GitExecutor::new(RepoContext::new(dir.path()));
        let i = issue("abc12345", "Fix login page");

        let default = BranchManager::new(&exec, &GitConfig::default());
        assert_eq!(default.suggest_name(&i), "feature/abc12345-fix-login-page");

        let cfg = GitConfig {
            branch_template: Some("{type}/{slug}-{id}".into()),
            ..GitConfig::default()
        };
        assert_eq!(
            BranchManager::new(&exec, &cfg).suggest_name(&i),
            "feature/fix-login-page-abc12345"
        );

        let broken = GitConfig {
            branch_template: Some("{nope}".into()),
            ..GitConfig::default()
        };
        assert_eq!(
            BranchManager::new(&exec, &broken).suggest_name(&i),
            "feature/abc12345-fix-login-page"
        );
    }

    #[test]
    fn derive_title_rules() {
        assert_eq!(derive_title("feature/abc12345-add-user-login"), "Add User Login");
        assert_eq!(derive_title("bugfix/issue-deadbeef_fix_the_bug"), "Fix the bug");
        assert_eq!(derive_title("the-api-docs"), "The api Docs");
        assert_eq!(derive_title("feature/abc12345"), "");
    }

    #[test]
    fn create_branch_and_checkout() {
        let dir = repo_with_commit();
        let exec = GitExecutor::new(RepoContext::new(dir.path()));
        let mgr = BranchManager::new(&exec, &GitConfig::default());
        let i = issue("abc12345", "Fix login");

        let out = mgr.create_branch_for(&i, true, false).unwrap();
        assert_eq!(out, BranchOutcome::Created("feature/abc12345-fix-login".into()));
        assert_eq!(mgr.current_branch().as_deref(), Some("feature/abc12345-fix-login"));

        git(dir.path(), &["checkout", "-q", "main"]);
        let again = mgr.create_branch_for(&i, true, false).unwrap();
        assert!(matches!(again, BranchOutcome::CheckedOutExisting(_)));
        assert_eq!(mgr.current_branch().as_deref(), Some("feature/abc12345-fix-login"));

        let noop = mgr.create_branch_for(&i, false, false).unwrap();
        assert!(matches!(noop, BranchOutcome::AlreadyExists(_)));
    }

    #[test]
    fn create_without_checkout_restores_previous_branch() {
        let dir = repo_with_commit();
        let exec = GitExecutor::new(RepoContext::new(dir.path()));
        let mgr = BranchManager::new(&exec, &GitConfig::default());

        let out = mgr
            .create_branch_for(&issue("deadbeef", "Write docs"), false, false)
            .unwrap();
        assert!(matches!(out, BranchOutcome::Created(_)));
        assert_eq!(mgr.current_branch().as_deref(), Some("main"));
        assert!(mgr.branch_exists("feature/deadbeef-write-docs"));
    }

    #[test]
    fn tracked_changes_block_unless_forced() {
        let dir = repo_with_commit();
        let exec = GitExecutor::new(RepoContext::new(dir.path()));
        let mgr = BranchManager::new(&exec, &GitConfig::default());
        let i = issue("abc12345", "Fix login");

        std::fs::write(dir.path().join("scratch.txt"), "untracked").unwrap();
        assert!(!mgr.has_tracked_changes());

        std::fs::write(dir.path().join("README"), "changed\n").unwrap();
        assert!(mgr.has_tracked_changes());
        assert!(matches!(
            mgr.create_branch_for(&i, true, false),
            Err(GitError::DirtyWorkingTree)
        ));
        assert!(mgr.create_branch_for(&i, true, true).is_ok());
    }

    #[test]
    fn untracked_files_do_not_block_creation() {
        let dir = repo_with_commit();
        let exec = GitExecutor::new(RepoContext::new(dir.path()));
        let mgr = BranchManager::new(&exec, &GitConfig::default());
        std::fs::write(dir.path().join("notes.md"), "ideas").unwrap();
        assert!(mgr
            .create_branch_for(&issue("abc12345", "Explore"), true, false)
            .is_ok());
    }

    #[test]
    fn create_outside_repository_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let exec = GitExecutor::new(RepoContext::new(dir.path()));
        let mgr = BranchManager::new(&exec, &GitConfig::default());
        assert!(matches!(
            mgr.create_branch_for(&issue("abc12345", "x"), true, false),
            Err(GitError::NotARepository)
        ));
    }

    #[test]
    fn list_branches_and_issue_map() {
        let dir = repo_with_commit();
        git(dir.path(), &["branch", "feature/abc12345-login"]);
        git(dir.path(), &["branch", "experiment"]);

        let exec = GitExecutor::new(RepoContext::new(dir.path()));
        let mgr = BranchManager::new(&exec, &GitConfig::default());
        let branches = mgr.list_branches();
        assert_eq!(branches.len(), 3);
        let main = branches.iter().find(|b| b.name == "main").unwrap();
        assert!(main.is_current);
        assert!(main.last_commit.is_some());
        assert_eq!(main.remote, None);

        let map = mgr.branch_issue_map();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("feature/abc12345-login").map(String::as_str), Some("abc12345"));
    }

    #[test]
    fn auto_create_skips_protected_and_known_branches() {
        let dir = repo_with_commit();
        let store_dir = tempfile::tempdir().unwrap();
        let store = JsonIssueStore::open(store_dir.path()).unwrap();
        let exec = GitExecutor::new(RepoContext::new(dir.path()));
        let mgr = BranchManager::new(&exec, &GitConfig::default());

        for name in PROTECTED_BRANCHES {
            assert!(mgr.auto_create_issue_from_branch(&store, Some(name)).is_none());
        }
        assert!(mgr.auto_create_issue_from_branch(&store, None).is_none());

        let existing = store.create(NewIssue::titled("Login")).unwrap();
        let branch = format!("feature/{}-login", existing.id);
        assert!(mgr.auto_create_issue_from_branch(&store, Some(&branch)).is_none());
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn auto_create_builds_issue_from_branch_name() {
        let dir = repo_with_commit();
        let store_dir = tempfile::tempdir().unwrap();
        let store = JsonIssueStore::open(store_dir.path()).unwrap();
        let exec = GitExecutor::new(RepoContext::new(dir.path()));
        let mgr = BranchManager::new(&exec, &GitConfig::default());

        let created = mgr
            .auto_create_issue_from_branch(&store, Some("bugfix/fix-crash-on-save"))
            .unwrap();
        assert_eq!(created.title, "Fix Crash on Save");
        assert_eq!(created.status, IssueStatus::InProgress);
        assert_eq!(created.issue_type, IssueType::Bug);
        assert_eq!(created.assignee.as_deref(), Some("Test"));
        assert!(created.content.contains("bugfix/fix-crash-on-save"));
        assert_eq!(created.git_branches, vec!["bugfix/fix-crash-on-save"]);

        // Linked through git_branches, so a second checkout doesn't duplicate it.
        assert!(mgr
            .auto_create_issue_from_branch(&store, Some("bugfix/fix-crash-on-save"))
            .is_none());
        assert_eq!(store.list().unwrap().len(), 1);
    }
}

use serde::Serialize;
use std::path::PathBuf;

use crate::exec::GitExecutor;

/// Repo-level facts, read fresh on every call.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct RepositoryInfo {
    pub root: Option<PathBuf>,
    pub remote_url: Option<String>,
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub current_branch: Option<String>,
    pub commit_count: Option<u64>,
}

pub struct RepositoryReader<'a> {
    git: &'a GitExecutor,
}

impl<'a> RepositoryReader<'a> {
    pub fn new(git: &'a GitExecutor) -> Self {
        Self { git }
    }

    pub fn remote_url(&self) -> Option<String> {
        self.git
            .run(&["config", "--get", "remote.origin.url"])
            .filter(|s| !s.is_empty())
    }

    /// Current branch name, or `None` when detached or outside a repo.
    pub fn current_branch(&self) -> Option<String> {
        self.git
            .run(&["branch", "--show-current"])
            .filter(|s| !s.is_empty())
    }

    pub fn commit_count(&self) -> Option<u64> {
        self.git
            .run(&["rev-list", "--count", "HEAD"])
            .and_then(|s| s.parse().ok())
    }

    pub fn user_name(&self) -> Option<String> {
        self.git
            .run(&["config", "user.name"])
            .filter(|s| !s.is_empty())
    }

    pub fn user_email(&self) -> Option<String> {
        self.git
            .run(&["config", "user.email"])
            .filter(|s| !s.is_empty())
    }

    pub fn info(&self) -> RepositoryInfo {
        let remote_url = self.remote_url();
        let (owner, repo) = match remote_url.as_deref().and_then(owner_repo) {
            Some((o, r)) => (Some(o), Some(r)),
            None => (None, None),
        };
        RepositoryInfo {
            root: self.git.repo_root().map(|p| p.to_path_buf()),
            current_branch: self.current_branch(),
            commit_count: self.commit_count(),
            remote_url,
            owner,
            repo,
        }
    }
}

/// Parse `owner/repo` out of an https or scp-style ssh remote URL.
pub fn owner_repo(url: &str) -> Option<(String, String)> {
    let url = url.trim().trim_end_matches('/');
    let path = if let Some((_, rest)) = url.split_once("://") {
        // https://host/owner/repo(.git), ssh://git@host/owner/repo
        rest.split_once('/')?.1
    } else {
        // git@host:owner/repo(.git)
        url.split_once(':')?.1
    };
    let path = path.strip_suffix(".git").unwrap_or(path);
    let mut parts = path.rsplitn(2, '/');
    let repo = parts.next()?;
    let owner = parts.next()?.rsplit('/').next()?;
    if owner.is_empty() || repo.is_empty() {
        return None;
    }
    Some((owner.to_string(), repo.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::RepoContext;
    use crate::test_support::{commit_file, git, init_repo};

    #[test]
    fn parses_https_and_ssh_remotes() {
        assert_eq!(
            owner_repo("https://github.com/acme/widgets.git"),
            Some(("acme".into(), "widgets".into()))
        );
        assert_eq!(
            owner_repo("git@github.com:acme/widgets.git"),
            Some(("acme".into(), "widgets".into()))
        );
        assert_eq!(
            owner_repo("ssh://git@github.com/acme/widgets"),
            Some(("acme".into(), "widgets".into()))
        );
        assert_eq!(
            owner_repo("https://gitlab.com/group/sub/proj/"),
            Some(("sub".into(), "proj".into()))
        );
        assert_eq!(owner_repo("not a url"), None);
        assert_eq!(owner_repo("https://github.com/onlyowner"), None);
    }

    #[test]
    fn info_reads_branch_count_and_remote() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        commit_file(dir.path(), "a.txt", "a", "first");
        commit_file(dir.path(), "b.txt", "b", "second");
        git(
            dir.path(),
            &["remote", "add", "origin", "git@github.com:acme/widgets.git"],
        );

        let exec = GitExecutor::new(RepoContext::new(dir.path()));
        let info = RepositoryReader::new(&exec).info();
        assert_eq!(info.current_branch.as_deref(), Some("main"));
        assert_eq!(info.commit_count, Some(2));
        assert_eq!(info.owner.as_deref(), Some("acme"));
        assert_eq!(info.repo.as_deref(), Some("widgets"));
    }

    #[test]
    fn user_identity() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        let exec = GitExecutor::new(RepoContext::new(dir.path()));
        let reader = RepositoryReader::new(&exec);
        assert_eq!(reader.user_name().as_deref(), Some("Test"));
        assert_eq!(reader.user_email().as_deref(), Some("test@test.com"));
    }

    #[test]
    fn outside_repo_info_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let exec = GitExecutor::new(RepoContext::new(dir.path()));
        assert_eq!(RepositoryReader::new(&exec).info(), RepositoryInfo::default());
    }
}

use std::cell::OnceCell;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Where the process was pointed at. Set once at entry and passed to every
/// component instead of reading the current directory ambiently.
#[derive(Debug, Clone)]
pub struct RepoContext {
    pub repository_path: PathBuf,
}

impl RepoContext {
    pub fn new(repository_path: impl Into<PathBuf>) -> Self {
        Self {
            repository_path: repository_path.into(),
        }
    }
}

/// Runs the `git` binary inside the repository that contains
/// `repository_path`.
///
/// The root is resolved once (walking up for `.git`) and cached. Every
/// failure mode ("not a repo", git missing, non-zero exit) collapses to
/// `None`; callers with more context decide what that means.
#[derive(Debug)]
pub struct GitExecutor {
    ctx: RepoContext,
    root: OnceCell<Option<PathBuf>>,
}

impl GitExecutor {
    pub fn new(ctx: RepoContext) -> Self {
        Self {
            ctx,
            root: OnceCell::new(),
        }
    }

    pub fn context(&self) -> &RepoContext {
        &self.ctx
    }

    pub fn repo_root(&self) -> Option<&Path> {
        self.root
            .get_or_init(|| find_repo_root(&self.ctx.repository_path))
            .as_deref()
    }

    pub fn is_repository(&self) -> bool {
        self.repo_root().is_some()
    }

    /// Run `git <args>` and return trimmed stdout, or `None` on any failure.
    pub fn run(&self, args: &[&str]) -> Option<String> {
        let root = self.repo_root()?;
        let output = match Command::new("git").args(args).current_dir(root).output() {
            Ok(o) => o,
            Err(e) => {
                tracing::debug!(?args, error = %e, "git could not be spawned");
                return None;
            }
        };
        if !output.status.success() {
            tracing::debug!(
                ?args,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "git exited non-zero"
            );
            return None;
        }
        Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    pub fn run_ok(&self, args: &[&str]) -> bool {
        self.run(args).is_some()
    }

    /// The repository's git directory (`.git`, or the worktree's git dir).
    pub fn git_dir(&self) -> Option<PathBuf> {
        let root = self.repo_root()?;
        match self.run(&["rev-parse", "--git-dir"]) {
            Some(dir) if !dir.is_empty() => Some(root.join(dir)),
            _ => {
                let fallback = root.join(".git");
                fallback.is_dir().then_some(fallback)
            }
        }
    }

    /// The directory git reads hooks from. Honors `core.hooksPath`.
    pub fn hooks_dir(&self) -> Option<PathBuf> {
        let root = self.repo_root()?;
        match self.run(&["rev-parse", "--git-path", "hooks"]) {
            Some(dir) if !dir.is_empty() => Some(root.join(dir)),
            _ => Some(root.join(".git").join("hooks")),
        }
    }
}

/// Walk up from `start` looking for a directory containing `.git`
/// (a directory, or a file for linked worktrees).
pub fn find_repo_root(start: &Path) -> Option<PathBuf> {
    let mut cur = start
        .canonicalize()
        .unwrap_or_else(|_| start.to_path_buf());
    loop {
        if cur.join(".git").exists() {
            return Some(cur);
        }
        if !cur.pop() {
            return None;
        }
    }
}

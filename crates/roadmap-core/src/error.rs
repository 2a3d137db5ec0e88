use std::path::PathBuf;

/// Failures the git engine reports as values.
///
/// "Not a repository" is an expected steady state (running outside any repo),
/// so it is a variant here rather than a panic or an opaque I/O error.
#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error("not inside a git repository")]
    NotARepository,

    #[error("working tree has uncommitted changes to tracked files (use --force to override)")]
    DirtyWorkingTree,

    #[error("git {command} failed")]
    CommandFailed { command: String },

    #[error("hooks directory not found: {}", .0.display())]
    HooksDirMissing(PathBuf),

    #[error("unknown hook event: {0} (expected post-commit, pre-push, post-merge, post-checkout)")]
    UnknownHookEvent(String),

    #[error("{} is not managed by roadmap (use --force to replace it)", .0.display())]
    ForeignHook(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl GitError {
    pub fn command_failed(args: &[&str]) -> Self {
        Self::CommandFailed {
            command: args.join(" "),
        }
    }
}

use std::path::PathBuf;

use roadmap_core::{Issue, IssueStore, RoadmapConfig, RoadmapPaths};
use roadmap_git::{GitExecutor, GitIntegration, RepoContext};
use roadmap_store::JsonIssueStore;

/// Everything a command needs, resolved once from the process context.
pub struct Workspace {
    pub paths: RoadmapPaths,
    pub config: RoadmapConfig,
    pub git: GitIntegration,
    pub store: JsonIssueStore,
}

impl Workspace {
    /// The workspace lives at the repository root, or at the working
    /// directory when there is no repository.
    pub fn open(ctx: &RepoContext) -> Self {
        let paths = RoadmapPaths::discover(root_for(ctx));
        let config = RoadmapConfig::load(&paths);
        let git = GitIntegration::new(ctx.clone(), config.git.clone());
        let store = JsonIssueStore::new(paths.clone());
        Self {
            paths,
            config,
            git,
            store,
        }
    }

    pub fn require_initialized(&self) -> anyhow::Result<()> {
        if !self.paths.is_initialized() {
            anyhow::bail!("No .roadmap/ workspace found. Run `roadmap init` first.");
        }
        Ok(())
    }

    pub fn require_repository(&self) -> anyhow::Result<()> {
        if !self.git.is_repository() {
            anyhow::bail!("Not inside a git repository.");
        }
        Ok(())
    }

    pub fn issue(&self, id: &str) -> anyhow::Result<Issue> {
        match self.store.get(id)? {
            Some(issue) => Ok(issue),
            None => anyhow::bail!("issue not found: {id}"),
        }
    }
}

pub fn root_for(ctx: &RepoContext) -> PathBuf {
    GitExecutor::new(ctx.clone())
        .repo_root()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| ctx.repository_path.clone())
}

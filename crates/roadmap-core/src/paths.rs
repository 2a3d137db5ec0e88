use std::path::PathBuf;

/// All well-known paths under `.roadmap/`.
#[derive(Debug, Clone)]
pub struct RoadmapPaths {
    pub root: PathBuf,
    pub roadmap_dir: PathBuf,
    pub issues_dir: PathBuf,
    pub config_json: PathBuf,
    pub lock_file: PathBuf,
}

impl RoadmapPaths {
    /// Derive all paths from a repo root. Pure computation, no I/O.
    pub fn discover(repo_root: impl Into<PathBuf>) -> Self {
        let root = repo_root.into();
        let roadmap_dir = root.join(".roadmap");
        Self {
            issues_dir: roadmap_dir.join("issues"),
            config_json: roadmap_dir.join("config.json"),
            lock_file: roadmap_dir.join("LOCK"),
            roadmap_dir,
            root,
        }
    }

    /// Create all required directories. Idempotent.
    pub fn ensure_layout(&self) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.issues_dir)?;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.roadmap_dir.is_dir()
    }

    pub fn issue_file(&self, id: &str) -> PathBuf {
        self.issues_dir.join(format!("{id}.json"))
    }
}

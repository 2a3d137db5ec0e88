use roadmap_core::RoadmapPaths;
use roadmap_git::RepoContext;

use crate::workspace::root_for;

/// `roadmap init`
pub fn execute(ctx: &RepoContext) -> anyhow::Result<()> {
    let paths = RoadmapPaths::discover(root_for(ctx));
    if paths.is_initialized() {
        println!("Workspace already initialized at {}", paths.roadmap_dir.display());
        return Ok(());
    }
    paths.ensure_layout()?;
    println!("Initialized {}", paths.roadmap_dir.display());
    println!("  Next: `roadmap hooks install` to sync issues on commit, checkout, merge, and push");
    Ok(())
}

use clap::Subcommand;

use roadmap_git::{GitExecutor, RepoContext};
use roadmap_hooks::{
    ActivityLog, HookDescriptor, HookEvent, HookInstaller, InstallOutcome, UninstallOutcome,
};

// ── CLI Schema ──

#[derive(Subcommand)]
pub enum HooksCmd {
    /// Install hooks (default: post-commit, pre-push, post-merge, post-checkout)
    Install {
        events: Vec<String>,
        /// Replace hooks not managed by roadmap (the original is kept as <event>.roadmap.bak)
        #[arg(long)]
        force: bool,
    },
    /// Remove roadmap-managed hooks; others are left alone
    Uninstall { events: Vec<String> },
    /// Show hook state and recent hook activity
    Status {
        /// Number of activity log lines to show
        #[arg(long, default_value_t = 10)]
        activity: usize,
    },
}

// ── Dispatch ──

pub fn run(cmd: HooksCmd, ctx: &RepoContext) -> anyhow::Result<()> {
    let git = GitExecutor::new(ctx.clone());
    let installer = HookInstaller::new(&git);
    match cmd {
        HooksCmd::Install { events, force } => {
            let events = HookEvent::parse_list(&events)?;
            let mut refused = 0;
            for (event, result) in installer.install(&events, force)? {
                match result {
                    Ok(InstallOutcome::Installed(_)) => println!("  installed {event}"),
                    Ok(InstallOutcome::Replaced { backup, .. }) => {
                        println!(
                            "  installed {event} (previous hook saved to {})",
                            backup.display()
                        )
                    }
                    Err(e) => {
                        refused += 1;
                        println!("  skipped   {event}: {e}");
                    }
                }
            }
            if refused > 0 {
                anyhow::bail!("{refused} hook(s) not installed");
            }
            Ok(())
        }
        HooksCmd::Uninstall { events } => {
            let events = HookEvent::parse_list(&events)?;
            for (event, outcome) in installer.uninstall(&events)? {
                match outcome {
                    UninstallOutcome::Removed(_) => println!("  removed   {event}"),
                    UninstallOutcome::Restored(_) => {
                        println!("  removed   {event} (previous hook restored)")
                    }
                    UninstallOutcome::NotManaged(path) => {
                        println!(
                            "  kept      {event}: {} is not managed by roadmap",
                            path.display()
                        )
                    }
                    UninstallOutcome::Missing => println!("  absent    {event}"),
                }
            }
            Ok(())
        }
        HooksCmd::Status { activity } => {
            if !git.is_repository() {
                anyhow::bail!("Not inside a git repository.");
            }
            for hook in installer.status_all() {
                println!("  {:<14} {}", hook.event.as_str(), describe(&hook));
            }
            let lines = ActivityLog::for_repo(&git).tail(activity);
            if !lines.is_empty() {
                println!();
                println!("Recent activity:");
                for line in lines {
                    println!("  {line}");
                }
            }
            Ok(())
        }
    }
}

// ── Command Implementations ──

fn describe(hook: &HookDescriptor) -> &'static str {
    if hook.is_healthy() {
        "installed"
    } else if !hook.installed {
        "not installed"
    } else if !hook.managed {
        "foreign hook"
    } else {
        "installed, NOT executable"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hook(installed: bool, managed: bool, executable: bool) -> HookDescriptor {
        HookDescriptor {
            installed,
            managed,
            executable,
            ..HookDescriptor::absent(HookEvent::PostCommit)
        }
    }

    #[test]
    fn describe_reports_each_hook_state() {
        assert_eq!(describe(&hook(true, true, true)), "installed");
        assert_eq!(describe(&HookDescriptor::absent(HookEvent::PrePush)), "not installed");
        assert_eq!(describe(&hook(true, false, true)), "foreign hook");
        assert_eq!(describe(&hook(true, false, false)), "foreign hook");
        assert_eq!(describe(&hook(true, true, false)), "installed, NOT executable");
    }
}

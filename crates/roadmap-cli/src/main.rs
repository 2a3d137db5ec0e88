mod cmd_config;
mod cmd_git;
mod cmd_hook;
mod cmd_hooks;
mod cmd_init;
mod cmd_issue;
mod workspace;

use clap::{Parser, Subcommand};
use roadmap_git::RepoContext;

#[derive(Parser)]
#[command(name = "roadmap", version, about = "Track issues against git history")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the .roadmap/ workspace at the repository root
    Init,
    /// Branches, commits, and sync for issues
    Git {
        #[command(subcommand)]
        cmd: cmd_git::GitCmd,
    },
    /// Install, remove, or inspect repository hooks
    Hooks {
        #[command(subcommand)]
        cmd: cmd_hooks::HooksCmd,
    },
    /// Create and list issues
    Issue {
        #[command(subcommand)]
        cmd: cmd_issue::IssueCmd,
    },
    /// Manage workspace config
    Config {
        #[command(subcommand)]
        cmd: cmd_config::ConfigCmd,
    },
    /// Entry point for installed git hooks
    #[command(hide = true)]
    InternalHookHandler {
        /// Hook event (post-commit, pre-push, post-merge, post-checkout)
        event: String,
        /// Arguments git passed to the hook
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

fn init_tracing(hook: bool) {
    use tracing_subscriber::EnvFilter;

    // Hooks stay silent in the user's terminal unless explicitly debugged.
    let filter = if hook {
        if std::env::var_os("ROADMAP_DEBUG").is_none() {
            return;
        }
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("ROADMAP_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init()
        .ok();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(matches!(cli.cmd, Command::InternalHookHandler { .. }));
    let cwd = std::env::current_dir()?;
    let ctx = RepoContext::new(cwd);

    match cli.cmd {
        Command::Init => cmd_init::execute(&ctx),
        Command::Git { cmd } => cmd_git::run(cmd, &ctx),
        Command::Hooks { cmd } => cmd_hooks::run(cmd, &ctx),
        Command::Issue { cmd } => cmd_issue::run(cmd, &ctx),
        Command::Config { cmd } => cmd_config::run(cmd, &ctx),
        Command::InternalHookHandler { event, args } => {
            cmd_hook::execute(ctx, &event, &args);
            Ok(())
        }
    }
}

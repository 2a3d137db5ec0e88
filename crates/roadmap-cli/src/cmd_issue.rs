use clap::Subcommand;

use roadmap_core::{IssueStore, IssueType, NewIssue, Priority};
use roadmap_git::RepoContext;

use crate::workspace::Workspace;

// ── CLI Schema ──

#[derive(Subcommand)]
pub enum IssueCmd {
    /// Create an issue
    Create {
        /// Issue title
        title: String,
        /// feature, bug, documentation, or other
        #[arg(long = "type", default_value = "feature")]
        issue_type: IssueType,
        /// critical, high, medium, or low
        #[arg(long, default_value = "medium")]
        priority: Priority,
        /// Assignee (defaults to the git user)
        #[arg(long)]
        assignee: Option<String>,
    },
    /// List issues
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one issue, including its linked commits and branches
    Show {
        id: String,
    },
    /// Assign an issue to a milestone
    Milestone {
        id: String,
        milestone: String,
    },
}

// ── Dispatch ──

pub fn run(cmd: IssueCmd, ctx: &RepoContext) -> anyhow::Result<()> {
    let ws = Workspace::open(ctx);
    match cmd {
        IssueCmd::Create {
            title,
            issue_type,
            priority,
            assignee,
        } => {
            ws.paths.ensure_layout()?;
            let new = NewIssue {
                title,
                issue_type,
                priority,
                assignee: assignee.or_else(|| ws.git.current_user()),
                ..NewIssue::default()
            };
            let issue = ws.store.create(new)?;
            println!("Created {} {}", issue.id, issue.title);
            if ws.git.is_repository() {
                println!("  branch: roadmap git branch {}", issue.id);
            }
            Ok(())
        }
        IssueCmd::List { json } => {
            ws.require_initialized()?;
            let issues = ws.store.list()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&issues)?);
                return Ok(());
            }
            if issues.is_empty() {
                println!("(no issues)");
            }
            for issue in issues {
                let progress = issue
                    .progress_percentage
                    .map(|p| format!("{p:>3.0}%"))
                    .unwrap_or_else(|| "   -".to_string());
                println!(
                    "{}  {:<11} {}  {}",
                    issue.id,
                    issue.status.as_str(),
                    progress,
                    issue.title
                );
            }
            Ok(())
        }
        IssueCmd::Show { id } => {
            ws.require_initialized()?;
            let issue = ws.issue(&id)?;
            println!("{}  {}", issue.id, issue.title);
            println!("  status:   {}", issue.status);
            println!("  type:     {}", issue.issue_type);
            println!("  priority: {}", issue.priority);
            if let Some(p) = issue.progress_percentage {
                println!("  progress: {p}%");
            }
            if let Some(a) = &issue.assignee {
                println!("  assignee: {a}");
            }
            if let Some(m) = &issue.milestone {
                println!("  milestone: {m}");
            }
            for branch in &issue.git_branches {
                println!("  branch:   {branch}");
            }
            for commit in &issue.git_commits {
                let mark = if commit.completion { " (completed)" } else { "" };
                println!("  commit:   {} {}{mark}", short_hash(&commit.hash), commit.message);
            }
            Ok(())
        }
        IssueCmd::Milestone { id, milestone } => {
            ws.require_initialized()?;
            if !ws.store.assign_to_milestone(&id, &milestone)? {
                anyhow::bail!("issue not found: {id}");
            }
            println!("{id} → {milestone}");
            Ok(())
        }
    }
}

// ── Command Implementations ──

fn short_hash(hash: &str) -> String {
    hash.chars().take(8).collect()
}

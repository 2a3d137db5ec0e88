use clap::Subcommand;

use roadmap_git::{BranchOutcome, RepoContext};
use roadmap_sync::{SyncOrchestrator, SyncReport};

use crate::workspace::Workspace;

// ── CLI Schema ──

#[derive(Subcommand)]
pub enum GitCmd {
    /// Show repository context and the issue linked to the current branch
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the suggested branch name for an issue
    Suggest { id: String },
    /// Create (and check out) the branch for an issue
    Branch {
        id: String,
        /// Create the branch but stay on the current one
        #[arg(long)]
        no_checkout: bool,
        /// Proceed even with uncommitted changes to tracked files
        #[arg(long)]
        force: bool,
    },
    /// List commits that reference an issue
    Commits {
        id: String,
        /// Only commits after this date (anything `git log --since` accepts)
        #[arg(long)]
        since: Option<String>,
        /// How many recent commits to scan (default: git.commit_window)
        #[arg(long)]
        count: Option<usize>,
    },
    /// List local branches and the issues they map to
    Branches,
    /// Link a branch (default: current) to an issue
    Link {
        id: String,
        #[arg(long)]
        branch: Option<String>,
    },
    /// Sync issue progress and status from recent commits
    Sync {
        /// How many recent commits to scan (default: git.commit_window)
        #[arg(long)]
        count: Option<usize>,
        /// Only sync this issue
        #[arg(long)]
        issue: Option<String>,
        /// Show what would change without writing
        #[arg(long)]
        dry_run: bool,
    },
    /// Create an issue from a branch name (default: current branch)
    AutoCreate {
        #[arg(long)]
        branch: Option<String>,
    },
}

// ── Dispatch ──

pub fn run(cmd: GitCmd, ctx: &RepoContext) -> anyhow::Result<()> {
    let ws = Workspace::open(ctx);
    match cmd {
        GitCmd::Status { json } => status(&ws, json),
        GitCmd::Suggest { id } => {
            let issue = ws.issue(&id)?;
            println!("{}", ws.git.suggest_branch_name(&issue));
            Ok(())
        }
        GitCmd::Branch {
            id,
            no_checkout,
            force,
        } => branch(&ws, &id, !no_checkout, force),
        GitCmd::Commits { id, since, count } => commits(&ws, &id, since.as_deref(), count),
        GitCmd::Branches => branches(&ws),
        GitCmd::Link { id, branch } => {
            ws.require_repository()?;
            match ws.git.link_branch_to_issue(&ws.store, &id, branch.as_deref())? {
                Some(issue) => {
                    println!("{} ← {}", issue.id, issue.git_branches.join(", "));
                    Ok(())
                }
                None => anyhow::bail!("issue not found: {id}"),
            }
        }
        GitCmd::Sync {
            count,
            issue,
            dry_run,
        } => sync(&ws, count, issue.as_deref(), dry_run),
        GitCmd::AutoCreate { branch } => {
            ws.require_repository()?;
            ws.paths.ensure_layout()?;
            match ws.git.auto_create_issue_from_branch(&ws.store, branch.as_deref()) {
                Some(issue) => println!("Created {} {}", issue.id, issue.title),
                None => println!(
                    "No issue created (protected, already linked, or no title in branch name)"
                ),
            }
            Ok(())
        }
    }
}

// ── Command Implementations ──

fn status(ws: &Workspace, json: bool) -> anyhow::Result<()> {
    let ctx = ws.git.context(&ws.store);
    if json {
        let info = ws.git.repository_info();
        let out = serde_json::json!({ "context": ctx, "repository": info });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }
    if !ctx.is_repository {
        println!("Not inside a git repository.");
        return Ok(());
    }
    println!("Branch: {}", ctx.current_branch.as_deref().unwrap_or("(detached)"));
    match (&ctx.linked_issue_id, &ctx.linked_issue_title) {
        (Some(id), Some(title)) => println!("Issue:  {id} {title}"),
        (Some(id), None) => println!("Issue:  {id} (not in this workspace)"),
        _ => println!("Issue:  (none)"),
    }
    if let Some(url) = &ctx.remote_url {
        println!("Remote: {url}");
    }
    if let Some(user) = ws.git.current_user() {
        match ws.git.current_email() {
            Some(email) => println!("User:   {user} <{email}>"),
            None => println!("User:   {user}"),
        }
    }
    Ok(())
}

fn branch(ws: &Workspace, id: &str, checkout: bool, force: bool) -> anyhow::Result<()> {
    let issue = ws.issue(id)?;
    match ws.git.create_branch_for_issue(&issue, checkout, force)? {
        BranchOutcome::Created(name) if checkout => println!("Switched to new branch {name}"),
        BranchOutcome::Created(name) => println!("Created branch {name}"),
        BranchOutcome::CheckedOutExisting(name) => println!("Switched to existing branch {name}"),
        BranchOutcome::AlreadyExists(name) => println!("Branch {name} already exists"),
    }
    Ok(())
}

fn commits(
    ws: &Workspace,
    id: &str,
    since: Option<&str>,
    count: Option<usize>,
) -> anyhow::Result<()> {
    ws.require_repository()?;
    let found = match count {
        Some(n) => ws.git.commits().commits_referencing_in(id, n, since),
        None => ws.git.commits_for_issue(id, since),
    };
    if found.is_empty() {
        println!("(no commits reference {id})");
    }
    for c in found {
        let mut flags = Vec::new();
        if let Some(p) = c.progress() {
            flags.push(format!("progress {p}%"));
        }
        if c.is_completion() {
            flags.push("completes".to_string());
        } else if c.is_wip() {
            flags.push("wip".to_string());
        }
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!("  [{}]", flags.join(", "))
        };
        println!(
            "{} {} {}  {}{flags}",
            c.short_hash(),
            c.timestamp.date(),
            c.author,
            c.message
        );
    }
    Ok(())
}

fn branches(ws: &Workspace) -> anyhow::Result<()> {
    ws.require_repository()?;
    for b in ws.git.branches().list_branches() {
        let marker = if b.is_current { "*" } else { " " };
        let issue = b.issue_id().unwrap_or_else(|| "-".to_string());
        println!("{marker} {:<40} {issue}", b.name);
    }
    Ok(())
}

fn sync(
    ws: &Workspace,
    count: Option<usize>,
    issue: Option<&str>,
    dry_run: bool,
) -> anyhow::Result<()> {
    ws.require_repository()?;
    ws.require_initialized()?;
    let orchestrator = SyncOrchestrator::new(&ws.git, &ws.store).dry_run(dry_run);

    if let Some(id) = issue {
        return match orchestrator.update_issue_from_git_activity(id)? {
            Some(updated) => {
                let progress = updated
                    .progress_percentage
                    .map(|p| format!(", {p}%"))
                    .unwrap_or_default();
                println!("{} {}{progress}", updated.id, updated.status);
                Ok(())
            }
            None => anyhow::bail!("issue not found: {id}"),
        };
    }

    let count = count.unwrap_or(ws.config.git.commit_window);
    let report = orchestrator.sync_repository(count)?;
    print_report(&report, dry_run);
    if !report.is_clean() {
        anyhow::bail!("{} issue(s) failed to sync", report.errors.len());
    }
    Ok(())
}

fn print_report(report: &SyncReport, dry_run: bool) {
    if dry_run {
        if report.planned.is_empty() {
            println!("Nothing to sync.");
        }
        for plan in &report.planned {
            let mut changes = vec![format!("+{} commits", plan.new_commits)];
            if let Some(status) = plan.status {
                changes.push(format!("status → {status}"));
            }
            if let Some(p) = plan.progress_percentage {
                changes.push(format!("progress → {p}%"));
            }
            println!("{}: {}", plan.issue_id, changes.join(", "));
        }
        return;
    }
    println!(
        "Scanned {} issues: {} updated, {} commits linked",
        report.issues_scanned, report.issues_updated, report.commits_linked
    );
    for (id, message) in &report.errors {
        eprintln!("  {id}: {message}");
    }
}

use clap::Subcommand;
use std::path::Path;

use roadmap_core::config::{flatten, get_dotted, parse_value, read_config_map, set_dotted};
use roadmap_core::{RoadmapConfig, RoadmapPaths};
use roadmap_git::RepoContext;

use crate::workspace::root_for;

// ── CLI Schema ──

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Set a config value
    Set {
        /// Config key in dot notation (e.g. git.auto_create_issues)
        key: String,
        /// Config value (true/false/number/string)
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key in dot notation
        key: String,
    },
    /// List all config values, including defaults
    List,
}

// ── Dispatch ──

pub fn run(cmd: ConfigCmd, ctx: &RepoContext) -> anyhow::Result<()> {
    let paths = RoadmapPaths::discover(root_for(ctx));
    if !paths.is_initialized() {
        anyhow::bail!("No .roadmap/ workspace found. Run `roadmap init` first.");
    }
    match cmd {
        ConfigCmd::Set { key, value } => set(&paths.config_json, &key, &value),
        ConfigCmd::Get { key } => get(&paths.config_json, &key),
        ConfigCmd::List => list(&paths.config_json),
    }
}

// ── Command Implementations ──

fn write_config(
    path: &Path,
    config: &serde_json::Map<String, serde_json::Value>,
) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&config)?;
    roadmap_store::write_atomic(path, json.as_bytes())
}

/// Effective config (defaults merged with the file) as a JSON object.
fn effective(path: &Path) -> anyhow::Result<serde_json::Map<String, serde_json::Value>> {
    match serde_json::to_value(RoadmapConfig::load_from(path))? {
        serde_json::Value::Object(map) => Ok(map),
        _ => Ok(serde_json::Map::new()),
    }
}

/// `roadmap config set <key> <value>`
fn set(path: &Path, key: &str, value: &str) -> anyhow::Result<()> {
    let mut config = read_config_map(path)?;
    set_dotted(&mut config, key, parse_value(value));

    // Refuse writes that would make the typed config unreadable.
    let candidate = serde_json::Value::Object(config.clone());
    if let Err(e) = serde_json::from_value::<RoadmapConfig>(candidate) {
        anyhow::bail!("invalid value for {key}: {e}");
    }
    write_config(path, &config)?;
    println!("{key} = {value}");
    Ok(())
}

/// `roadmap config get <key>`
fn get(path: &Path, key: &str) -> anyhow::Result<()> {
    let config = read_config_map(path)?;
    let defaults = effective(path)?;
    match get_dotted(&config, key).or_else(|| get_dotted(&defaults, key)) {
        Some(val) => println!("{val}"),
        None => println!("(not set)"),
    }
    Ok(())
}

/// `roadmap config list`
fn list(path: &Path) -> anyhow::Result<()> {
    let mut merged = effective(path)?;
    for (key, value) in flatten(&read_config_map(path)?) {
        set_dotted(&mut merged, &key, value);
    }
    for (k, v) in flatten(&merged) {
        println!("{k} = {v}");
    }
    Ok(())
}

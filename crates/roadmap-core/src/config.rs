use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::paths::RoadmapPaths;

pub const DEFAULT_BRANCH_TEMPLATE: &str = "{prefix}/{id}-{slug}";

/// Workspace configuration read from `.roadmap/config.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RoadmapConfig {
    pub git: GitConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GitConfig {
    /// Branch name template; placeholders `{prefix}`, `{id}`, `{slug}`, `{title}`, `{type}`.
    pub branch_template: Option<String>,
    /// Create an issue when checking out a branch that maps to none.
    pub auto_create_issues: bool,
    /// Link checked-out branches to their issue and start the work.
    pub auto_link_branches: bool,
    /// Commits scanned by manual sync and commit lookups.
    pub commit_window: usize,
    /// Commits scanned by the pre-push / post-merge hooks.
    pub hook_commit_window: usize,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            branch_template: None,
            auto_create_issues: false,
            auto_link_branches: true,
            commit_window: 100,
            hook_commit_window: 20,
        }
    }
}

impl RoadmapConfig {
    /// Load config for a workspace. A missing or malformed file yields defaults.
    pub fn load(paths: &RoadmapPaths) -> Self {
        Self::load_from(&paths.config_json)
    }

    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str(&content) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "ignoring malformed config");
                Self::default()
            }
        }
    }
}

// ── Raw map access (for `roadmap config get/set/list`) ──

/// Read config as a raw JSON object. Returns an empty map if the file doesn't exist.
pub fn read_config_map(path: &Path) -> anyhow::Result<serde_json::Map<String, serde_json::Value>> {
    if !path.exists() {
        return Ok(serde_json::Map::new());
    }
    let content = std::fs::read_to_string(path)?;
    let val: serde_json::Value = serde_json::from_str(&content)?;
    match val {
        serde_json::Value::Object(map) => Ok(map),
        _ => Ok(serde_json::Map::new()),
    }
}

/// Look up a dot-notation key (e.g. `git.commit_window`).
pub fn get_dotted<'a>(
    map: &'a serde_json::Map<String, serde_json::Value>,
    key: &str,
) -> Option<&'a serde_json::Value> {
    let mut parts = key.split('.');
    let mut cur = map.get(parts.next()?)?;
    for part in parts {
        cur = cur.as_object()?.get(part)?;
    }
    Some(cur)
}

/// Set a dot-notation key, creating intermediate objects as needed.
/// A non-object value in the middle of the path is replaced.
pub fn set_dotted(
    map: &mut serde_json::Map<String, serde_json::Value>,
    key: &str,
    value: serde_json::Value,
) {
    let parts: Vec<&str> = key.split('.').collect();
    let (last, parents) = match parts.split_last() {
        Some(split) => split,
        None => return,
    };
    let mut cur = map;
    for part in parents {
        let entry = cur
            .entry(part.to_string())
            .or_insert_with(|| serde_json::json!({}));
        if !entry.is_object() {
            *entry = serde_json::json!({});
        }
        cur = match entry.as_object_mut() {
            Some(obj) => obj,
            None => return,
        };
    }
    cur.insert(last.to_string(), value);
}

/// Parse a CLI string into a JSON value (bool/number/string).
pub fn parse_value(s: &str) -> serde_json::Value {
    match s {
        "true" => serde_json::Value::Bool(true),
        "false" => serde_json::Value::Bool(false),
        _ => {
            if let Ok(n) = s.parse::<i64>() {
                serde_json::Value::Number(n.into())
            } else if let Ok(f) = s.parse::<f64>() {
                serde_json::json!(f)
            } else {
                serde_json::Value::String(s.to_string())
            }
        }
    }
}

/// Flatten nested objects into `(dotted.key, value)` pairs, sorted by key.
pub fn flatten(
    map: &serde_json::Map<String, serde_json::Value>,
) -> Vec<(String, serde_json::Value)> {
    fn walk(
        prefix: &str,
        map: &serde_json::Map<String, serde_json::Value>,
        out: &mut Vec<(String, serde_json::Value)>,
    ) {
        for (k, v) in map {
            let key = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            match v.as_object() {
                Some(inner) => walk(&key, inner, out),
                None => out.push((key, v.clone())),
            }
        }
    }
    let mut out = Vec::new();
    walk("", map, &mut out);
    out.sort_by(|a, b| a.0.cmp(&b.0));
    out
}

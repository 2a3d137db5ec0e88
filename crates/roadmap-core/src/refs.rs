//! Roadmap signals embedded in commit messages: issue references, progress
//! markers, completion markers, and work-in-progress indicators.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::types::IssueStatus;

/// Reference patterns, applied in order. Capture group 1 is the issue id.
static REFERENCE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        // [roadmap:id], [closes roadmap:id], [fixes roadmap:id]
        Regex::new(r"(?i)\[(?:(?:closes|fixes)\s+)?roadmap:([a-z0-9]{8,})\]").unwrap(),
        // roadmap:id
        Regex::new(r"(?i)\broadmap:([a-z0-9]{8,})\b").unwrap(),
        // fixes #id, closed #id, resolves #id
        Regex::new(r"(?i)\b(?:fix(?:es|ed)?|close[sd]?|resolve[sd]?)\s+#([a-z0-9]{8,})\b").unwrap(),
        // addresses #id, refs #id
        Regex::new(r"(?i)\b(?:address(?:es)?|refs?)\s+#([a-z0-9]{8,})\b").unwrap(),
        // bare #id: exactly 8 hex chars only, so `#123` style mentions never match
        Regex::new(r"(?i)(?:^|[^\w#&])#([0-9a-f]{8})\b").unwrap(),
    ]
});

static PROGRESS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[?progress:\s*(\d+(?:\.\d+)?)\s*%?\]?").unwrap());

static COMPLETION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)\b(?:close[sd]?|fix(?:es|ed)?)\s+roadmap:[a-z0-9]{8,}").unwrap(),
        Regex::new(r"(?i)\b(?:fix(?:es|ed)?|close[sd]?|resolve[sd]?)\s+#[a-z0-9]{8,}\b").unwrap(),
        Regex::new(r"(?i)\b(?:complete[sd]?|completing|close[sd]?|fix(?:es|ed)?)\b.*\broadmap\b")
            .unwrap(),
    ]
});

static WIP_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)\bwip\b").unwrap(),
        Regex::new(r"(?i)\bwork\s+in\s+progress\b").unwrap(),
        Regex::new(r"(?i)\bstart(?:ed|ing|s)?\b.*#[a-z0-9]{8,}").unwrap(),
    ]
});

/// Every issue id referenced by `message`, lowercased and de-duplicated.
pub fn extract_references(message: &str) -> BTreeSet<String> {
    let mut ids = BTreeSet::new();
    for pat in REFERENCE_PATTERNS.iter() {
        for caps in pat.captures_iter(message) {
            if let Some(m) = caps.get(1) {
                ids.insert(m.as_str().to_ascii_lowercase());
            }
        }
    }
    ids
}

/// First `progress:N` / `[progress:N%]` value in `message`. Not clamped.
pub fn extract_progress(message: &str) -> Option<f64> {
    PROGRESS_PATTERN
        .captures(message)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

pub fn is_completion(message: &str) -> bool {
    COMPLETION_PATTERNS.iter().any(|p| p.is_match(message))
}

pub fn is_wip(message: &str) -> bool {
    WIP_PATTERNS.iter().any(|p| p.is_match(message))
}

pub fn clamp_progress(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

/// Changes a single commit message proposes for the issues it references.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProposedUpdate {
    pub status: Option<IssueStatus>,
    pub progress_percentage: Option<f64>,
}

/// Infer issue changes from a commit message.
///
/// Precedence: completion beats progress-derived status, and WIP only fills
/// in a status when nothing else set one.
pub fn updates_from_message(message: &str) -> ProposedUpdate {
    let mut update = ProposedUpdate::default();

    if let Some(raw) = extract_progress(message) {
        let value = clamp_progress(raw);
        update.progress_percentage = Some(value);
        if value > 0.0 && value < 100.0 {
            update.status = Some(IssueStatus::InProgress);
        }
    }

    if is_completion(message) {
        update.status = Some(IssueStatus::Closed);
        update.progress_percentage = Some(100.0);
    }

    if update.status.is_none() && is_wip(message) {
        update.status = Some(IssueStatus::InProgress);
    }

    update
}

use serde::Serialize;
use std::path::PathBuf;
use std::str::FromStr;

use roadmap_core::GitError;

/// The git events roadmap installs hooks for. No others are recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum HookEvent {
    PostCommit,
    PrePush,
    PostMerge,
    PostCheckout,
}

impl HookEvent {
    pub const ALL: [HookEvent; 4] = [
        HookEvent::PostCommit,
        HookEvent::PrePush,
        HookEvent::PostMerge,
        HookEvent::PostCheckout,
    ];

    /// The hook file name git looks for.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PostCommit => "post-commit",
            Self::PrePush => "pre-push",
            Self::PostMerge => "post-merge",
            Self::PostCheckout => "post-checkout",
        }
    }

    /// Parse event names; an empty list means every event.
    pub fn parse_list<S: AsRef<str>>(names: &[S]) -> Result<Vec<HookEvent>, GitError> {
        if names.is_empty() {
            return Ok(Self::ALL.to_vec());
        }
        let mut events = Vec::with_capacity(names.len());
        for name in names {
            let event: HookEvent = name.as_ref().parse()?;
            if !events.contains(&event) {
                events.push(event);
            }
        }
        Ok(events)
    }
}

impl FromStr for HookEvent {
    type Err = GitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|e| e.as_str() == s.trim())
            .ok_or_else(|| GitError::UnknownHookEvent(s.to_string()))
    }
}

impl std::fmt::Display for HookEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What is on disk for one event. The three flags are independent so a
/// foreign or non-executable hook is reported as such.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HookDescriptor {
    pub event: HookEvent,
    pub installed: bool,
    pub managed: bool,
    pub executable: bool,
    pub path: Option<PathBuf>,
}

impl HookDescriptor {
    pub fn absent(event: HookEvent) -> Self {
        Self {
            event,
            installed: false,
            managed: false,
            executable: false,
            path: None,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.installed && self.managed && self.executable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for event in HookEvent::ALL {
            assert_eq!(event.as_str().parse::<HookEvent>().unwrap(), event);
        }
        assert!(matches!(
            "pre-commit".parse::<HookEvent>(),
            Err(GitError::UnknownHookEvent(name)) if name == "pre-commit"
        ));
    }

    #[test]
    fn parse_list_defaults_to_all_and_dedups() {
        let none: [&str; 0] = [];
        assert_eq!(HookEvent::parse_list(&none).unwrap(), HookEvent::ALL.to_vec());
        assert_eq!(
            HookEvent::parse_list(&["post-merge", "post-merge"]).unwrap(),
            vec![HookEvent::PostMerge]
        );
        assert!(HookEvent::parse_list(&["post-commit", "bogus"]).is_err());
    }
}

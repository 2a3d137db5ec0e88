use crate::registry::HookEvent;

/// Ownership marker. A hook file is ours iff its body contains this line.
pub const MARKER: &str = "# roadmap-managed-hook";

/// The binary hooks re-enter through when the running executable can't be resolved.
pub const FALLBACK_BINARY: &str = "roadmap";

pub fn is_managed(content: &str) -> bool {
    content.contains(MARKER)
}

/// Absolute path of the running binary, or `roadmap` to resolve via `PATH`.
pub fn current_binary() -> String {
    std::env::current_exe()
        .and_then(|p| p.canonicalize())
        .ok()
        .and_then(|p| p.to_str().map(String::from))
        .unwrap_or_else(|| FALLBACK_BINARY.to_string())
}

/// Render the hook body for `event`.
///
/// The script moves to the work tree root, hands the event and git's hook
/// arguments to `<binary> internal-hook-handler`, discards its output, and
/// exits 0 so the git operation it is attached to can't fail because of it.
pub fn hook_script(event: HookEvent, binary: &str) -> String {
    format!(
        "#!/bin/sh\n\
         {MARKER}\n\
         # Installed by `roadmap hooks install`; remove with `roadmap hooks uninstall`.\n\
         root=\"$(git rev-parse --show-toplevel 2>/dev/null)\" || exit 0\n\
         cd \"$root\" 2>/dev/null || exit 0\n\
         {bin} internal-hook-handler {event} \"$@\" >/dev/null 2>&1\n\
         exit 0\n",
        bin = shell_quote(binary),
    )
}

fn shell_quote(s: &str) -> String {
    if !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '-' | '_'))
    {
        return s.to_string();
    }
    format!("'{}'", s.replace('\'', r"'\''"))
}

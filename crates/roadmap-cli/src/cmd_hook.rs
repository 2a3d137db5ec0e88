use std::panic::{catch_unwind, AssertUnwindSafe};

use roadmap_git::RepoContext;

/// `roadmap internal-hook-handler <event> [args..]`
///
/// Called by installed hook scripts. Never reports failure: the git
/// operation that fired the hook must not be affected by it.
pub fn execute(ctx: RepoContext, event: &str, args: &[String]) {
    guarded(event, || roadmap_hooks::run_hook(ctx, event, args));
}

fn guarded(event: &str, handler: impl FnOnce()) {
    if catch_unwind(AssertUnwindSafe(handler)).is_err() {
        tracing::debug!(event, "hook handler panicked");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panicking_handler_is_contained() {
        let mut ran = false;
        guarded("post-commit", || {
            ran = true;
            panic!("handler blew up");
        });
        assert!(ran);
    }

    #[test]
    fn handler_outside_repository_returns() {
        let dir = tempfile::tempdir().unwrap();
        execute(
            RepoContext::new(dir.path()),
            "post-checkout",
            &["0000000".into(), "1111111".into(), "1".into()],
        );
        assert!(!dir.path().join(".roadmap").exists());
    }
}

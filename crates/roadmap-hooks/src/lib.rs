pub mod activity;
pub mod handlers;
pub mod install;
pub mod registry;
pub mod script;

pub use activity::{ActivityLog, ActivityType};
pub use handlers::{run_hook, HookRunner};
pub use install::{HookInstaller, InstallOutcome, UninstallOutcome};
pub use registry::{HookDescriptor, HookEvent};
pub use script::{hook_script, is_managed, MARKER};

#[cfg(test)]
pub(crate) mod test_support;

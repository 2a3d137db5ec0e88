use std::fs;
use std::path::{Path, PathBuf};

use roadmap_core::GitError;
use roadmap_git::GitExecutor;

use crate::registry::{HookDescriptor, HookEvent};
use crate::script::{current_binary, hook_script, is_managed};

const BACKUP_SUFFIX: &str = "roadmap.bak";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed(PathBuf),
    /// A foreign hook was moved aside to `backup` before installing.
    Replaced { path: PathBuf, backup: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UninstallOutcome {
    Removed(PathBuf),
    /// Ours was removed and the hook we had replaced was put back.
    Restored(PathBuf),
    NotManaged(PathBuf),
    Missing,
}

/// Writes, removes, and inspects hook files in the repository's hooks directory.
pub struct HookInstaller<'a> {
    git: &'a GitExecutor,
    binary: String,
}

impl<'a> HookInstaller<'a> {
    pub fn new(git: &'a GitExecutor) -> Self {
        Self {
            git,
            binary: current_binary(),
        }
    }

    /// Use `binary` in generated scripts instead of the running executable.
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    fn hooks_dir(&self) -> Result<PathBuf, GitError> {
        if !self.git.is_repository() {
            return Err(GitError::NotARepository);
        }
        let dir = self.git.hooks_dir().ok_or(GitError::NotARepository)?;
        if !dir.is_dir() {
            return Err(GitError::HooksDirMissing(dir));
        }
        Ok(dir)
    }

    /// Install hooks for `events` (all when empty).
    ///
    /// Fails as a whole outside a repository or without a hooks directory.
    /// Per event, a foreign hook is refused unless `force`, which backs it up
    /// to `<event>.roadmap.bak` first. Our own hooks are simply rewritten.
    pub fn install(
        &self,
        events: &[HookEvent],
        force: bool,
    ) -> Result<Vec<(HookEvent, Result<InstallOutcome, GitError>)>, GitError> {
        let dir = self.hooks_dir()?;
        let events = if events.is_empty() { &HookEvent::ALL[..] } else { events };
        Ok(events
            .iter()
            .map(|&event| (event, self.install_one(&dir, event, force)))
            .collect())
    }

    fn install_one(
        &self,
        dir: &Path,
        event: HookEvent,
        force: bool,
    ) -> Result<InstallOutcome, GitError> {
        let path = dir.join(event.as_str());
        let mut backup = None;
        if path.exists() && !file_is_managed(&path) {
            if !force {
                return Err(GitError::ForeignHook(path));
            }
            let target = backup_path(&path);
            fs::rename(&path, &target)?;
            backup = Some(target);
        }
        fs::write(&path, hook_script(event, &self.binary))?;
        make_executable(&path)?;
        tracing::debug!(event = %event, path = %path.display(), "hook installed");
        Ok(match backup {
            Some(backup) => InstallOutcome::Replaced { path, backup },
            None => InstallOutcome::Installed(path),
        })
    }

    /// Remove our hooks for `events` (all when empty). Files without the
    /// marker are left alone.
    pub fn uninstall(
        &self,
        events: &[HookEvent],
    ) -> Result<Vec<(HookEvent, UninstallOutcome)>, GitError> {
        let dir = self.hooks_dir()?;
        let events = if events.is_empty() { &HookEvent::ALL[..] } else { events };
        let mut out = Vec::with_capacity(events.len());
        for &event in events {
            let path = dir.join(event.as_str());
            let outcome = if !path.exists() {
                UninstallOutcome::Missing
            } else if !file_is_managed(&path) {
                UninstallOutcome::NotManaged(path)
            } else {
                fs::remove_file(&path)?;
                let backup = backup_path(&path);
                if backup.is_file() {
                    fs::rename(&backup, &path)?;
                    UninstallOutcome::Restored(path)
                } else {
                    UninstallOutcome::Removed(path)
                }
            };
            out.push((event, outcome));
        }
        Ok(out)
    }

    pub fn status(&self, event: HookEvent) -> HookDescriptor {
        let Some(dir) = self.git.hooks_dir() else {
            return HookDescriptor::absent(event);
        };
        let path = dir.join(event.as_str());
        HookDescriptor {
            event,
            installed: path.is_file(),
            managed: file_is_managed(&path),
            executable: is_executable(&path),
            path: Some(path),
        }
    }

    pub fn status_all(&self) -> Vec<HookDescriptor> {
        HookEvent::ALL.iter().map(|&e| self.status(e)).collect()
    }
}

fn backup_path(hook: &Path) -> PathBuf {
    let mut name = hook.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(BACKUP_SUFFIX);
    hook.with_file_name(name)
}

/// Unreadable files count as not ours.
fn file_is_managed(path: &Path) -> bool {
    fs::read_to_string(path)
        .map(|content| is_managed(&content))
        .unwrap_or(false)
}

#[cfg(unix)]
fn make_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms)
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::MARKER;
    use crate::test_support::init_repo;
    use roadmap_git::RepoContext;

    fn repo() -> (tempfile::TempDir, GitExecutor) {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        let exec = GitExecutor::new(RepoContext::new(dir.path()));
        (dir, exec)
    }

    #[test]
    fn install_then_status_reports_healthy() {
        let (_dir, exec) = repo();
        let installer = HookInstaller::new(&exec).with_binary("true");
        let results = installer.install(&[HookEvent::PostCommit], false).unwrap();
        assert!(matches!(results[0].1, Ok(InstallOutcome::Installed(_))));

        let status = installer.status(HookEvent::PostCommit);
        assert!(status.installed);
        assert!(status.managed);
        assert!(status.executable);
        assert!(status.is_healthy());
        assert!(!installer.status(HookEvent::PrePush).installed);
    }

    #[test]
    fn install_all_by_default_and_reinstall_overwrites() {
        let (_dir, exec) = repo();
        let installer = HookInstaller::new(&exec).with_binary("true");
        assert_eq!(installer.install(&[], false).unwrap().len(), 4);
        let again = installer.install(&[], false).unwrap();
        assert!(again
            .iter()
            .all(|(_, r)| matches!(r, Ok(InstallOutcome::Installed(_)))));
        assert!(installer.status_all().iter().all(HookDescriptor::is_healthy));
    }

    #[test]
    fn uninstall_removes_managed_hook() {
        let (_dir, exec) = repo();
        let installer = HookInstaller::new(&exec).with_binary("true");
        installer.install(&[HookEvent::PostCommit], false).unwrap();
        let out = installer.uninstall(&[HookEvent::PostCommit]).unwrap();
        assert!(matches!(out[0].1, UninstallOutcome::Removed(_)));
        assert!(!installer.status(HookEvent::PostCommit).installed);

        let out = installer.uninstall(&[HookEvent::PostCommit]).unwrap();
        assert_eq!(out[0].1, UninstallOutcome::Missing);
    }

    #[test]
    fn foreign_hook_is_left_untouched() {
        let (_dir, exec) = repo();
        let installer = HookInstaller::new(&exec).with_binary("true");
        let path = exec.hooks_dir().unwrap().join("post-commit");
        fs::write(&path, "#!/bin/sh\necho mine\n").unwrap();

        let out = installer.uninstall(&[HookEvent::PostCommit]).unwrap();
        assert!(matches!(out[0].1, UninstallOutcome::NotManaged(_)));
        assert_eq!(fs::read_to_string(&path).unwrap(), "#!/bin/sh\necho mine\n");

        let refused = installer.install(&[HookEvent::PostCommit], false).unwrap();
        assert!(matches!(refused[0].1, Err(GitError::ForeignHook(_))));
        assert_eq!(fs::read_to_string(&path).unwrap(), "#!/bin/sh\necho mine\n");

        let status = installer.status(HookEvent::PostCommit);
        assert!(status.installed);
        assert!(!status.managed);
        assert!(!status.executable);
    }

    #[test]
    fn forced_install_backs_up_and_uninstall_restores() {
        let (_dir, exec) = repo();
        let installer = HookInstaller::new(&exec).with_binary("true");
        let path = exec.hooks_dir().unwrap().join("pre-push");
        fs::write(&path, "#!/bin/sh\necho mine\n").unwrap();

        let out = installer.install(&[HookEvent::PrePush], true).unwrap();
        let Ok(InstallOutcome::Replaced { backup, .. }) = &out[0].1 else {
            panic!("expected replacement, got {:?}", out[0].1);
        };
        assert!(backup.ends_with("pre-push.roadmap.bak"));
        assert!(fs::read_to_string(&path).unwrap().contains(MARKER));

        let out = installer.uninstall(&[HookEvent::PrePush]).unwrap();
        assert!(matches!(out[0].1, UninstallOutcome::Restored(_)));
        assert_eq!(fs::read_to_string(&path).unwrap(), "#!/bin/sh\necho mine\n");
    }

    #[test]
    fn outside_repository_install_fails() {
        let dir = tempfile::tempdir().unwrap();
        let exec = GitExecutor::new(RepoContext::new(dir.path()));
        let installer = HookInstaller::new(&exec);
        assert!(matches!(installer.install(&[], false), Err(GitError::NotARepository)));
        assert!(matches!(installer.uninstall(&[]), Err(GitError::NotARepository)));
        assert_eq!(
            installer.status(HookEvent::PostMerge),
            HookDescriptor::absent(HookEvent::PostMerge)
        );
    }

    #[test]
    fn missing_hooks_directory_is_reported() {
        let (dir, exec) = repo();
        fs::remove_dir_all(dir.path().join(".git").join("hooks")).unwrap();
        assert!(matches!(
            HookInstaller::new(&exec).install(&[], false),
            Err(GitError::HooksDirMissing(_))
        ));
    }
}

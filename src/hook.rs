//! `leakgate install`: wire the gate into the repository's pre-commit hook.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::GateError;

const HOOK_SCRIPT: &str = "#!/bin/sh\n\
# Installed by `leakgate install`.\n\
# Blocks the commit when the configured secret scanner flags staged changes.\n\
exec leakgate \"$@\"\n";

/// Install the pre-commit hook for the repository containing the current
/// directory. Refuses to overwrite an existing hook unless `force` is set.
/// Returns the path of the written hook.
pub fn install(force: bool) -> Result<PathBuf, GateError> {
    install_in(None, force)
}

fn install_in(dir: Option<&Path>, force: bool) -> Result<PathBuf, GateError> {
    let mut cmd = Command::new("git");
    cmd.args(["rev-parse", "--absolute-git-dir"]);
    if let Some(dir) = dir {
        cmd.current_dir(dir);
    }
    let output = cmd.output().map_err(|e| GateError::Install {
        reason: format!("failed to run git: {e}"),
    })?;
    if !output.status.success() {
        return Err(GateError::Install {
            reason: "not inside a git repository".into(),
        });
    }

    let git_dir = PathBuf::from(String::from_utf8_lossy(&output.stdout).trim());
    let hooks_dir = git_dir.join("hooks");
    std::fs::create_dir_all(&hooks_dir).map_err(|e| GateError::Install {
        reason: format!("cannot create {}: {e}", hooks_dir.display()),
    })?;

    let hook_path = hooks_dir.join("pre-commit");
    if hook_path.exists() && !force {
        return Err(GateError::Install {
            reason: format!(
                "{} already exists (use --force to overwrite)",
                hook_path.display()
            ),
        });
    }

    std::fs::write(&hook_path, HOOK_SCRIPT).map_err(|e| GateError::Install {
        reason: format!("cannot write {}: {e}", hook_path.display()),
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&hook_path, std::fs::Permissions::from_mode(0o755)).map_err(
            |e| GateError::Install {
                reason: format!("cannot mark {} executable: {e}", hook_path.display()),
            },
        )?;
    }

    Ok(hook_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn git_available() -> bool {
        Command::new("git")
            .arg("--version")
            .output()
            .is_ok_and(|o| o.status.success())
    }

    fn init_repo(dir: &Path) {
        let status = Command::new("git")
            .args(["init", "-q"])
            .current_dir(dir)
            .status()
            .unwrap();
        assert!(status.success());
    }

    #[test]
    fn installs_executable_hook() {
        if !git_available() {
            return;
        }
        let tmp = tempfile::tempdir().unwrap();
        init_repo(tmp.path());

        let hook = install_in(Some(tmp.path()), false).unwrap();
        assert!(hook.ends_with("hooks/pre-commit"));
        let script = std::fs::read_to_string(&hook).unwrap();
        assert!(script.starts_with("#!/bin/sh"));
        assert!(script.contains("exec leakgate"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&hook).unwrap().permissions().mode();
            assert_eq!(mode & 0o111, 0o111, "hook not executable: {mode:o}");
        }
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        if !git_available() {
            return;
        }
        let tmp = tempfile::tempdir().unwrap();
        init_repo(tmp.path());

        install_in(Some(tmp.path()), false).unwrap();
        let err = install_in(Some(tmp.path()), false).unwrap_err();
        assert!(err.to_string().contains("already exists"));

        // --force overwrites
        install_in(Some(tmp.path()), true).unwrap();
    }

    #[test]
    fn outside_a_repository_fails() {
        if !git_available() {
            return;
        }
        let tmp = tempfile::tempdir().unwrap();
        let err = install_in(Some(tmp.path()), false).unwrap_err();
        assert!(matches!(err, GateError::Install { .. }));
    }
}

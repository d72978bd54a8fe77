use std::path::PathBuf;
use std::process::Command;

use crate::config::GitConfig;
use crate::error::GateError;
use crate::extract::{CandidateChange, ChangeSource};

/// Extracts the staged diff by running `git diff` with configured arguments.
pub struct GitStagedChanges {
    diff_args: Vec<String>,
    /// Run git in this directory instead of the process cwd. Used by tests.
    work_dir: Option<PathBuf>,
}

impl GitStagedChanges {
    pub fn from_config(config: &GitConfig) -> Self {
        Self {
            diff_args: config.diff_args.clone(),
            work_dir: None,
        }
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }
}

impl ChangeSource for GitStagedChanges {
    fn extract(&self) -> Result<CandidateChange, GateError> {
        let mut cmd = Command::new("git");
        cmd.arg("diff").args(&self.diff_args);
        if let Some(dir) = &self.work_dir {
            cmd.current_dir(dir);
        }

        let output = cmd.output().map_err(|e| GateError::ContentUnavailable {
            reason: format!("failed to run git: {e}"),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GateError::ContentUnavailable {
                reason: format!(
                    "git diff exited with {}: {}",
                    output.status,
                    stderr.trim()
                ),
            });
        }

        log::debug!("extracted {} bytes of staged diff", output.stdout.len());
        Ok(CandidateChange::new(output.stdout))
    }
}

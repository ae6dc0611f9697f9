//! Repository context resolution for gitlock.
//!
//! Finds the repository root from any working directory and derives the
//! paths gitlock reads and writes:
//!
//! - `{repo_root}/.gitlock.yaml` : shared, committed configuration
//! - `{git_common_dir}/gitlock/prefs.json` : per-clone preferences
//! - `{git_common_dir}/gitlock/events.ndjson` : per-clone audit log
//!
//! Per-clone state lives under the git directory so it is never committed
//! and is shared by every worktree of the clone.

use crate::config::{CONFIG_FILE_NAME, Config};
use crate::error::{GitLockError, Result};
use crate::git;
use crate::target::LockTarget;
use std::env;
use std::path::{Path, PathBuf};

/// Directory under the git common dir holding per-clone state.
pub const STATE_DIR_NAME: &str = "gitlock";

/// Resolved paths for one repository.
#[derive(Debug, Clone)]
pub struct RepoContext {
    /// Absolute path to the repository root.
    pub repo_root: PathBuf,

    /// Directory the command was invoked from.
    pub cwd: PathBuf,

    /// Absolute path to the per-clone state directory.
    pub state_dir: PathBuf,
}

impl RepoContext {
    /// Resolve the context from the current working directory.
    pub fn resolve() -> Result<Self> {
        let cwd = env::current_dir().map_err(|e| {
            GitLockError::UserError(format!("failed to get current working directory: {}", e))
        })?;

        Self::resolve_from(&cwd)
    }

    /// Resolve the context from a specific directory.
    pub fn resolve_from<P: AsRef<Path>>(cwd: P) -> Result<Self> {
        let cwd = cwd.as_ref();
        let repo_root = git::get_repo_root(cwd)?;
        let state_dir = git::get_common_dir(cwd)?.join(STATE_DIR_NAME);

        Ok(Self {
            repo_root,
            cwd: cwd.to_path_buf(),
            state_dir,
        })
    }

    pub fn config_path(&self) -> PathBuf {
        self.repo_root.join(CONFIG_FILE_NAME)
    }

    pub fn prefs_path(&self) -> PathBuf {
        self.state_dir.join("prefs.json")
    }

    pub fn events_path(&self) -> PathBuf {
        self.state_dir.join("events.ndjson")
    }

    /// Load `.gitlock.yaml`, or defaults when absent.
    pub fn load_config(&self) -> Result<Config> {
        Config::load_or_default(self.config_path())
    }

    /// Turn command-line input into a lock target.
    pub fn target(&self, input: &str) -> Result<LockTarget> {
        LockTarget::resolve(&self.repo_root, &self.cwd, input)
    }

    /// Whether `target` is read-only on disk.
    ///
    /// A missing file is not read-only: there is nothing to protect yet.
    pub fn is_read_only(&self, target: &LockTarget) -> Result<bool> {
        let path = target.on_disk(&self.repo_root);
        match std::fs::metadata(&path) {
            Ok(meta) => Ok(meta.permissions().readonly()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(GitLockError::UserError(format!(
                "failed to read metadata of '{}': {}",
                path.display(),
                e
            ))),
        }
    }
}

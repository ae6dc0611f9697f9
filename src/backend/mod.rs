//! Lock backend adapter over `git lfs`.
//!
//! Translates coordinator intents into backend invocations:
//!
//! | intent          | invocation                                   |
//! |-----------------|----------------------------------------------|
//! | lock            | `git lfs lock <path>`                        |
//! | unlock          | `git lfs unlock <path>`                      |
//! | force unlock    | `git lfs unlock <path> --force`              |
//! | owner query     | `git lfs locks --path <path> --json`         |
//! | state query     | `git lfs locks --verify --json --path <path>`|
//! | list            | `git lfs locks --json`                       |
//!
//! Exit code 0 means success. A non-zero exit is a normal outcome and is
//! returned as `false`; only a launch failure propagates as an error. The
//! adapter never retries.

mod records;


pub use records::{LockRecord, parse_first_owner};

use crate::error::{GitLockError, Result};
use crate::runner::{CommandRunner, RunOutput};
use crate::target::LockTarget;
use std::fmt;
use tracing::{debug, warn};

/// Default backend program.
pub const DEFAULT_BACKEND_COMMAND: &str = "git";

/// Lock status of one target as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockState {
    Unlocked,
    LockedBySelf,
    /// Held by someone else; `None` when the owner could not be determined.
    LockedByOther(Option<String>),
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockState::Unlocked => write!(f, "unlocked"),
            LockState::LockedBySelf => write!(f, "locked by you"),
            LockState::LockedByOther(owner) => {
                write!(f, "locked by {}", owner.as_deref().unwrap_or("unknown"))
            }
        }
    }
}

/// `git lfs` lock adapter over a [`CommandRunner`].
#[derive(Debug, Clone)]
pub struct LfsBackend<R> {
    runner: R,
    program: String,
    leading_args: Vec<String>,
}

impl<R: CommandRunner> LfsBackend<R> {
    /// Adapter invoking plain `git`.
    #[cfg(test)]
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            program: DEFAULT_BACKEND_COMMAND.to_string(),
            leading_args: Vec::new(),
        }
    }

    /// Adapter invoking a configured command line, e.g. `git -c lfs.url=...`.
    pub fn with_command(runner: R, command_line: &str) -> Result<Self> {
        let mut words = shell_words::split(command_line).map_err(|e| {
            GitLockError::UserError(format!(
                "failed to parse backend command '{}': {}\n\
                 Fix: check for unmatched quotes or invalid escape sequences.",
                command_line, e
            ))
        })?;

        if words.is_empty() {
            return Err(GitLockError::UserError(
                "backend command is empty".to_string(),
            ));
        }

        let program = words.remove(0);
        Ok(Self {
            runner,
            program,
            leading_args: words,
        })
    }

    /// Program name the adapter launches.
    pub fn program(&self) -> &str {
        &self.program
    }

    fn invoke(&self, args: &[&str], progress: bool) -> Result<RunOutput> {
        let mut full: Vec<&str> = self.leading_args.iter().map(String::as_str).collect();
        full.extend_from_slice(args);
        if progress {
            self.runner.run_with_progress(&self.program, &full)
        } else {
            self.runner.run(&self.program, &full)
        }
    }

    /// Lock `target`; `true` iff the backend exits with code 0.
    pub fn lock(&self, target: &LockTarget) -> Result<bool> {
        let output = self.invoke(&["lfs", "lock", target.as_str()], true)?;
        debug!(target = %target, exit_code = output.exit_code, "lfs lock");
        Ok(output.success())
    }

    /// Unlock `target`; `true` iff the backend exits with code 0.
    pub fn unlock(&self, target: &LockTarget) -> Result<bool> {
        let output = self.invoke(&["lfs", "unlock", target.as_str()], true)?;
        debug!(target = %target, exit_code = output.exit_code, "lfs unlock");
        Ok(output.success())
    }

    /// Break whatever lock exists on `target`, then lock it.
    ///
    /// The force-unlock result is ignored; the outcome is the lock step's.
    pub fn force_unlock_then_lock(&self, target: &LockTarget) -> Result<bool> {
        let unlocked = self.invoke(&["lfs", "unlock", target.as_str(), "--force"], true)?;
        if !unlocked.success() {
            warn!(target = %target, exit_code = unlocked.exit_code, stderr = %unlocked.stderr, "force unlock did not succeed");
        }
        self.lock(target)
    }

    /// Name of whoever holds `target`, if anyone and if it can be parsed.
    pub fn query_owner(&self, target: &LockTarget) -> Result<Option<String>> {
        let output = self.invoke(&["lfs", "locks", "--path", target.as_str(), "--json"], false)?;
        let owner = parse_first_owner(&output.stdout);
        if owner.is_none() {
            debug!(target = %target, exit_code = output.exit_code, "lock owner unknown");
        }
        Ok(owner)
    }

    /// Current lock state of `target`, derived fresh from the backend.
    ///
    /// Uses the verify listing to tell our locks from theirs; when the
    /// server cannot verify, a listed lock is ours when its owner matches
    /// `user.name` and held by its listed owner otherwise.
    pub fn lock_state(&self, target: &LockTarget) -> Result<LockState> {
        let output = self.invoke(
            &["lfs", "locks", "--verify", "--json", "--path", target.as_str()],
            false,
        )?;

        if output.success()
            && let Ok(report) = records::parse_verify(&output.stdout)
        {
            let matches = |r: &LockRecord| r.path.is_empty() || r.path == target.as_str();
            if report.ours.iter().any(matches) {
                return Ok(LockState::LockedBySelf);
            }
            if let Some(record) = report.theirs.iter().find(|r| matches(r)) {
                return Ok(LockState::LockedByOther(
                    record.owner_name().map(str::to_string),
                ));
            }
            return Ok(LockState::Unlocked);
        }

        debug!(target = %target, "lock verification unavailable, falling back to owner query");
        let listing = self.invoke(&["lfs", "locks", "--path", target.as_str(), "--json"], false)?;
        if !listing.success() {
            return Err(GitLockError::UserError(format!(
                "could not query lock state of '{}' (exit code {}): {}",
                target, listing.exit_code, listing.stderr
            )));
        }
        let owner = match records::parse_records(&listing.stdout) {
            Ok(records) if records.is_empty() => return Ok(LockState::Unlocked),
            Ok(records) => records[0].owner_name().map(str::to_string),
            Err(_) => parse_first_owner(&listing.stdout),
        };

        // Without verification the owner name is all we have to go on.
        if owner.is_some() && owner == self.user_name()? {
            return Ok(LockState::LockedBySelf);
        }
        Ok(LockState::LockedByOther(owner))
    }

    /// `git config user.name`, if set.
    fn user_name(&self) -> Result<Option<String>> {
        let output = self.invoke(&["config", "user.name"], false)?;
        if output.success() && !output.stdout.is_empty() {
            Ok(Some(output.stdout))
        } else {
            Ok(None)
        }
    }

    /// Every lock currently held on the server.
    pub fn list_locks(&self) -> Result<Vec<LockRecord>> {
        let output = self.invoke(&["lfs", "locks", "--json"], false)?;
        if !output.success() {
            return Err(GitLockError::UserError(format!(
                "{} lfs locks failed (exit code {}): {}",
                self.program,
                output.exit_code,
                if output.stderr.is_empty() {
                    &output.stdout
                } else {
                    &output.stderr
                }
            )));
        }
        records::parse_records(&output.stdout).map_err(|e| {
            GitLockError::UserError(format!("failed to parse lock listing: {}", e))
        })
    }
}

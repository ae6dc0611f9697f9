//! Error types for the gitlock CLI.
//!
//! Uses thiserror for derive macros and provides user-actionable error messages.
//! Inside the coordinator a lock held by someone else is an ordinary outcome
//! (`LockResult::AlreadyHeldByOther`); commands report it as `LockContention`
//! once they have printed their per-file results.

use crate::exit_codes;
use thiserror::Error;

/// Main error type for gitlock operations.
#[derive(Error, Debug)]
pub enum GitLockError {
    /// User provided invalid arguments or the repository is in an invalid state.
    #[error("{0}")]
    UserError(String),

    /// A target is locked by someone else, or a write stayed blocked.
    #[error("{0}")]
    LockContention(String),

    /// The lock backend could not be launched, or it hung past the timeout.
    #[error("lock backend unavailable: {0}")]
    BackendUnavailable(String),

    /// A confirmed force-acquire did not end with us holding the lock.
    #[error("force acquire failed: {0}")]
    ForceAcquireFailed(String),
}

impl GitLockError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            GitLockError::UserError(_) => exit_codes::USER_ERROR,
            GitLockError::LockContention(_) => exit_codes::LOCK_CONTENTION,
            GitLockError::BackendUnavailable(_) => exit_codes::BACKEND_FAILURE,
            GitLockError::ForceAcquireFailed(_) => exit_codes::FORCE_ACQUIRE_FAILURE,
        }
    }
}

/// Result type alias for gitlock operations.
pub type Result<T> = std::result::Result<T, GitLockError>;

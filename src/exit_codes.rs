//! Exit code constants for the gitlock CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, bad config, not a repository)
//! - 2: Lock contention (held by someone else, or a write was blocked)
//! - 3: Lock backend unavailable (launch failure or timeout)
//! - 4: Force acquire failure

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, invalid configuration or repository state.
pub const USER_ERROR: i32 = 1;

/// Contention: a target is locked by another user, or a write stayed blocked.
pub const LOCK_CONTENTION: i32 = 2;

/// The backend program could not be launched or did not finish in time.
pub const BACKEND_FAILURE: i32 = 3;

/// A confirmed force-acquire did not succeed.
pub const FORCE_ACQUIRE_FAILURE: i32 = 4;

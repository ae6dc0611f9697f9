//! Lock coordinator.
//!
//! Owns the lock backend and the persisted system toggle. The coordinator
//! keeps no lock state of its own: the backend (a remote lock server) is the
//! only source of truth, and the toggle is re-read from the preference store
//! on every call.
//!
//! Per-target state machine, as seen from here:
//!
//! ```text
//! Unlocked --try_lock ok--> LockedBySelf --unlock--> Unlocked
//! Unlocked --try_lock fails--> LockedByOther --force_acquire ok--> LockedBySelf
//! ```


use crate::backend::{LfsBackend, LockState};
use crate::error::Result;
use crate::prefs::{DISABLED_KEY, PreferenceStore};
use crate::runner::CommandRunner;
use crate::target::LockTarget;
use tracing::{debug, info};

/// Label shown when the backend cannot say who holds a lock.
pub const UNKNOWN_OWNER: &str = "unknown";

/// Display form of an optional owner.
pub fn owner_label(owner: Option<&str>) -> &str {
    owner.unwrap_or(UNKNOWN_OWNER)
}

/// Outcome of [`LockCoordinator::try_lock`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockResult {
    /// We now hold the lock.
    Locked,
    /// Somebody else holds it; `None` when the owner query came back empty.
    AlreadyHeldByOther(Option<String>),
    /// Locking is switched off; the backend was not contacted.
    Disabled,
}

/// Coordinates lock operations against the backend and the system toggle.
pub struct LockCoordinator<R, S> {
    backend: LfsBackend<R>,
    prefs: S,
}

impl<R: CommandRunner, S: PreferenceStore> LockCoordinator<R, S> {
    pub fn new(backend: LfsBackend<R>, prefs: S) -> Self {
        Self { backend, prefs }
    }

    /// Whether locking is switched off, read fresh from storage.
    pub fn is_disabled(&self) -> Result<bool> {
        self.prefs.get_bool(DISABLED_KEY, false)
    }

    /// Try to lock `target`, reporting the holder on contention.
    pub fn try_lock(&self, target: &LockTarget) -> Result<LockResult> {
        if self.is_disabled()? {
            debug!(target = %target, "locking disabled, skipping backend");
            return Ok(LockResult::Disabled);
        }

        if self.backend.lock(target)? {
            info!(target = %target, "locked");
            return Ok(LockResult::Locked);
        }

        let owner = self.backend.query_owner(target)?;
        info!(target = %target, owner = owner_label(owner.as_deref()), "lock held by another user");
        Ok(LockResult::AlreadyHeldByOther(owner))
    }

    /// Release our lock on `target`.
    pub fn unlock(&self, target: &LockTarget) -> Result<bool> {
        let released = self.backend.unlock(target)?;
        info!(target = %target, released, "unlock");
        Ok(released)
    }

    /// Break the current holder's lock and take it.
    ///
    /// Only call after the user explicitly confirmed the escalation.
    pub fn force_acquire(&self, target: &LockTarget) -> Result<bool> {
        let acquired = self.backend.force_unlock_then_lock(target)?;
        info!(target = %target, acquired, "force acquire");
        Ok(acquired)
    }

    /// Switch locking off for this clone. There is no counterpart here;
    /// re-enabling happens outside the coordinator.
    pub fn disable_system(&self) -> Result<()> {
        self.prefs.set_bool(DISABLED_KEY, true)?;
        info!("locking disabled");
        Ok(())
    }

    /// Who holds `target`, if it can be determined.
    pub fn who_holds(&self, target: &LockTarget) -> Result<Option<String>> {
        self.backend.query_owner(target)
    }

    /// Current backend state of `target`.
    pub fn lock_state(&self, target: &LockTarget) -> Result<LockState> {
        self.backend.lock_state(target)
    }

    pub fn backend(&self) -> &LfsBackend<R> {
        &self.backend
    }

    pub fn prefs(&self) -> &S {
        &self.prefs
    }
}

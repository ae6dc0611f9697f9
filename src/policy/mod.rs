//! Write policy and the interactive lock flow.
//!
//! This is the surface an embedding tool (an editor save hook, a dirty-file
//! watcher, a pre-commit check) calls before touching a lockable file. It
//! never decides on its own to force anything: every escalation beyond a
//! plain lock attempt goes through the injected [`Prompter`].

mod watcher;

#[cfg(test)]
mod tests;

pub use watcher::{ModifiedWatcher, Observation};

use crate::coordinator::{LockCoordinator, LockResult, owner_label};
use crate::error::Result;
use crate::prefs::PreferenceStore;
use crate::runner::CommandRunner;
use crate::target::LockTarget;
use std::fmt;
use tracing::debug;

/// What to do with a pending write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    Block,
    EscalateToLockFlow,
}

/// The user's answer when warned about an unlocked, read-only file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserChoice {
    /// Try to take the lock now.
    LockNow,
    /// Carry on without the lock; ask again next time.
    IgnoreOnce,
    /// Carry on without the lock; stay quiet until the file is clean again.
    IgnoreSession,
    /// Turn locking off for this clone.
    DisableSystem,
}

/// Decision callback standing in for editor dialogs.
pub trait Prompter {
    /// Ask what to do about `target`, which is read-only on disk.
    fn choose(&mut self, target: &LockTarget) -> Result<UserChoice>;

    /// Ask whether to break `owner`'s lock on `target`.
    fn confirm_force(&mut self, target: &LockTarget, owner: Option<&str>) -> Result<bool>;

    /// Ask for confirmation before disabling locking.
    fn confirm_disable(&mut self) -> Result<bool>;

    /// Tell the user what happened.
    fn notify(&mut self, message: &str);
}

/// Result of one run of [`run_lock_flow`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome {
    Locked,
    ForceAcquired { previous_owner: Option<String> },
    ForceFailed { owner: Option<String> },
    /// Lock held elsewhere and the user chose to keep working unsaved.
    WorkingWithoutLock { owner: Option<String> },
    IgnoredOnce,
    IgnoredForSession,
    Disabled,
    DisableDeclined,
    /// Locking was already off by the time the lock was attempted.
    AlreadyDisabled,
}

impl FlowOutcome {
    /// Whether the target should be silenced until it is next seen clean.
    pub fn silences_target(&self) -> bool {
        matches!(
            self,
            FlowOutcome::IgnoredForSession | FlowOutcome::WorkingWithoutLock { .. }
        )
    }
}

impl fmt::Display for FlowOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowOutcome::Locked => write!(f, "locked"),
            FlowOutcome::ForceAcquired { previous_owner } => write!(
                f,
                "force-acquired from {}",
                owner_label(previous_owner.as_deref())
            ),
            FlowOutcome::ForceFailed { owner } => {
                write!(f, "force acquire from {} failed", owner_label(owner.as_deref()))
            }
            FlowOutcome::WorkingWithoutLock { owner } => write!(
                f,
                "working without lock (held by {})",
                owner_label(owner.as_deref())
            ),
            FlowOutcome::IgnoredOnce => write!(f, "ignored once"),
            FlowOutcome::IgnoredForSession => write!(f, "ignored for this session"),
            FlowOutcome::Disabled => write!(f, "locking disabled"),
            FlowOutcome::DisableDeclined => write!(f, "disable cancelled"),
            FlowOutcome::AlreadyDisabled => write!(f, "locking already disabled"),
        }
    }
}

/// Decide what to do with a write to `target`.
///
/// Disabled locking and writable files proceed; a read-only file means we
/// do not hold the lock, so the caller must run the lock flow.
pub fn decide<R, S>(
    coordinator: &LockCoordinator<R, S>,
    target: &LockTarget,
    is_read_only: bool,
) -> Result<Decision>
where
    R: CommandRunner,
    S: PreferenceStore,
{
    if coordinator.is_disabled()? {
        return Ok(Decision::Proceed);
    }
    if !is_read_only {
        return Ok(Decision::Proceed);
    }
    debug!(target = %target, "read-only target needs the lock flow");
    Ok(Decision::EscalateToLockFlow)
}

/// Ask the user about `target` and carry out their choice.
pub fn run_lock_flow<R, S, P>(
    coordinator: &LockCoordinator<R, S>,
    target: &LockTarget,
    prompter: &mut P,
) -> Result<FlowOutcome>
where
    R: CommandRunner,
    S: PreferenceStore,
    P: Prompter + ?Sized,
{
    match prompter.choose(target)? {
        UserChoice::LockNow => lock_now(coordinator, target, prompter),
        UserChoice::IgnoreOnce => Ok(FlowOutcome::IgnoredOnce),
        UserChoice::IgnoreSession => Ok(FlowOutcome::IgnoredForSession),
        UserChoice::DisableSystem => {
            if prompter.confirm_disable()? {
                coordinator.disable_system()?;
                prompter.notify("Git locking disabled for this clone.");
                Ok(FlowOutcome::Disabled)
            } else {
                Ok(FlowOutcome::DisableDeclined)
            }
        }
    }
}

fn lock_now<R, S, P>(
    coordinator: &LockCoordinator<R, S>,
    target: &LockTarget,
    prompter: &mut P,
) -> Result<FlowOutcome>
where
    R: CommandRunner,
    S: PreferenceStore,
    P: Prompter + ?Sized,
{
    match coordinator.try_lock(target)? {
        LockResult::Locked => {
            prompter.notify(&format!(
                "Locking successful! Enjoy exclusive control over {}",
                target
            ));
            Ok(FlowOutcome::Locked)
        }
        LockResult::Disabled => Ok(FlowOutcome::AlreadyDisabled),
        LockResult::AlreadyHeldByOther(owner) => {
            let holder = owner_label(owner.as_deref()).to_string();
            prompter.notify(&format!(
                "Locking failed! {} has {} currently locked",
                holder, target
            ));

            if !prompter.confirm_force(target, owner.as_deref())? {
                return Ok(FlowOutcome::WorkingWithoutLock { owner });
            }

            if coordinator.force_acquire(target)? {
                prompter.notify(&format!(
                    "Force acquire successful! Make sure {} knows about this!",
                    holder
                ));
                Ok(FlowOutcome::ForceAcquired {
                    previous_owner: owner,
                })
            } else {
                prompter.notify(&format!(
                    "Force acquire of {} failed. Check `git lfs locks` and resolve it manually.",
                    target
                ));
                Ok(FlowOutcome::ForceFailed { owner })
            }
        }
    }
}

/// Outcome of [`gate_write`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateOutcome {
    /// `Proceed` or `Block`; never `EscalateToLockFlow`.
    pub decision: Decision,
    /// The lock flow result, when one ran.
    pub flow: Option<FlowOutcome>,
}

/// Gate a pending write to `target`, running the lock flow if needed.
///
/// After the flow the target is probed again: taking an lfs lock makes
/// the file writable, so only files that are still read-only are blocked.
pub fn gate_write<R, S, P, F>(
    coordinator: &LockCoordinator<R, S>,
    target: &LockTarget,
    prompter: &mut P,
    is_read_only: F,
) -> Result<GateOutcome>
where
    R: CommandRunner,
    S: PreferenceStore,
    P: Prompter + ?Sized,
    F: Fn(&LockTarget) -> Result<bool>,
{
    match decide(coordinator, target, is_read_only(target)?)? {
        Decision::EscalateToLockFlow => {
            let flow = run_lock_flow(coordinator, target, prompter)?;
            let decision = if is_read_only(target)? {
                Decision::Block
            } else {
                Decision::Proceed
            };
            Ok(GateOutcome {
                decision,
                flow: Some(flow),
            })
        }
        decision => Ok(GateOutcome {
            decision,
            flow: None,
        }),
    }
}

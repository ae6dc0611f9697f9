//! Session watcher for files modified without a lock.

use super::{Decision, FlowOutcome, Prompter, decide, run_lock_flow};
use crate::coordinator::LockCoordinator;
use crate::error::Result;
use crate::prefs::PreferenceStore;
use crate::runner::CommandRunner;
use crate::target::LockTarget;
use std::collections::HashSet;
use tracing::debug;

/// Snapshot of one watched file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub target: LockTarget,
    /// The file differs from what is committed.
    pub modified: bool,
    /// The file is read-only on disk (we do not hold its lock).
    pub read_only: bool,
}

/// Warns about modified, read-only files, remembering which ones the user
/// silenced for the rest of the session.
///
/// A silenced target stays quiet only while it remains modified: the first
/// poll that sees it clean drops it from the ignored set.
#[derive(Debug, Default)]
pub struct ModifiedWatcher {
    ignored: HashSet<LockTarget>,
}

impl ModifiedWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn is_ignored(&self, target: &LockTarget) -> bool {
        self.ignored.contains(target)
    }

    /// Targets currently silenced.
    pub fn ignored(&self) -> impl Iterator<Item = &LockTarget> {
        self.ignored.iter()
    }

    /// [`ModifiedWatcher::poll_with`], collecting the outcomes.
    #[cfg(test)]
    pub fn poll<R, S, P>(
        &mut self,
        coordinator: &LockCoordinator<R, S>,
        observations: &[Observation],
        prompter: &mut P,
    ) -> Result<Vec<(LockTarget, FlowOutcome)>>
    where
        R: CommandRunner,
        S: PreferenceStore,
        P: Prompter + ?Sized,
    {
        let mut outcomes = Vec::new();
        self.poll_with(coordinator, observations, prompter, |target, outcome| {
            outcomes.push((target.clone(), outcome.clone()));
        })?;
        Ok(outcomes)
    }

    /// Process one round of observations, running the lock flow for every
    /// modified read-only target that is not silenced. Each outcome goes to
    /// `on_outcome` as soon as its flow finishes.
    ///
    /// A flow that fails part way stops the round, but every outcome
    /// produced before it has already been delivered.
    pub fn poll_with<R, S, P, F>(
        &mut self,
        coordinator: &LockCoordinator<R, S>,
        observations: &[Observation],
        prompter: &mut P,
        mut on_outcome: F,
    ) -> Result<()>
    where
        R: CommandRunner,
        S: PreferenceStore,
        P: Prompter + ?Sized,
        F: FnMut(&LockTarget, &FlowOutcome),
    {
        if coordinator.is_disabled()? {
            return Ok(());
        }

        for observation in observations {
            let target = &observation.target;

            if !observation.modified {
                if self.ignored.remove(target) {
                    debug!(target = %target, "clean again, no longer ignored");
                }
                continue;
            }

            if self.ignored.contains(target) {
                continue;
            }

            if decide(coordinator, target, observation.read_only)? != Decision::EscalateToLockFlow
            {
                continue;
            }

            let outcome = run_lock_flow(coordinator, target, prompter)?;
            if outcome.silences_target() {
                self.ignored.insert(target.clone());
            }
            on_outcome(target, &outcome);
        }

        Ok(())
    }
}

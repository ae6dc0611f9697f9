//! Implementation of `gitlock lock`, `unlock`, `force-lock` and `owner`.

use super::{Session, files, terminal_prompter};
use crate::cli::{ForceLockArgs, LockArgs, OwnerArgs, UnlockArgs};
use crate::coordinator::{LockResult, owner_label};
use crate::error::{GitLockError, Result};
use crate::events::{Event, EventAction};
use crate::policy::Prompter;
use crate::prefs::{DISABLED_KEY, PreferenceStore};
use crate::runner::CommandRunner;
use serde_json::json;

pub fn cmd_lock(args: LockArgs) -> Result<()> {
    lock_paths(&Session::open()?, &args.paths)
}

pub fn cmd_unlock(args: UnlockArgs) -> Result<()> {
    unlock_paths(&Session::open()?, &args.paths)
}

pub fn cmd_force_lock(args: ForceLockArgs) -> Result<()> {
    let session = Session::open()?;
    let mut prompter = terminal_prompter();
    force_lock_path(&session, &args.path, args.yes, prompter.as_mut())
}

pub fn cmd_owner(args: OwnerArgs) -> Result<()> {
    let session = Session::open()?;
    let target = session.ctx.target(&args.path)?;
    let owner = session.coordinator.who_holds(&target)?;
    println!("{}", owner_label(owner.as_deref()));
    Ok(())
}

pub(crate) fn lock_paths<R: CommandRunner>(session: &Session<R>, paths: &[String]) -> Result<()> {
    let targets = session.targets(paths)?;
    let mut contended = Vec::new();

    for target in &targets {
        match session.coordinator.try_lock(target)? {
            LockResult::Locked => {
                println!("Locked {}", target);
                session.record(Event::new(EventAction::Lock).with_target(target));
            }
            LockResult::AlreadyHeldByOther(owner) => {
                println!("{} is locked by {}", target, owner_label(owner.as_deref()));
                contended.push(target.to_string());
            }
            LockResult::Disabled => {
                println!("Git locking is disabled for this clone; {} not locked.", target);
            }
        }
    }

    if contended.is_empty() {
        return Ok(());
    }

    Err(GitLockError::LockContention(format!(
        "{} locked by someone else: {}\n\n\
         Run `gitlock force-lock <path>` to take a lock over.",
        files(contended.len()),
        contended.join(", ")
    )))
}

/// Unlock `paths`, switching locking back on first if it was disabled.
pub(crate) fn unlock_paths<R: CommandRunner>(session: &Session<R>, paths: &[String]) -> Result<()> {
    let targets = session.targets(paths)?;

    if session.coordinator.is_disabled()? {
        session.coordinator.prefs().set_bool(DISABLED_KEY, false)?;
        session.record(Event::new(EventAction::Enable));
        println!("Git locking re-enabled for this clone.");
    }

    let mut failed = Vec::new();
    for target in &targets {
        if session.coordinator.unlock(target)? {
            println!("Unlocked {}", target);
            session.record(Event::new(EventAction::Unlock).with_target(target));
        } else {
            failed.push(target.to_string());
        }
    }

    if failed.is_empty() {
        return Ok(());
    }

    Err(GitLockError::LockContention(format!(
        "failed to unlock {}: {}\n\n\
         Only the holder can release a lock; check with `gitlock owner <path>`.",
        files(failed.len()),
        failed.join(", ")
    )))
}

pub(crate) fn force_lock_path<R, P>(
    session: &Session<R>,
    path: &str,
    yes: bool,
    prompter: &mut P,
) -> Result<()>
where
    R: CommandRunner,
    P: Prompter + ?Sized,
{
    let target = session.ctx.target(path)?;
    let owner = session.coordinator.who_holds(&target)?;
    let holder = owner_label(owner.as_deref());

    if !yes && !prompter.confirm_force(&target, owner.as_deref())? {
        println!("Cancelled; {} is still locked by {}.", target, holder);
        return Ok(());
    }

    if !session.coordinator.force_acquire(&target)? {
        return Err(GitLockError::ForceAcquireFailed(format!(
            "{} (held by {})\n\n\
             Check `git lfs locks` and resolve it manually.",
            target, holder
        )));
    }

    session.record(
        Event::new(EventAction::ForceAcquire)
            .with_target(&target)
            .with_details(json!({ "previous_owner": owner })),
    );
    println!(
        "Force acquire successful! Make sure {} knows about this!",
        holder
    );
    Ok(())
}

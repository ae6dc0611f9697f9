//! Implementation of the `gitlock check` command.
//!
//! The write gate: run before saving files. Writable files pass straight
//! through; read-only ones (not locked by us) go through the lock flow, and
//! whatever is still read-only afterwards is reported as blocked.

use super::{Session, files, prompter_for, record_flow};
use crate::cli::CheckArgs;
use crate::error::{GitLockError, Result};
use crate::policy::{Decision, FlowOutcome, Prompter, gate_write};
use crate::runner::CommandRunner;

pub fn cmd_check(args: CheckArgs) -> Result<()> {
    let session = Session::open()?;
    let mut prompter = prompter_for(&args.prompt);
    check_paths(&session, &args.paths, prompter.as_mut())
}

pub(crate) fn check_paths<R, P>(session: &Session<R>, paths: &[String], prompter: &mut P) -> Result<()>
where
    R: CommandRunner,
    P: Prompter + ?Sized,
{
    let targets = session.targets(paths)?;
    let mut blocked = Vec::new();
    let mut force_failed = Vec::new();

    for target in &targets {
        let gate = gate_write(&session.coordinator, target, prompter, |t| {
            session.ctx.is_read_only(t)
        })?;

        if let Some(flow) = &gate.flow {
            record_flow(&session.ctx, target, flow);
            if matches!(flow, FlowOutcome::ForceFailed { .. }) {
                force_failed.push(target.to_string());
            }
        }

        match gate.decision {
            Decision::Proceed => println!("ok       {}", target),
            _ => {
                println!("blocked  {}", target);
                blocked.push(target.to_string());
            }
        }
    }

    if !force_failed.is_empty() {
        return Err(GitLockError::ForceAcquireFailed(force_failed.join(", ")));
    }

    if !blocked.is_empty() {
        return Err(GitLockError::LockContention(format!(
            "{} not writable without the lock: {}\n\n\
             Lock them with `gitlock lock <path>` before saving.",
            files(blocked.len()),
            blocked.join(", ")
        )));
    }

    Ok(())
}

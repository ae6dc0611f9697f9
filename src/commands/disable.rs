//! Implementation of the `gitlock disable` command.

use super::{Session, terminal_prompter};
use crate::cli::DisableArgs;
use crate::error::Result;
use crate::events::{Event, EventAction};
use crate::policy::Prompter;
use crate::runner::CommandRunner;

pub fn cmd_disable(args: DisableArgs) -> Result<()> {
    let session = Session::open()?;
    let mut prompter = terminal_prompter();
    disable_locking(&session, args.yes, prompter.as_mut())
}

pub(crate) fn disable_locking<R, P>(session: &Session<R>, yes: bool, prompter: &mut P) -> Result<()>
where
    R: CommandRunner,
    P: Prompter + ?Sized,
{
    if session.coordinator.is_disabled()? {
        println!("Git locking is already disabled for this clone.");
        return Ok(());
    }

    if !yes && !prompter.confirm_disable()? {
        println!("Cancelled.");
        return Ok(());
    }

    session.coordinator.disable_system()?;
    session.record(Event::new(EventAction::Disable));

    println!("Git locking disabled for this clone.");
    println!(
        "Re-enable it with `gitlock unlock <path>` or by editing {}",
        session.coordinator.prefs().path().display()
    );
    Ok(())
}

//! Implementation of the `gitlock status` command.
//!
//! Shows whether locking is enabled for this clone, then either the state
//! of the given files or every lock the server knows about.

use super::Session;
use crate::cli::StatusArgs;
use crate::error::Result;
use crate::runner::CommandRunner;

pub fn cmd_status(args: StatusArgs) -> Result<()> {
    show_status(&Session::open()?, &args.paths)
}

pub(crate) fn show_status<R: CommandRunner>(session: &Session<R>, paths: &[String]) -> Result<()> {
    let targets = session.targets(paths)?;
    let disabled = session.coordinator.is_disabled()?;

    println!("Git Locking Status");
    println!("==================");
    println!();
    if disabled {
        println!("Locking:  disabled for this clone");
        println!(
            "          re-enable with `gitlock unlock <path>` or by editing {}",
            session.coordinator.prefs().path().display()
        );
    } else {
        println!("Locking:  enabled");
    }
    println!("Backend:  {}", session.coordinator.backend().program());
    println!();

    if targets.is_empty() {
        let locks = session.coordinator.backend().list_locks()?;
        if locks.is_empty() {
            println!("No active locks.");
            return Ok(());
        }

        println!("Active locks ({}):", locks.len());
        println!();
        for lock in &locks {
            println!("  {}:", lock.path);
            println!("    Owner:      {}", lock.owner_name().unwrap_or("unknown"));
            println!("    Age:        {}", lock.age_string());
            if !lock.id.is_empty() {
                println!("    ID:         {}", lock.id);
            }
            println!();
        }
        return Ok(());
    }

    println!("Files:");
    for target in &targets {
        let state = session.coordinator.lock_state(target)?;
        let read_only = if session.ctx.is_read_only(target)? {
            " (read-only)"
        } else {
            ""
        };
        println!("  {:<40} {}{}", target.as_str(), state, read_only);
    }

    Ok(())
}

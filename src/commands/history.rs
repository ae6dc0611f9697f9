//! Implementation of the `gitlock log` command.

use crate::cli::LogArgs;
use crate::context::RepoContext;
use crate::error::Result;
use crate::events::{Event, read_events};

pub fn cmd_log(args: LogArgs) -> Result<()> {
    let ctx = RepoContext::resolve()?;
    let events = read_events(&ctx.events_path())?;

    if events.is_empty() {
        println!("No events recorded.");
        return Ok(());
    }

    for event in recent(&events, args.limit) {
        println!("{}", format_event(event));
    }
    Ok(())
}

/// The last `limit` events, oldest first.
fn recent(events: &[Event], limit: usize) -> &[Event] {
    &events[events.len().saturating_sub(limit)..]
}

fn format_event(event: &Event) -> String {
    format!(
        "{}  {:<13} {:<40} {}",
        event.ts.format("%Y-%m-%d %H:%M:%S"),
        event.action.as_str(),
        event.target.as_deref().unwrap_or("-"),
        event.actor
    )
}

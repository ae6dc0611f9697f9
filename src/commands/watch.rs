//! Implementation of the `gitlock watch` command.
//!
//! `watch` polls the working tree for files modified without a lock:
//! - candidates are the modified tracked files, narrowed to the given paths
//!   or to the config's `watch_patterns`
//! - a modified file that is still read-only triggers the lock flow
//! - files silenced for the session are watched until they are clean again
//!
//! The ignored set lives only as long as the process.

use super::{Session, prompter_for, record_flow};
use crate::cli::WatchArgs;
use crate::context::RepoContext;
use crate::error::{GitLockError, Result};
use crate::git;
use crate::policy::{FlowOutcome, ModifiedWatcher, Observation, Prompter};
use crate::runner::CommandRunner;
use crate::target::LockTarget;
use globset::GlobSet;
use std::collections::BTreeSet;
use std::thread;
use std::time::Duration;
use tracing::warn;

/// Lower bound on the poll interval.
const MIN_INTERVAL_MS: u64 = 50;

pub fn cmd_watch(args: WatchArgs) -> Result<()> {
    let session = Session::open()?;
    let mut prompter = prompter_for(&args.prompt);

    let interval_ms = args
        .interval_ms
        .unwrap_or(session.config.watch_interval_ms)
        .max(MIN_INTERVAL_MS);
    let explicit = session.targets(&args.paths)?;
    let matcher = session.config.watch_matcher()?;

    eprintln!("gitlock watch started");
    eprintln!("  repo:     {}", session.ctx.repo_root.display());
    if !explicit.is_empty() {
        let names: Vec<&str> = explicit.iter().map(LockTarget::as_str).collect();
        eprintln!("  files:    {}", names.join(", "));
    } else if !session.config.watch_patterns.is_empty() {
        eprintln!("  patterns: {}", session.config.watch_patterns.join(", "));
    } else {
        eprintln!("  files:    all modified tracked files");
    }
    eprintln!("  interval: {}ms", interval_ms);
    eprintln!();

    let mut watcher = ModifiedWatcher::new();
    loop {
        match watch_once(
            &session,
            &explicit,
            matcher.as_ref(),
            &mut watcher,
            prompter.as_mut(),
        ) {
            Ok(_) => {}
            // A slow or missing server should not end the session.
            Err(e @ GitLockError::BackendUnavailable(_)) if !args.once => {
                eprintln!("Warning: {}", e);
            }
            Err(e) => return Err(e),
        }

        if args.once {
            break;
        }
        thread::sleep(Duration::from_millis(interval_ms));
    }

    Ok(())
}

/// Run one poll: observe the working tree, warn about unlocked edits and
/// record what the user chose. Outcomes are recorded as they happen, so a
/// backend failure later in the round does not lose earlier ones.
pub(crate) fn watch_once<R, P>(
    session: &Session<R>,
    explicit: &[LockTarget],
    matcher: Option<&GlobSet>,
    watcher: &mut ModifiedWatcher,
    prompter: &mut P,
) -> Result<Vec<(LockTarget, FlowOutcome)>>
where
    R: CommandRunner,
    P: Prompter + ?Sized,
{
    let observations = observe(&session.ctx, explicit, matcher, watcher)?;
    let mut outcomes = Vec::new();
    watcher.poll_with(
        &session.coordinator,
        &observations,
        prompter,
        |target, outcome| {
            record_flow(&session.ctx, target, outcome);
            println!("{}: {}", target, outcome);
            outcomes.push((target.clone(), outcome.clone()));
        },
    )?;

    Ok(outcomes)
}

/// Snapshot the candidates: modified files in scope, the explicit paths,
/// and everything currently ignored (so it can be seen clean again).
fn observe(
    ctx: &RepoContext,
    explicit: &[LockTarget],
    matcher: Option<&GlobSet>,
    watcher: &ModifiedWatcher,
) -> Result<Vec<Observation>> {
    let pathspecs: Vec<String> = explicit
        .iter()
        .map(|t| format!(":(literal){}", t))
        .collect();
    let pathspecs: Vec<&str> = pathspecs.iter().map(String::as_str).collect();

    let mut modified = BTreeSet::new();
    for path in git::modified_files(&ctx.repo_root, &pathspecs)? {
        if explicit.is_empty()
            && let Some(matcher) = matcher
            && !matcher.is_match(&path)
        {
            continue;
        }
        match LockTarget::new(&path) {
            Ok(target) => {
                modified.insert(target);
            }
            Err(e) => warn!(path = %path, error = %e, "skipping unusable path"),
        }
    }

    let mut candidates = modified.clone();
    candidates.extend(explicit.iter().cloned());
    candidates.extend(watcher.ignored().cloned());

    candidates
        .into_iter()
        .map(|target| {
            Ok(Observation {
                modified: modified.contains(&target),
                read_only: ctx.is_read_only(&target)?,
                target,
            })
        })
        .collect()
}

//! Command implementations for gitlock.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations, plus the [`Session`] every lock command runs against.
//! Command bodies are generic over the [`CommandRunner`] and the
//! [`Prompter`] so they can be driven without a lock server or a terminal.

mod check;
mod disable;
mod history;
mod lock;
mod status;
mod watch;

use crate::backend::LfsBackend;
use crate::cli::{Command, PromptArgs};
use crate::config::Config;
use crate::context::RepoContext;
use crate::coordinator::LockCoordinator;
use crate::error::Result;
use crate::events::{self, Event, EventAction};
use crate::policy::{FlowOutcome, Prompter};
use crate::prefs::FilePreferenceStore;
use crate::prompt::{FixedPrompter, TerminalPrompter};
use crate::runner::{CommandRunner, ProcessRunner};
use crate::target::LockTarget;
use serde_json::json;

/// Dispatch a command to its implementation.
///
/// This is the main entry point for command execution. Each command
/// is routed to its handler function.
pub fn dispatch(command: Command) -> Result<()> {
    match command {
        Command::Lock(args) => lock::cmd_lock(args),
        Command::Unlock(args) => lock::cmd_unlock(args),
        Command::ForceLock(args) => lock::cmd_force_lock(args),
        Command::Owner(args) => lock::cmd_owner(args),
        Command::Status(args) => status::cmd_status(args),
        Command::Check(args) => check::cmd_check(args),
        Command::Watch(args) => watch::cmd_watch(args),
        Command::Disable(args) => disable::cmd_disable(args),
        Command::Log(args) => history::cmd_log(args),
    }
}

/// Everything a lock command needs: where the repository is, its shared
/// configuration, and a coordinator wired to the lfs backend and the
/// per-clone preference file.
pub(crate) struct Session<R> {
    pub ctx: RepoContext,
    pub config: Config,
    pub coordinator: LockCoordinator<R, FilePreferenceStore>,
}

impl Session<ProcessRunner> {
    /// Open a session for the repository containing the current directory.
    pub(crate) fn open() -> Result<Self> {
        let ctx = RepoContext::resolve()?;
        let config = ctx.load_config()?;
        let runner = ProcessRunner::new(&ctx.repo_root)
            .with_timeout(config.command_timeout())
            .with_progress(config.show_progress);
        Session::with_runner(ctx, config, runner)
    }
}

impl<R: CommandRunner> Session<R> {
    pub(crate) fn with_runner(ctx: RepoContext, config: Config, runner: R) -> Result<Self> {
        let backend = LfsBackend::with_command(runner, &config.backend_command)?;
        let prefs = FilePreferenceStore::new(ctx.prefs_path());
        Ok(Self {
            ctx,
            config,
            coordinator: LockCoordinator::new(backend, prefs),
        })
    }

    /// Resolve every input up front so a bad path fails before any lock
    /// is taken.
    pub(crate) fn targets(&self, inputs: &[String]) -> Result<Vec<LockTarget>> {
        inputs.iter().map(|input| self.ctx.target(input)).collect()
    }

    pub(crate) fn record(&self, event: Event) {
        events::record(&self.ctx, event);
    }
}

/// Prompter for `check` and `watch`: flags when `--choice` is given,
/// otherwise questions on stderr answered on stdin.
pub(crate) fn prompter_for(args: &PromptArgs) -> Box<dyn Prompter> {
    match args.choice {
        Some(choice) => Box::new(FixedPrompter {
            choice,
            force: args.force,
            confirm_disable: args.yes,
        }),
        None => terminal_prompter(),
    }
}

pub(crate) fn terminal_prompter() -> Box<dyn Prompter> {
    Box::new(TerminalPrompter::new(
        std::io::stdin().lock(),
        std::io::stderr(),
    ))
}

/// Append the audit event matching a lock flow outcome, if it changed
/// anything or silenced a warning.
pub(crate) fn record_flow(ctx: &RepoContext, target: &LockTarget, outcome: &FlowOutcome) {
    let event = match outcome {
        FlowOutcome::Locked => Event::new(EventAction::Lock),
        FlowOutcome::ForceAcquired { previous_owner } => Event::new(EventAction::ForceAcquire)
            .with_details(json!({ "previous_owner": previous_owner })),
        FlowOutcome::WorkingWithoutLock { owner } => Event::new(EventAction::Ignore)
            .with_details(json!({ "scope": "session", "owner": owner })),
        FlowOutcome::IgnoredForSession => {
            Event::new(EventAction::Ignore).with_details(json!({ "scope": "session" }))
        }
        FlowOutcome::IgnoredOnce => {
            Event::new(EventAction::Ignore).with_details(json!({ "scope": "once" }))
        }
        FlowOutcome::Disabled => Event::new(EventAction::Disable),
        FlowOutcome::ForceFailed { .. }
        | FlowOutcome::DisableDeclined
        | FlowOutcome::AlreadyDisabled => return,
    };
    events::record(ctx, event.with_target(target));
}

/// `"1 file"`, `"3 files"`.
pub(crate) fn files(count: usize) -> String {
    if count == 1 {
        "1 file".to_string()
    } else {
        format!("{} files", count)
    }
}

//! CLI argument parsing for gitlock.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use crate::policy::UserChoice;
use crate::prompt::parse_choice;
use clap::{Args, Parser, Subcommand};

/// gitlock: cooperative git-lfs file locking.
///
/// Lock files before editing them, see who holds a lock, and get warned
/// about lockable files modified without a lock:
/// - lockable files stay read-only until you hold their lock
/// - the lock server is the only source of truth for who holds what
/// - breaking someone else's lock always needs explicit confirmation
#[derive(Parser, Debug)]
#[command(name = "gitlock")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for gitlock.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Lock one or more files.
    ///
    /// Reports the current holder for files someone else has locked.
    Lock(LockArgs),

    /// Release your locks on one or more files.
    ///
    /// Also switches git locking back on if it was disabled.
    Unlock(UnlockArgs),

    /// Break another user's lock on a file and take it.
    ///
    /// Asks for confirmation unless --yes is given.
    ForceLock(ForceLockArgs),

    /// Show who holds the lock on a file.
    Owner(OwnerArgs),

    /// Show whether locking is enabled and the state of locks.
    ///
    /// With paths, shows each file's lock state; without, lists every lock
    /// on the server.
    Status(StatusArgs),

    /// Check files before writing them.
    ///
    /// Read-only files are not locked by you: you are asked whether to lock
    /// them now. Prints which files may be written and which stay blocked.
    Check(CheckArgs),

    /// Watch for lockable files modified without a lock.
    ///
    /// Polls the working tree and warns about modified files that are still
    /// read-only. Warnings silenced for the session come back once the file
    /// is clean and then modified again.
    Watch(WatchArgs),

    /// Disable git locking for this clone.
    ///
    /// Every lock check then succeeds without contacting the server.
    Disable(DisableArgs),

    /// Show recent lock actions from this clone's audit log.
    Log(LogArgs),
}

/// Answers used instead of interactive prompts.
#[derive(Args, Debug, Clone, Default)]
pub struct PromptArgs {
    /// Answer to "modified without locking" warnings:
    /// lock, ignore-once, ignore-session or disable.
    #[arg(long, value_parser = parse_choice)]
    pub choice: Option<UserChoice>,

    /// With --choice lock: break another user's lock without asking.
    #[arg(long)]
    pub force: bool,

    /// With --choice disable: disable without asking.
    #[arg(long)]
    pub yes: bool,
}

/// Arguments for the `lock` command.
#[derive(Parser, Debug)]
pub struct LockArgs {
    /// Files to lock.
    #[arg(required = true)]
    pub paths: Vec<String>,
}

/// Arguments for the `unlock` command.
#[derive(Parser, Debug)]
pub struct UnlockArgs {
    /// Files to unlock.
    #[arg(required = true)]
    pub paths: Vec<String>,
}

/// Arguments for the `force-lock` command.
#[derive(Parser, Debug)]
pub struct ForceLockArgs {
    /// File whose lock to take over.
    pub path: String,

    /// Skip the confirmation prompt.
    #[arg(long)]
    pub yes: bool,
}

/// Arguments for the `owner` command.
#[derive(Parser, Debug)]
pub struct OwnerArgs {
    /// File to query.
    pub path: String,
}

/// Arguments for the `status` command.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Files to show; all server locks when omitted.
    pub paths: Vec<String>,
}

/// Arguments for the `check` command.
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Files about to be written.
    #[arg(required = true)]
    pub paths: Vec<String>,

    #[command(flatten)]
    pub prompt: PromptArgs,
}

/// Arguments for the `watch` command.
#[derive(Parser, Debug)]
pub struct WatchArgs {
    /// Files to watch; all modified tracked files (filtered by the config's
    /// `watch_patterns`) when omitted.
    pub paths: Vec<String>,

    /// Poll interval in milliseconds (default from config).
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Run a single poll and exit.
    #[arg(long)]
    pub once: bool,

    #[command(flatten)]
    pub prompt: PromptArgs,
}

/// Arguments for the `disable` command.
#[derive(Parser, Debug)]
pub struct DisableArgs {
    /// Skip the confirmation prompt.
    #[arg(long)]
    pub yes: bool,
}

/// Arguments for the `log` command.
#[derive(Parser, Debug)]
pub struct LogArgs {
    /// Number of most recent events to show.
    #[arg(short = 'n', long, default_value_t = 20)]
    pub limit: usize,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

//! Prompters: the terminal stand-ins for editor dialogs.
//!
//! [`TerminalPrompter`] asks on an input stream (stdin in the CLI) and writes
//! questions and notices to an output stream (stderr). [`FixedPrompter`]
//! answers from command-line flags for scripted use.

use crate::error::{GitLockError, Result};
use crate::policy::{Prompter, UserChoice};
use crate::target::LockTarget;
use std::io::{BufRead, Write};

/// Parse a `--choice` value.
pub fn parse_choice(value: &str) -> std::result::Result<UserChoice, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "lock" | "l" => Ok(UserChoice::LockNow),
        "ignore-once" | "ignore" | "i" => Ok(UserChoice::IgnoreOnce),
        "ignore-session" | "s" => Ok(UserChoice::IgnoreSession),
        "disable" | "d" => Ok(UserChoice::DisableSystem),
        other => Err(format!(
            "unknown choice '{}' (expected lock, ignore-once, ignore-session or disable)",
            other
        )),
    }
}

/// Interactive prompter over a line-based input and an output stream.
pub struct TerminalPrompter<I, O> {
    input: I,
    output: O,
}

impl<I: BufRead, O: Write> TerminalPrompter<I, O> {
    pub fn new(input: I, output: O) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, question: &str) -> Result<String> {
        write!(self.output, "{}", question)
            .and_then(|_| self.output.flush())
            .map_err(|e| GitLockError::UserError(format!("failed to write prompt: {}", e)))?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .map_err(|e| GitLockError::UserError(format!("failed to read answer: {}", e)))?;
        if read == 0 {
            return Err(GitLockError::UserError(
                "no answer on stdin.\n\
                 Pass --choice (and --force / --yes) for non-interactive use."
                    .to_string(),
            ));
        }
        Ok(line.trim().to_ascii_lowercase())
    }

    fn confirm(&mut self, question: &str) -> Result<bool> {
        let answer = self.ask(&format!("{} [y/N]: ", question))?;
        Ok(matches!(answer.as_str(), "y" | "yes"))
    }
}

impl<I: BufRead, O: Write> Prompter for TerminalPrompter<I, O> {
    fn choose(&mut self, target: &LockTarget) -> Result<UserChoice> {
        let question = format!(
            "You have modified {} without locking it.\n\
             You will not be able to save it without locking it.\n  \
             [l] lock it now\n  \
             [i] ignore, ask again next time\n  \
             [s] ignore until it is clean again\n  \
             [d] disable git locking\n\
             Choice [l/i/s/d]: ",
            target
        );

        loop {
            let answer = self.ask(&question)?;
            match parse_choice(&answer) {
                Ok(choice) => return Ok(choice),
                Err(message) => {
                    let _ = writeln!(self.output, "{}", message);
                }
            }
        }
    }

    fn confirm_force(&mut self, target: &LockTarget, owner: Option<&str>) -> Result<bool> {
        self.confirm(&format!(
            "Force acquire the lock on {} from {}? Otherwise keep working without saving.",
            target,
            owner.unwrap_or("unknown")
        ))
    }

    fn confirm_disable(&mut self) -> Result<bool> {
        self.confirm(
            "Disable git locking for this clone? It is tricky to reverse; \
             only do this if you know what you are doing.",
        )
    }

    fn notify(&mut self, message: &str) {
        let _ = writeln!(self.output, "{}", message);
    }
}

/// Prompter answering from fixed settings.
#[derive(Debug, Clone)]
pub struct FixedPrompter {
    pub choice: UserChoice,
    pub force: bool,
    pub confirm_disable: bool,
}

impl Prompter for FixedPrompter {
    fn choose(&mut self, _target: &LockTarget) -> Result<UserChoice> {
        Ok(self.choice)
    }

    fn confirm_force(&mut self, _target: &LockTarget, _owner: Option<&str>) -> Result<bool> {
        Ok(self.force)
    }

    fn confirm_disable(&mut self) -> Result<bool> {
        Ok(self.confirm_disable)
    }

    fn notify(&mut self, message: &str) {
        eprintln!("{}", message);
    }
}

//! External command runner for gitlock.
//!
//! Every backend invocation goes through the [`CommandRunner`] trait so the
//! lock adapter can be exercised against a scripted fake in tests. A non-zero
//! exit code is reported as data in [`RunOutput`]; only a launch failure (or
//! a timeout, when one is configured) is an error.

use crate::error::{GitLockError, Result};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::debug;

/// Captured result of one external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    /// Standard output from the command (trimmed).
    pub stdout: String,
    /// Standard error from the command (trimmed).
    pub stderr: String,
    /// Exit code; `-1` when the process was terminated by a signal.
    pub exit_code: i32,
}

impl RunOutput {
    /// Returns true if the command exited with code 0.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs an external program synchronously.
pub trait CommandRunner {
    /// Run `program` with `args`, blocking until it exits.
    fn run(&self, program: &str, args: &[&str]) -> Result<RunOutput>;

    /// Same as [`CommandRunner::run`], for invocations that may take long
    /// enough to deserve a visible progress line.
    fn run_with_progress(&self, program: &str, args: &[&str]) -> Result<RunOutput> {
        self.run(program, args)
    }
}

impl<T: CommandRunner + ?Sized> CommandRunner for &T {
    fn run(&self, program: &str, args: &[&str]) -> Result<RunOutput> {
        (**self).run(program, args)
    }

    fn run_with_progress(&self, program: &str, args: &[&str]) -> Result<RunOutput> {
        (**self).run_with_progress(program, args)
    }
}

/// [`CommandRunner`] that spawns real child processes.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    cwd: PathBuf,
    timeout: Option<Duration>,
    show_progress: bool,
}

impl ProcessRunner {
    /// Create a runner executing commands in `cwd`, with no timeout and no
    /// progress output.
    pub fn new<P: AsRef<Path>>(cwd: P) -> Self {
        Self {
            cwd: cwd.as_ref().to_path_buf(),
            timeout: None,
            show_progress: false,
        }
    }

    /// Kill the child and fail if it runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Print a progress line to stderr for [`CommandRunner::run_with_progress`].
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    fn execute(&self, program: &str, args: &[&str]) -> Result<RunOutput> {
        let command_line = describe(program, args);
        debug!(command = %command_line, cwd = %self.cwd.display(), "running backend command");

        let mut child = Command::new(program)
            .current_dir(&self.cwd)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                GitLockError::BackendUnavailable(format!(
                    "failed to execute {}: {} (is {} installed and in PATH?)",
                    command_line, e, program
                ))
            })?;

        // Drain both pipes on helper threads so a chatty child cannot fill a
        // pipe buffer and stall before we observe its exit.
        let stdout_reader = child.stdout.take().map(drain);
        let stderr_reader = child.stderr.take().map(drain);

        let exit_code = match self.timeout {
            Some(timeout) => match wait_with_timeout(&mut child, timeout)? {
                Some(code) => code,
                None => {
                    // Readers are left detached: a grandchild may still hold the pipes.
                    return Err(GitLockError::BackendUnavailable(format!(
                        "{} timed out after {}s",
                        command_line,
                        timeout.as_secs()
                    )));
                }
            },
            None => child
                .wait()
                .map_err(|e| {
                    GitLockError::BackendUnavailable(format!(
                        "failed to wait for {}: {}",
                        command_line, e
                    ))
                })?
                .code()
                .unwrap_or(-1),
        };

        let output = RunOutput {
            stdout: collect(stdout_reader),
            stderr: collect(stderr_reader),
            exit_code,
        };
        debug!(command = %command_line, exit_code = output.exit_code, "backend command finished");
        Ok(output)
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<RunOutput> {
        self.execute(program, args)
    }

    fn run_with_progress(&self, program: &str, args: &[&str]) -> Result<RunOutput> {
        if self.show_progress {
            eprintln!("Running {} ...", describe(program, args));
        }
        self.execute(program, args)
    }
}

/// Render a command line for messages and logs.
pub fn describe(program: &str, args: &[&str]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn collect(reader: Option<JoinHandle<Vec<u8>>>) -> String {
    reader
        .and_then(|handle| handle.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).trim().to_string())
        .unwrap_or_default()
}

/// Wait for a child process with timeout.
///
/// Returns `Some(exit_code)` when the child exits in time, `None` after
/// killing it on timeout.
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Result<Option<i32>> {
    let start = Instant::now();
    let poll_interval = Duration::from_millis(50);

    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(Some(status.code().unwrap_or(-1))),
            Ok(None) => {
                if start.elapsed() >= timeout {
                    // On Unix this is SIGKILL; on Windows it is TerminateProcess.
                    let _ = child.kill();
                    let _ = child.wait();
                    return Ok(None);
                }
                thread::sleep(poll_interval);
            }
            Err(e) => {
                return Err(GitLockError::BackendUnavailable(format!(
                    "failed to check process status: {}",
                    e
                )));
            }
        }
    }
}

use crate::error::{GitLockError, Result};
use crate::policy::{Prompter, UserChoice};
use crate::runner::{CommandRunner, RunOutput, describe};
use crate::target::LockTarget;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{LazyLock, Mutex, MutexGuard};
use tempfile::TempDir;

static CWD_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub(crate) struct DirGuard {
    original: PathBuf,
    _lock: MutexGuard<'static, ()>,
}

impl DirGuard {
    pub(crate) fn new(new_dir: &Path) -> Self {
        // Changing the process current working directory is global and not thread-safe.
        // Lock it so tests don't race even if a #[serial] annotation is missed.
        let lock = CWD_LOCK.lock().unwrap_or_else(|poison| poison.into_inner());
        let original = std::env::current_dir().unwrap();
        std::env::set_current_dir(new_dir).unwrap();
        Self {
            original,
            _lock: lock,
        }
    }
}

impl Drop for DirGuard {
    fn drop(&mut self) {
        let _ = std::env::set_current_dir(&self.original);
    }
}

/// A git repository with one commit containing `README.md`.
pub(crate) fn create_test_repo() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path();

    git(path, &["init"]);
    git(path, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    git(path, &["config", "user.email", "test@example.com"]);
    git(path, &["config", "user.name", "Test User"]);

    std::fs::write(path.join("README.md"), "# Test\n").unwrap();
    git(path, &["add", "."]);
    git(path, &["commit", "-m", "Initial commit"]);

    temp_dir
}

/// Commit `contents` at `rel_path` inside `repo_dir`.
pub(crate) fn commit_file(repo_dir: &Path, rel_path: &str, contents: &str) {
    let path = repo_dir.join(rel_path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, contents).unwrap();
    git(repo_dir, &["add", rel_path]);
    git(repo_dir, &["commit", "-m", &format!("Add {}", rel_path)]);
}

pub(crate) fn set_read_only(path: &Path, read_only: bool) {
    let mut perms = std::fs::metadata(path).unwrap().permissions();
    perms.set_readonly(read_only);
    std::fs::set_permissions(path, perms).unwrap();
}

fn git(repo_dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .current_dir(repo_dir)
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("failed to execute git {}: {}", args.join(" "), e));

    if !output.status.success() {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!(
            "git {} failed (exit code {:?})\nstdout:\n{}\nstderr:\n{}",
            args.join(" "),
            output.status.code(),
            stdout,
            stderr
        );
    }
}

pub(crate) fn target(path: &str) -> LockTarget {
    LockTarget::new(path).unwrap()
}

/// Canned reply for [`ScriptedRunner`].
#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Exit { code: i32, stdout: String },
    LaunchFailure,
}

impl Reply {
    pub(crate) fn ok() -> Self {
        Reply::Exit {
            code: 0,
            stdout: String::new(),
        }
    }

    pub(crate) fn fail() -> Self {
        Reply::Exit {
            code: 2,
            stdout: String::new(),
        }
    }

    pub(crate) fn stdout(stdout: &str) -> Self {
        Reply::Exit {
            code: 0,
            stdout: stdout.to_string(),
        }
    }
}

/// [`CommandRunner`] fake that replays canned replies and records calls.
///
/// Once the script runs out, every call gets the fallback reply.
pub(crate) struct ScriptedRunner {
    replies: RefCell<VecDeque<Reply>>,
    fallback: Reply,
    calls: RefCell<Vec<String>>,
}

impl ScriptedRunner {
    pub(crate) fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: RefCell::new(replies.into_iter().collect()),
            fallback: Reply::ok(),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn always(reply: Reply) -> Self {
        Self {
            replies: RefCell::new(VecDeque::new()),
            fallback: reply,
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Recorded command lines, e.g. `git lfs lock a.unity`.
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<RunOutput> {
        self.calls.borrow_mut().push(describe(program, args));
        let reply = self
            .replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        match reply {
            Reply::Exit { code, stdout } => Ok(RunOutput {
                stdout,
                stderr: String::new(),
                exit_code: code,
            }),
            Reply::LaunchFailure => Err(GitLockError::BackendUnavailable(format!(
                "failed to execute {}",
                program
            ))),
        }
    }
}

/// [`Prompter`] fake answering from fixed settings and recording notices.
pub(crate) struct ScriptedPrompter {
    pub(crate) choices: VecDeque<UserChoice>,
    pub(crate) default_choice: UserChoice,
    pub(crate) confirm_force: bool,
    pub(crate) confirm_disable: bool,
    pub(crate) asked: Vec<String>,
    pub(crate) notices: Vec<String>,
}

impl ScriptedPrompter {
    pub(crate) fn choosing(choice: UserChoice) -> Self {
        Self {
            choices: VecDeque::new(),
            default_choice: choice,
            confirm_force: false,
            confirm_disable: false,
            asked: Vec::new(),
            notices: Vec::new(),
        }
    }

    pub(crate) fn confirming_force(mut self, confirm: bool) -> Self {
        self.confirm_force = confirm;
        self
    }

    pub(crate) fn confirming_disable(mut self, confirm: bool) -> Self {
        self.confirm_disable = confirm;
        self
    }
}

impl Prompter for ScriptedPrompter {
    fn choose(&mut self, target: &LockTarget) -> Result<UserChoice> {
        self.asked.push(target.to_string());
        Ok(self.choices.pop_front().unwrap_or(self.default_choice))
    }

    fn confirm_force(&mut self, _target: &LockTarget, _owner: Option<&str>) -> Result<bool> {
        Ok(self.confirm_force)
    }

    fn confirm_disable(&mut self) -> Result<bool> {
        Ok(self.confirm_disable)
    }

    fn notify(&mut self, message: &str) {
        self.notices.push(message.to_string());
    }
}

//! Git helpers for repository discovery and working-tree status.
//!
//! Lock operations go through the backend adapter; this module only covers
//! the plain git queries gitlock needs around them.

use crate::error::{GitLockError, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn git_output<P: AsRef<Path>>(cwd: P, args: &[&str]) -> Result<Output> {
    Command::new("git")
        .current_dir(cwd.as_ref())
        .args(args)
        .output()
        .map_err(|e| {
            GitLockError::BackendUnavailable(format!(
                "failed to execute git {}: {} (is git installed?)",
                args.first().unwrap_or(&""),
                e
            ))
        })
}

/// Run a git command and return its trimmed stdout, failing on non-zero exit.
fn run_git<P: AsRef<Path>>(cwd: P, args: &[&str]) -> Result<String> {
    let output = git_output(cwd, args)?;
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();

    if output.status.success() {
        return Ok(stdout);
    }

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if stderr.contains("not a git repository") {
        return Err(GitLockError::UserError(
            "not inside a git repository. Run this command from within a git repository."
                .to_string(),
        ));
    }

    Err(GitLockError::UserError(format!(
        "git {} failed (exit code {}): {}",
        args.first().unwrap_or(&""),
        output.status.code().unwrap_or(-1),
        if stderr.is_empty() { stdout } else { stderr }
    )))
}

/// Get the repository root directory using `git rev-parse --show-toplevel`.
pub fn get_repo_root<P: AsRef<Path>>(cwd: P) -> Result<PathBuf> {
    Ok(PathBuf::from(run_git(cwd, &["rev-parse", "--show-toplevel"])?))
}

/// Get the git directory shared by all worktrees of the repository.
pub fn get_common_dir<P: AsRef<Path>>(cwd: P) -> Result<PathBuf> {
    let cwd = cwd.as_ref();
    let dir = PathBuf::from(run_git(cwd, &["rev-parse", "--git-common-dir"])?);
    // Relative output is relative to the directory git ran in.
    Ok(if dir.is_absolute() { dir } else { cwd.join(dir) })
}

/// Tracked files with uncommitted changes, relative to the repository root.
///
/// `pathspecs` narrows the query; an empty slice means the whole tree.
pub fn modified_files<P: AsRef<Path>>(repo_root: P, pathspecs: &[&str]) -> Result<Vec<String>> {
    let mut args = vec!["status", "--porcelain", "-z", "--untracked-files=no"];
    if !pathspecs.is_empty() {
        args.push("--");
        args.extend_from_slice(pathspecs);
    }

    let output = git_output(repo_root, &args)?;
    if !output.status.success() {
        return Err(GitLockError::UserError(format!(
            "git status failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    Ok(parse_porcelain_z(&String::from_utf8_lossy(&output.stdout)))
}

/// Parse `git status --porcelain -z` output into paths.
///
/// Entries are `XY path`; renames and copies are followed by an extra entry
/// holding the source path, which is skipped.
fn parse_porcelain_z(output: &str) -> Vec<String> {
    let mut paths = Vec::new();
    let mut entries = output.split('\0');

    while let Some(entry) = entries.next() {
        if entry.len() < 4 {
            continue;
        }
        let (status, path) = entry.split_at(3);
        paths.push(path.to_string());
        if status.starts_with('R') || status.starts_with('C') {
            entries.next();
        }
    }

    paths
}

//! Lock targets: repository-relative paths naming a lockable resource.
//!
//! The backend identifies locks by the path relative to the repository root,
//! `/`-separated and case-sensitive. Caller input may be relative to the
//! current directory or absolute; both are normalized here and anything that
//! escapes the repository is rejected.

use crate::error::{GitLockError, Result};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// A repository-relative path identifying a lockable resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LockTarget(String);

impl LockTarget {
    /// Build a target from a path that is already relative to the repo root
    /// (for example a path printed by `git status`).
    pub fn new(repo_relative: &str) -> Result<Self> {
        let unified = repo_relative.replace('\\', "/");
        if unified.starts_with('/') || has_drive_prefix(&unified) {
            return Err(GitLockError::UserError(format!(
                "invalid lock target '{}': expected a path relative to the repository root",
                repo_relative
            )));
        }

        let mut parts: Vec<&str> = Vec::new();
        for part in unified.split('/') {
            match part {
                "" | "." => {}
                ".." => {
                    return Err(GitLockError::UserError(format!(
                        "invalid lock target '{}': contains path traversal",
                        repo_relative
                    )));
                }
                other => parts.push(other),
            }
        }

        if parts.is_empty() {
            return Err(GitLockError::UserError(
                "invalid lock target: path is empty".to_string(),
            ));
        }

        // The backend would take a leading dash for an option.
        if parts[0].starts_with('-') {
            return Err(GitLockError::UserError(format!(
                "invalid lock target '{}': paths starting with '-' are not supported",
                repo_relative
            )));
        }

        Ok(Self(parts.join("/")))
    }

    /// Resolve user input against `cwd` and express it relative to `repo_root`.
    pub fn resolve<P: AsRef<Path>, Q: AsRef<Path>>(
        repo_root: P,
        cwd: Q,
        input: &str,
    ) -> Result<Self> {
        let repo_root = canonical_or_self(repo_root.as_ref());
        let cwd = canonical_or_self(cwd.as_ref());

        let joined = if Path::new(input).is_absolute() {
            canonical_or_self(Path::new(input))
        } else {
            cwd.join(input)
        };
        let normalized = lexical_normalize(&joined).ok_or_else(|| {
            GitLockError::UserError(format!(
                "invalid lock target '{}': escapes the filesystem root",
                input
            ))
        })?;

        let relative = normalized.strip_prefix(&repo_root).map_err(|_| {
            GitLockError::UserError(format!(
                "'{}' is outside the repository.\nRepository root: {}",
                input,
                repo_root.display()
            ))
        })?;

        Self::new(&relative.to_string_lossy())
    }

    /// The target as passed to the backend.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Location of the target on disk.
    pub fn on_disk<P: AsRef<Path>>(&self, repo_root: P) -> PathBuf {
        repo_root.as_ref().join(&self.0)
    }
}

impl fmt::Display for LockTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

fn canonical_or_self(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Collapse `.` and `..` without touching the filesystem.
fn lexical_normalize(path: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    return None;
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    Some(out)
}

//! Atomic file writes.
//!
//! Content goes to `.{filename}.tmp` in the target's directory, is synced,
//! then renamed over the target. `rename` replaces an existing destination
//! on both POSIX and Windows, so readers see either the old file or the new
//! one, never a partial write. Source and destination must share a volume.

use crate::error::{GitLockError, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Atomically write `content` to `path`, creating parent directories.
pub fn atomic_write<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| {
            GitLockError::UserError(format!(
                "failed to create parent directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }

    let temp_path = temp_path_for(path)?;
    write_and_sync(&temp_path, content)?;

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        GitLockError::UserError(format!(
            "failed to atomically replace '{}': {}",
            path.display(),
            e
        ))
    })?;

    #[cfg(unix)]
    if let Some(parent) = path.parent()
        && let Ok(dir) = File::open(parent)
    {
        let _ = dir.sync_all();
    }

    Ok(())
}

fn temp_path_for(target: &Path) -> Result<PathBuf> {
    let parent = target.parent().unwrap_or(Path::new("."));
    let filename = target
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            GitLockError::UserError(format!("invalid file path '{}'", target.display()))
        })?;
    Ok(parent.join(format!(".{}.tmp", filename)))
}

fn write_and_sync(path: &Path, content: &[u8]) -> Result<()> {
    let cleanup = |e: std::io::Error, what: &str| {
        let _ = fs::remove_file(path);
        GitLockError::UserError(format!(
            "failed to {} temporary file '{}': {}",
            what,
            path.display(),
            e
        ))
    };

    let mut file = File::create(path).map_err(|e| cleanup(e, "create"))?;
    file.write_all(content).map_err(|e| cleanup(e, "write"))?;
    file.sync_all().map_err(|e| cleanup(e, "sync"))?;
    Ok(())
}

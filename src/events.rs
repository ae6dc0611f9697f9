//! Audit log for gitlock.
//!
//! Lock-affecting actions are appended to
//! `{git_common_dir}/gitlock/events.ndjson`, one JSON object per line, so a
//! user can later see when they locked, force-acquired or disabled
//! something. Diagnostic tracing (`RUST_LOG`) is separate and not persisted.
//!
//! # Event Format
//!
//! - `ts`: RFC3339 timestamp
//! - `action`: lock, unlock, force_acquire, disable, enable, ignore
//! - `actor`: the owner string (e.g., `user@HOST`)
//! - `target`: optional repository-relative path
//! - `details`: freeform object with action-specific details

use crate::context::RepoContext;
use crate::error::{GitLockError, Result};
use crate::target::LockTarget;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Actions that can be logged as events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    Lock,
    Unlock,
    ForceAcquire,
    Disable,
    /// Locking switched back on (by `gitlock unlock`).
    Enable,
    /// A warning was silenced by the user.
    Ignore,
}

impl EventAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventAction::Lock => "lock",
            EventAction::Unlock => "unlock",
            EventAction::ForceAcquire => "force_acquire",
            EventAction::Disable => "disable",
            EventAction::Enable => "enable",
            EventAction::Ignore => "ignore",
        }
    }
}

/// An event record for the audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// RFC3339 timestamp when the event occurred.
    pub ts: DateTime<Utc>,

    /// The action that was performed.
    pub action: EventAction,

    /// The actor who performed the action (e.g., `user@HOST`).
    pub actor: String,

    /// Target path, for per-file events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Freeform details object with action-specific information.
    pub details: Value,
}

impl Event {
    /// Create a new event stamped now, with the actor taken from the
    /// environment (USER@HOSTNAME).
    pub fn new(action: EventAction) -> Self {
        Self {
            ts: Utc::now(),
            action,
            actor: get_actor_string(),
            target: None,
            details: Value::Object(serde_json::Map::new()),
        }
    }

    pub fn with_target(mut self, target: &LockTarget) -> Self {
        self.target = Some(target.to_string());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Serialize the event to a single-line JSON string.
    pub fn to_ndjson_line(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| {
            GitLockError::UserError(format!("failed to serialize event to JSON: {}", e))
        })
    }
}

/// Get the actor string for event metadata.
fn get_actor_string() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}

/// Append an event to the log at `path`, creating it if needed.
pub fn append_event_to(path: &Path, event: &Event) -> Result<()> {
    let json_line = event.to_ndjson_line()?;

    if let Some(dir) = path.parent()
        && !dir.exists()
    {
        fs::create_dir_all(dir).map_err(|e| {
            GitLockError::UserError(format!(
                "failed to create events directory '{}': {}",
                dir.display(),
                e
            ))
        })?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            GitLockError::UserError(format!(
                "failed to open events file '{}': {}",
                path.display(),
                e
            ))
        })?;

    writeln!(file, "{}", json_line).map_err(|e| {
        GitLockError::UserError(format!(
            "failed to write event to '{}': {}",
            path.display(),
            e
        ))
    })?;

    Ok(())
}

/// Record an event for the repository, warning instead of failing.
///
/// The audit log is informational: the lock operation already happened on
/// the server, so a write failure here must not turn success into failure.
pub fn record(ctx: &RepoContext, event: Event) {
    if let Err(e) = append_event_to(&ctx.events_path(), &event) {
        eprintln!("Warning: failed to log {:?} event: {}", event.action, e);
    }
}

/// Read all events from the log at `path`. Malformed lines are skipped.
pub fn read_events(path: &Path) -> Result<Vec<Event>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(path).map_err(|e| {
        GitLockError::UserError(format!(
            "failed to read events file '{}': {}",
            path.display(),
            e
        ))
    })?;

    Ok(content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect())
}

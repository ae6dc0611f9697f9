//! JSON records printed by `git lfs locks --json`.
//!
//! Parsing is tolerant: the owner query only ever degrades to "unknown".

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::Value;

/// One lock as reported by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LockRecord {
    /// Server-side lock identifier.
    #[serde(default)]
    pub id: String,

    /// Repository-relative path of the locked file.
    #[serde(default)]
    pub path: String,

    /// Lock owner, when the server reports one.
    #[serde(default)]
    pub owner: Option<LockOwner>,

    /// RFC3339 timestamp of when the lock was taken.
    #[serde(default)]
    pub locked_at: Option<String>,
}

/// Owner block of a [`LockRecord`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LockOwner {
    #[serde(default)]
    pub name: String,
}

impl LockRecord {
    /// Owner name, if present and non-empty.
    pub fn owner_name(&self) -> Option<&str> {
        self.owner
            .as_ref()
            .map(|o| o.name.as_str())
            .filter(|name| !name.is_empty())
    }

    /// Parsed lock timestamp.
    pub fn locked_at(&self) -> Option<DateTime<Utc>> {
        self.locked_at
            .as_deref()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|ts| ts.with_timezone(&Utc))
    }

    /// Format the lock age as a human-readable string.
    pub fn age_string(&self) -> String {
        let Some(locked_at) = self.locked_at() else {
            return "unknown".to_string();
        };
        let age: Duration = Utc::now().signed_duration_since(locked_at);
        let minutes = age.num_minutes();
        let hours = age.num_hours();
        let days = age.num_days();

        if days > 0 {
            format!("{}d {}h", days, hours % 24)
        } else if hours > 0 {
            format!("{}h {}m", hours, minutes % 60)
        } else {
            format!("{}m", minutes.max(0))
        }
    }
}

/// Output of `git lfs locks --verify --json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifyReport {
    #[serde(default)]
    pub ours: Vec<LockRecord>,
    #[serde(default)]
    pub theirs: Vec<LockRecord>,
}

/// Read `[0].owner.name` from a lock listing.
///
/// Anything unexpected (malformed JSON, empty array, missing or empty name)
/// yields `None`.
pub fn parse_first_owner(json: &str) -> Option<String> {
    let value: Value = serde_json::from_str(json).ok()?;
    value
        .get(0)?
        .get("owner")?
        .get("name")?
        .as_str()
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

/// Parse a full lock listing.
pub fn parse_records(json: &str) -> serde_json::Result<Vec<LockRecord>> {
    if json.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(json)
}

/// Parse the verify report.
pub fn parse_verify(json: &str) -> serde_json::Result<VerifyReport> {
    serde_json::from_str(json)
}

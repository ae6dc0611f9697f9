//! Config struct definition and default implementation.

use crate::backend::DEFAULT_BACKEND_COMMAND;
use serde::{Deserialize, Serialize};

/// Name of the config file at the repository root.
pub const CONFIG_FILE_NAME: &str = ".gitlock.yaml";

/// Configuration for gitlock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // =========================================================================
    // Backend settings
    // =========================================================================
    /// Command line used to invoke the backend; `lfs ...` arguments are
    /// appended. Split with shell quoting rules.
    pub backend_command: String,

    /// Seconds before a hung backend call is killed (0 disables the timeout).
    pub command_timeout_seconds: u64,

    /// Print a line before lock/unlock calls, which can take a while.
    pub show_progress: bool,

    // =========================================================================
    // Watch settings
    // =========================================================================
    /// Delay between polls of `gitlock watch`.
    pub watch_interval_ms: u64,

    /// Glob patterns selecting which modified files `watch` considers when no
    /// paths are given. Empty means every tracked file.
    pub watch_patterns: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_command: DEFAULT_BACKEND_COMMAND.to_string(),
            command_timeout_seconds: default_command_timeout_seconds(),
            show_progress: true,
            watch_interval_ms: default_watch_interval_ms(),
            watch_patterns: Vec::new(),
        }
    }
}

pub(crate) fn default_command_timeout_seconds() -> u64 {
    120
}

pub(crate) fn default_watch_interval_ms() -> u64 {
    1000
}

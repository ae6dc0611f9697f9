//! Config loading, validation, and utility operations.

use super::model::Config;
use crate::error::{GitLockError, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;
use std::time::Duration;

/// Smallest accepted watch interval.
const MIN_WATCH_INTERVAL_MS: u64 = 50;

impl Config {
    /// Load config from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            GitLockError::UserError(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content).map_err(|e| {
            GitLockError::UserError(format!("{}\nConfig file: {}", e, path.display()))
        })
    }

    /// Load config from `path`, or defaults when the file does not exist.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse config from a YAML string.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty document deserializes as unit, not as an empty mapping.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| GitLockError::UserError(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `backend_command` must split into at least a program name
    /// - `watch_interval_ms` must be at least 50
    /// - every `watch_patterns` entry must be a valid glob
    pub fn validate(&self) -> Result<()> {
        match shell_words::split(&self.backend_command) {
            Ok(words) if !words.is_empty() => {}
            Ok(_) => {
                return Err(GitLockError::UserError(
                    "config validation failed: backend_command must not be empty".to_string(),
                ));
            }
            Err(e) => {
                return Err(GitLockError::UserError(format!(
                    "config validation failed: backend_command '{}' is not a valid command line: {}",
                    self.backend_command, e
                )));
            }
        }

        if self.watch_interval_ms < MIN_WATCH_INTERVAL_MS {
            return Err(GitLockError::UserError(format!(
                "config validation failed: watch_interval_ms must be at least {} (found {})",
                MIN_WATCH_INTERVAL_MS, self.watch_interval_ms
            )));
        }

        self.watch_matcher()?;
        Ok(())
    }

    /// Timeout for backend calls, if enabled.
    pub fn command_timeout(&self) -> Option<Duration> {
        (self.command_timeout_seconds > 0).then(|| Duration::from_secs(self.command_timeout_seconds))
    }

    /// Compiled `watch_patterns`, or `None` when every file is watched.
    pub fn watch_matcher(&self) -> Result<Option<GlobSet>> {
        if self.watch_patterns.is_empty() {
            return Ok(None);
        }

        let mut builder = GlobSetBuilder::new();
        for pattern in &self.watch_patterns {
            let glob = Glob::new(pattern).map_err(|e| {
                GitLockError::UserError(format!(
                    "config validation failed: invalid watch pattern '{}': {}",
                    pattern, e
                ))
            })?;
            builder.add(glob);
        }

        builder
            .build()
            .map(Some)
            .map_err(|e| GitLockError::UserError(format!("failed to build watch patterns: {}", e)))
    }
}

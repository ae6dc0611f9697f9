//! Tests for config functionality.

use crate::config::{CONFIG_FILE_NAME, Config};
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.backend_command, "git");
    assert_eq!(config.command_timeout_seconds, 120);
    assert!(config.show_progress);
    assert_eq!(config.watch_interval_ms, 1000);
    assert!(config.watch_patterns.is_empty());
    assert!(config.validate().is_ok());
}

#[test]
fn test_parse_empty_yaml_uses_defaults() {
    let config = Config::from_yaml("").unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_parse_partial_yaml() {
    let yaml = r#"
command_timeout_seconds: 30
watch_patterns:
  - "*.unity"
  - "Assets/**/*.prefab"
"#;
    let config = Config::from_yaml(yaml).unwrap();

    assert_eq!(config.command_timeout_seconds, 30);
    assert_eq!(config.watch_patterns.len(), 2);

    // Unspecified values should use defaults
    assert_eq!(config.backend_command, "git");
    assert_eq!(config.watch_interval_ms, 1000);
}

#[test]
fn test_unknown_fields_are_ignored() {
    let yaml = r#"
show_progress: false
some_future_setting: 42
"#;
    let config = Config::from_yaml(yaml).unwrap();
    assert!(!config.show_progress);
}

#[test]
fn test_invalid_yaml_is_user_error() {
    let err = Config::from_yaml("watch_patterns: [unclosed").unwrap_err();
    assert!(err.to_string().contains("failed to parse config YAML"));
}

#[test]
fn test_validation_rejects_bad_values() {
    let err = Config::from_yaml("backend_command: \"\"").unwrap_err();
    assert!(err.to_string().contains("backend_command must not be empty"));

    let err = Config::from_yaml("backend_command: \"git 'oops\"").unwrap_err();
    assert!(err.to_string().contains("not a valid command line"));

    let err = Config::from_yaml("watch_interval_ms: 10").unwrap_err();
    assert!(err.to_string().contains("watch_interval_ms must be at least 50"));

    let err = Config::from_yaml("watch_patterns: [\"Assets/[\"]").unwrap_err();
    assert!(err.to_string().contains("invalid watch pattern"));
}

#[test]
fn test_command_timeout() {
    let mut config = Config::default();
    assert_eq!(config.command_timeout(), Some(Duration::from_secs(120)));

    config.command_timeout_seconds = 0;
    assert_eq!(config.command_timeout(), None);
}

#[test]
fn test_watch_matcher() {
    let config = Config::default();
    assert!(config.watch_matcher().unwrap().is_none());

    let config = Config::from_yaml("watch_patterns: [\"*.unity\"]").unwrap();
    let matcher = config.watch_matcher().unwrap().unwrap();
    assert!(matcher.is_match("Assets/Scenes/Main.unity"));
    assert!(!matcher.is_match("README.md"));
}

#[test]
fn test_load_or_default() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join(CONFIG_FILE_NAME);

    assert_eq!(Config::load_or_default(&path).unwrap(), Config::default());

    std::fs::write(&path, "watch_interval_ms: 250\n").unwrap();
    assert_eq!(Config::load_or_default(&path).unwrap().watch_interval_ms, 250);

    std::fs::write(&path, "watch_interval_ms: 1\n").unwrap();
    let err = Config::load_or_default(&path).unwrap_err();
    assert!(err.to_string().contains(CONFIG_FILE_NAME));
}

use std::collections::HashMap;
use std::path::PathBuf;
use udc_app::config::Config;

#[test]
fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.default_timeout_ms, 30_000);
    assert_eq!(config.unlock_window_minutes, 15);
    assert!(config.gate_file.is_none());
    assert!(config.blocked_commands.contains(&"sudo".to_string()));
    assert!(config.allowed_directories.is_empty());
    assert!(config.validate().is_ok());
}

#[test]
fn test_partial_yaml_keeps_defaults() {
    let config = Config::from_yaml(
        r#"
log_level: debug
unlock_window_minutes: 5
allowed_directories:
  - /srv/data
"#,
    )
    .unwrap();

    assert_eq!(config.log_level, "debug");
    assert_eq!(config.unlock_window_minutes, 5);
    assert_eq!(config.allowed_directories, vec!["/srv/data".to_string()]);
    assert_eq!(config.default_timeout_ms, 30_000);
}

#[test]
fn test_empty_yaml_is_default() {
    assert_eq!(Config::from_yaml("  \n").unwrap(), Config::default());
}

#[test]
fn test_invalid_yaml_is_error() {
    assert!(Config::from_yaml("default_timeout_ms: [not a number]").is_err());
}

#[test]
fn test_validate_rejects_zero_values() {
    let config = Config {
        default_timeout_ms: 0,
        ..Config::default()
    };
    assert!(config.validate().is_err());

    let config = Config {
        unlock_window_minutes: 0,
        ..Config::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_env_overrides() {
    let env: HashMap<&str, &str> = [
        ("UDC_GATE_FILE", "/tmp/udc-code"),
        ("UDC_LOG_LEVEL", "trace"),
    ]
    .into_iter()
    .collect();

    let mut config = Config::default();
    config.apply_env_overrides(|key| env.get(key).map(|v| v.to_string()));

    assert_eq!(config.gate_file, Some(PathBuf::from("/tmp/udc-code")));
    assert_eq!(config.log_level, "trace");
}

#[test]
fn test_blank_env_values_ignored() {
    let mut config = Config::default();
    config.apply_env_overrides(|_| Some("  ".to_string()));
    assert_eq!(config, Config::default());
}

#[test]
fn test_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("udc.yaml");

    let config = Config {
        default_timeout_ms: 1_000,
        blocked_commands: vec!["curl".to_string()],
        ..Config::default()
    };
    config.save(&path).unwrap();

    let loaded = Config::from_yaml(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_missing_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load(&dir.path().join("absent.yaml")).unwrap();
    assert_eq!(config.default_timeout_ms, 30_000);
}

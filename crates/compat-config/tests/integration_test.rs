//! Integration tests for compat-config
//!
//! These tests verify the config loading pipeline with real file system operations.

use compat_config::{Config, LogLevel};
use tempfile::tempdir;

/// Test config loading from a real config file
#[test]
fn test_load_config_from_file() {
    let temp = tempdir().unwrap();
    let compat_dir = temp.path().join(".compat");
    std::fs::create_dir_all(&compat_dir).unwrap();

    let config_content = r#"
[logging]
level = "debug"
with_target = true

[threads]
tss_capacity = 64
tss_dtor_iterations = 2

[dirent]
name_max = 255
"#;
    std::fs::write(compat_dir.join("config.toml"), config_content).unwrap();

    let config = Config::from_file(&compat_dir.join("config.toml")).unwrap();

    assert_eq!(config.logging.log_level(), LogLevel::Debug);
    assert!(config.logging.with_target);
    assert_eq!(config.threads.tss_capacity, 64);
    assert_eq!(config.threads.effective_tss_capacity(), 64);
    assert_eq!(config.threads.tss_dtor_iterations, 2);
    assert_eq!(config.dirent.name_max, 255);
}

/// Test config hierarchy: project config overrides global
#[test]
fn test_config_hierarchy_project_overrides_global() {
    let temp = tempdir().unwrap();

    let global_dir = temp.path().join("global/.compat");
    std::fs::create_dir_all(&global_dir).unwrap();
    std::fs::write(
        global_dir.join("config.toml"),
        r#"
[logging]
level = "info"

[threads]
tss_dtor_iterations = 6
"#,
    )
    .unwrap();

    let project_dir = temp.path().join("project/.compat");
    std::fs::create_dir_all(&project_dir).unwrap();
    std::fs::write(
        project_dir.join("config.toml"),
        r#"
[logging]
level = "trace"
"#,
    )
    .unwrap();

    let mut config = Config::from_file(&global_dir.join("config.toml")).unwrap();
    let project = Config::from_file(&project_dir.join("config.toml")).unwrap();
    config.merge(project);

    // Level replaced, iterations preserved from global
    assert_eq!(config.logging.log_level(), LogLevel::Trace);
    assert_eq!(config.threads.tss_dtor_iterations, 6);
}

/// Test config with environment variable override
#[test]
fn test_config_env_override_integration() {
    let mut config = Config::default();

    std::env::set_var("COMPAT_LOG", "error");
    std::env::set_var("COMPAT_TSS_DTOR_ITERATIONS", "9");
    config.apply_env_overrides();
    std::env::remove_var("COMPAT_LOG");
    std::env::remove_var("COMPAT_TSS_DTOR_ITERATIONS");

    assert_eq!(config.logging.log_level(), LogLevel::Error);
    assert_eq!(config.threads.tss_dtor_iterations, 9);
}

/// Test partial config with defaults filling in
#[test]
fn test_partial_config_defaults_applied() {
    let partial = r#"
[dirent]
name_max = 128
"#;
    let config: Config = toml::from_str(partial).unwrap();

    assert_eq!(config.dirent.name_max, 128);
    assert_eq!(config.threads.tss_capacity, 1024);
    assert_eq!(config.threads.tss_dtor_iterations, 4);
    assert_eq!(config.logging.level, "warn");
}

/// Malformed files surface as parse errors instead of silently defaulting
#[test]
fn test_malformed_config_is_an_error() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("config.toml");
    std::fs::write(&path, "[threads\ntss_capacity = ").unwrap();

    let err = Config::from_file(&path).unwrap_err();
    assert!(matches!(err, compat_config::ConfigError::Toml(_)));
}

//! Unit tests for configuration and graceful degradation
//!
//! Covers:
//! - Missing TOML files do not abort startup
//! - Invalid TOML files fall back to defaults
//! - Priority order for root folder and state directory resolution
//! - Atomic TOML write
//!
//! Note: Uses serial_test to prevent ENV variable race conditions.
//! Tests that manipulate SHELFWISE_ROOT or SHELFWISE_STATE_DIR are marked
//! with #[serial].

use serial_test::serial;
use shelfwise_common::config::{
    load_toml_config, resolve_state_dir, write_toml_config, LoggingConfig, RootFolderResolver,
    TomlConfig, ROOT_ENV_VAR, STATE_DIR_ENV_VAR,
};
use shelfwise_common::fs::temp_path_for;
use std::env;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[test]
fn test_missing_config_file_uses_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config = load_toml_config(&temp_dir.path().join("does-not-exist.toml"));
    assert_eq!(config, TomlConfig::default());
}

#[test]
fn test_invalid_config_file_uses_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "root_folder = [not valid").unwrap();

    let config = load_toml_config(&path);
    assert_eq!(config, TomlConfig::default());
}

#[test]
#[serial]
fn test_resolver_with_no_overrides_uses_current_dir() {
    env::remove_var(ROOT_ENV_VAR);

    let root = RootFolderResolver::new().resolve();
    assert_eq!(root, PathBuf::from("."));
}

#[test]
#[serial]
fn test_resolver_env_var_beats_toml() {
    env::set_var(ROOT_ENV_VAR, "/tmp/shelfwise-env-root");

    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/shelfwise-toml-root")),
        ..Default::default()
    };
    let root = RootFolderResolver::new().with_config(&config).resolve();

    env::remove_var(ROOT_ENV_VAR);
    assert_eq!(root, PathBuf::from("/tmp/shelfwise-env-root"));
}

#[test]
#[serial]
fn test_resolver_cli_arg_beats_env_var() {
    env::set_var(ROOT_ENV_VAR, "/tmp/shelfwise-env-root");

    let root = RootFolderResolver::new()
        .with_cli_arg(Some(PathBuf::from("/tmp/shelfwise-cli-root")))
        .resolve();

    env::remove_var(ROOT_ENV_VAR);
    assert_eq!(root, PathBuf::from("/tmp/shelfwise-cli-root"));
}

#[test]
#[serial]
fn test_resolver_toml_used_without_env() {
    env::remove_var(ROOT_ENV_VAR);

    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/srv/audiobooks")),
        ..Default::default()
    };
    let root = RootFolderResolver::new().with_config(&config).resolve();
    assert_eq!(root, PathBuf::from("/srv/audiobooks"));
}

#[test]
#[serial]
fn test_state_dir_defaults_under_root() {
    env::remove_var(STATE_DIR_ENV_VAR);

    let dir = resolve_state_dir(None, &TomlConfig::default(), Path::new("/srv/audiobooks"));
    assert_eq!(dir, PathBuf::from("/srv/audiobooks/.shelfwise"));
}

#[test]
#[serial]
fn test_state_dir_env_var_beats_toml() {
    env::set_var(STATE_DIR_ENV_VAR, "/tmp/shelfwise-state");

    let config = TomlConfig {
        state_dir: Some(PathBuf::from("/tmp/from-toml")),
        ..Default::default()
    };
    let dir = resolve_state_dir(None, &config, Path::new("/srv"));

    env::remove_var(STATE_DIR_ENV_VAR);
    assert_eq!(dir, PathBuf::from("/tmp/shelfwise-state"));
}

#[test]
fn test_write_toml_config_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("config.toml");

    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/audiobooks")),
        logging: LoggingConfig {
            level: "debug".to_string(),
            file: None,
        },
        ..Default::default()
    };

    write_toml_config(&config, &target).unwrap();

    assert!(target.exists());
    assert!(!temp_path_for(&target).exists());
    assert_eq!(load_toml_config(&target), config);
}

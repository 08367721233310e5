//! Tests for configuration loading and samples folder resolution
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate PIANOLA_SAMPLES are marked with #[serial].

use pianola_common::config::{
    load_toml_or_default, CompiledDefaults, LoggingConfig, SamplesFolderResolver, SAMPLES_ENV_VAR,
};
use serde::Deserialize;
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Default, Deserialize)]
struct TestConfig {
    #[serde(default)]
    samples_folder: Option<PathBuf>,
    #[serde(default)]
    logging: LoggingConfig,
}

#[test]
fn test_compiled_defaults_for_current_platform() {
    let defaults = CompiledDefaults::for_current_platform();

    assert!(!defaults.samples_folder.as_os_str().is_empty());
    assert!(defaults.samples_folder.ends_with("samples"));
    assert_eq!(defaults.log_level, "info");
}

#[test]
#[serial]
fn test_resolver_with_no_overrides_uses_default() {
    env::remove_var(SAMPLES_ENV_VAR);

    let folder = SamplesFolderResolver::new().resolve();

    assert_eq!(folder, CompiledDefaults::for_current_platform().samples_folder);
}

#[test]
#[serial]
fn test_resolver_env_var_beats_toml() {
    env::set_var(SAMPLES_ENV_VAR, "/tmp/pianola-env-samples");

    let folder = SamplesFolderResolver::new()
        .with_toml_value(Some(PathBuf::from("/tmp/pianola-toml-samples")))
        .resolve();

    assert_eq!(folder, PathBuf::from("/tmp/pianola-env-samples"));

    env::remove_var(SAMPLES_ENV_VAR);
}

#[test]
#[serial]
fn test_resolver_cli_arg_takes_precedence() {
    env::set_var(SAMPLES_ENV_VAR, "/tmp/pianola-env-samples");

    let folder = SamplesFolderResolver::new()
        .with_cli_arg(Some(PathBuf::from("/tmp/pianola-cli-samples")))
        .with_toml_value(Some(PathBuf::from("/tmp/pianola-toml-samples")))
        .resolve();

    assert_eq!(folder, PathBuf::from("/tmp/pianola-cli-samples"));

    env::remove_var(SAMPLES_ENV_VAR);
}

#[test]
#[serial]
fn test_resolver_toml_value_used_without_env() {
    env::remove_var(SAMPLES_ENV_VAR);

    let folder = SamplesFolderResolver::new()
        .with_toml_value(Some(PathBuf::from("/tmp/pianola-toml-samples")))
        .resolve();

    assert_eq!(folder, PathBuf::from("/tmp/pianola-toml-samples"));
}

#[test]
fn test_load_toml_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "samples_folder = \"/srv/piano\"\n\n[logging]\nlevel = \"debug\""
    )
    .unwrap();

    let config: TestConfig = load_toml_or_default(file.path()).unwrap();

    assert_eq!(config.samples_folder, Some(PathBuf::from("/srv/piano")));
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_missing_toml_file_does_not_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    let config: TestConfig = load_toml_or_default(&path).unwrap();

    assert!(config.samples_folder.is_none());
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_malformed_toml_is_config_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "samples_folder = [unterminated").unwrap();

    let result: pianola_common::Result<TestConfig> = load_toml_or_default(file.path());

    assert!(matches!(result, Err(pianola_common::Error::Config(_))));
}

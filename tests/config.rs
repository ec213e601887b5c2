//! Integration tests for configuration loading and environment overrides.

use odin_dashboard::config::DashboardConfig;
use serial_test::serial;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(contents.as_bytes())
        .expect("Failed to write config");
    file
}

#[test]
#[serial]
fn test_load_full_config() {
    let file = write_config(
        r#"
        adapters = ["qem", "lpdpower"]

        [application]
        name = "Detector Dashboard"
        log_level = "debug"

        [server]
        base_url = "http://odin.example:8888"
        api_version = "0.2"
        request_timeout_ms = 500

        [polling]
        delay_ms = 1000

        [banner]
        timeout_ms = 2000
        "#,
    );

    let config = DashboardConfig::load_from(file.path()).expect("Failed to load config");
    assert_eq!(config.adapters, vec!["qem", "lpdpower"]);
    assert_eq!(config.application.name, "Detector Dashboard");
    assert_eq!(config.server.api_version, "0.2");
    assert_eq!(config.request_timeout(), Duration::from_millis(500));
    assert_eq!(config.poll_delay(), Duration::from_secs(1));
    assert_eq!(config.banner_timeout(), Duration::from_secs(2));
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn test_minimal_config_uses_defaults() {
    let file = write_config(r#"adapters = ["qem"]"#);

    let config = DashboardConfig::load_from(file.path()).expect("Failed to load config");
    assert_eq!(config.application.log_level, "info");
    assert_eq!(config.server.base_url, "http://127.0.0.1:8888");
    assert_eq!(config.poll_delay(), Duration::from_millis(200));
    assert_eq!(config.banner_timeout(), Duration::from_secs(5));
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn test_missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = DashboardConfig::load_from(dir.path().join("absent.toml"))
        .expect("Failed to load config");
    assert!(config.adapters.is_empty());
    assert!(config.validate().is_err());
}

#[test]
#[serial]
fn test_env_overrides_file() {
    let file = write_config(
        r#"
        adapters = ["qem"]

        [polling]
        delay_ms = 1000
        "#,
    );

    std::env::set_var("ODIN_DASHBOARD_POLLING__DELAY_MS", "50");
    std::env::set_var("ODIN_DASHBOARD_APPLICATION__LOG_LEVEL", "warn");
    let result = DashboardConfig::load_from(file.path());
    std::env::remove_var("ODIN_DASHBOARD_POLLING__DELAY_MS");
    std::env::remove_var("ODIN_DASHBOARD_APPLICATION__LOG_LEVEL");

    let config = result.expect("Failed to load config");
    assert_eq!(config.poll_delay(), Duration::from_millis(50));
    assert_eq!(config.application.log_level, "warn");
}

#[test]
#[serial]
fn test_malformed_file_is_an_error() {
    let file = write_config("adapters = [qem");
    assert!(DashboardConfig::load_from(file.path()).is_err());
}

#[test]
#[serial]
fn test_validation_rejects_bad_values() {
    let file = write_config(
        r#"
        adapters = ["qem"]

        [server]
        base_url = "::not a url::"
        "#,
    );
    let config = DashboardConfig::load_from(file.path()).expect("Failed to load config");
    let err = config.validate().expect_err("Bad URL accepted");
    assert!(err.to_string().contains("base_url"));
}

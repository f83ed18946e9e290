//! Integration tests for configuration loader
//!
//! Tests the end-to-end behavior of loading configuration from files.

use std::io::Write;

use banklink_domain::{BankLinkError, LogFormat, StorageBackend};
use banklink_infra::config;
use tempfile::{Builder, TempDir};

#[test]
fn test_load_config_from_json_file() {
    let json_content = r#"{
        "api": {
            "base_url": "https://public-api.sandbox.bunq.com",
            "timeout_secs": 15,
            "device_description": "Living room"
        },
        "oauth": {
            "client_id": "json-client",
            "client_secret": "json-secret",
            "redirect_url": "http://localhost:8080/callback"
        },
        "storage": { "backend": "file", "path": "/tmp/banklink-secrets.json" },
        "poller": { "enabled": true, "interval_secs": 120, "user_id": 42 }
    }"#;

    let mut temp_file = Builder::new().suffix(".json").tempfile().expect("Failed to create temp file");
    temp_file.write_all(json_content.as_bytes()).expect("Failed to write to temp file");

    let config = config::load_from_file(Some(temp_file.path().to_path_buf()))
        .expect("Failed to load config from JSON file");

    assert_eq!(config.api.base_url, "https://public-api.sandbox.bunq.com");
    assert_eq!(config.api.timeout_secs, 15);
    assert_eq!(config.api.device_description, "Living room");
    assert_eq!(config.oauth.client_id, "json-client");
    assert_eq!(config.oauth.redirect_url, "http://localhost:8080/callback");
    assert_eq!(config.storage.backend, StorageBackend::File);
    assert_eq!(config.storage.path, "/tmp/banklink-secrets.json");
    assert!(config.poller.enabled);
    assert_eq!(config.poller.interval_secs, 120);
    assert_eq!(config.poller.user_id, Some(42));
}

#[test]
fn test_load_config_from_toml_file() {
    let toml_content = r#"
[oauth]
client_id = "toml-client"
client_secret = "toml-secret"

[storage]
backend = "memory"

[logging]
level = "debug"
format = "json"
"#;

    let mut temp_file = Builder::new().suffix(".toml").tempfile().expect("Failed to create temp file");
    temp_file.write_all(toml_content.as_bytes()).expect("Failed to write to temp file");

    let config = config::load_from_file(Some(temp_file.path().to_path_buf()))
        .expect("Failed to load config from TOML file");

    assert_eq!(config.oauth.client_id, "toml-client");
    assert_eq!(config.storage.backend, StorageBackend::Memory);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.format, LogFormat::Json);

    // Sections left out keep their defaults
    assert_eq!(config.api.base_url, "https://api.bunq.com");
    assert_eq!(config.api.max_attempts, 1);
    assert!(config.poller.user_id.is_none());
}

#[test]
fn test_invalid_config_file_is_a_config_error() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[api\ntimeout_secs = ").expect("Failed to write config");

    let err = config::load_from_file(Some(path)).unwrap_err();
    match err {
        BankLinkError::Config(message) => assert!(message.contains("TOML"), "unexpected: {message}"),
        other => panic!("expected Config error, got {other:?}"),
    }
}

#[test]
fn test_missing_explicit_path_is_reported() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let err = config::load_from_file(Some(dir.path().join("absent.json"))).unwrap_err();
    assert!(matches!(err, BankLinkError::Config(message) if message.contains("not found")));
}

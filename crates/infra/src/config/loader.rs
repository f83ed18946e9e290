//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If the required ones are missing, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! Required:
//! - `BANKLINK_OAUTH_CLIENT_ID`: OAuth2 client id
//! - `BANKLINK_OAUTH_CLIENT_SECRET`: OAuth2 client secret
//!
//! Optional (defaults apply when unset):
//! - `BANKLINK_API_URL`, `BANKLINK_TIMEOUT_SECS`, `BANKLINK_MAX_ATTEMPTS`
//! - `BANKLINK_OAUTH_AUTHORIZATION_URL`, `BANKLINK_OAUTH_TOKEN_URL`,
//!   `BANKLINK_OAUTH_REDIRECT_URL`
//! - `BANKLINK_STORAGE_BACKEND` (`keychain`/`file`/`memory`),
//!   `BANKLINK_STORAGE_PATH`, `BANKLINK_KEYCHAIN_SERVICE`
//! - `BANKLINK_POLL_ENABLED`, `BANKLINK_POLL_INTERVAL_SECS`,
//!   `BANKLINK_USER_ID`, `BANKLINK_DEVICE_NAME`
//! - `BANKLINK_LOG_LEVEL`, `BANKLINK_LOG_FORMAT` (`pretty`/`json`)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./banklink.json` or `./banklink.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use banklink_domain::{BankLinkError, Config, LogFormat, Result, StorageBackend};

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `BankLinkError::Config` if configuration cannot be loaded from
/// either source or a value is invalid.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// The OAuth client credentials must be present; everything else falls back
/// to its default.
///
/// # Errors
/// Returns `BankLinkError::Config` if required variables are missing or have
/// invalid values.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();

    config.oauth.client_id = env_var("BANKLINK_OAUTH_CLIENT_ID")?;
    config.oauth.client_secret = env_var("BANKLINK_OAUTH_CLIENT_SECRET")?;

    if let Some(value) = env_opt("BANKLINK_OAUTH_AUTHORIZATION_URL") {
        config.oauth.authorization_url = value;
    }
    if let Some(value) = env_opt("BANKLINK_OAUTH_TOKEN_URL") {
        config.oauth.token_url = value;
    }
    if let Some(value) = env_opt("BANKLINK_OAUTH_REDIRECT_URL") {
        config.oauth.redirect_url = value;
    }

    if let Some(value) = env_opt("BANKLINK_API_URL") {
        config.api.base_url = value;
    }
    if let Some(value) = env_parse::<u64>("BANKLINK_TIMEOUT_SECS")? {
        config.api.timeout_secs = value;
    }
    if let Some(value) = env_parse::<usize>("BANKLINK_MAX_ATTEMPTS")? {
        config.api.max_attempts = value;
    }

    if let Some(value) = env_opt("BANKLINK_STORAGE_BACKEND") {
        config.storage.backend = parse_storage_backend(&value)?;
    }
    if let Some(value) = env_opt("BANKLINK_STORAGE_PATH") {
        config.storage.path = value;
    }
    if let Some(value) = env_opt("BANKLINK_KEYCHAIN_SERVICE") {
        config.storage.keychain_service = value;
    }

    config.poller.enabled = env_bool("BANKLINK_POLL_ENABLED", config.poller.enabled);
    if let Some(value) = env_parse::<u64>("BANKLINK_POLL_INTERVAL_SECS")? {
        config.poller.interval_secs = value;
    }
    if let Some(value) = env_parse::<u64>("BANKLINK_USER_ID")? {
        config.poller.user_id = Some(value);
    }
    if let Some(value) = env_opt("BANKLINK_DEVICE_NAME") {
        config.poller.device_name = value;
    }

    if let Some(value) = env_opt("BANKLINK_LOG_LEVEL") {
        config.logging.level = value;
    }
    if let Some(value) = env_opt("BANKLINK_LOG_FORMAT") {
        config.logging.format = parse_log_format(&value)?;
    }

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `BankLinkError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(BankLinkError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            BankLinkError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| BankLinkError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| BankLinkError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| BankLinkError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(BankLinkError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(candidate_files(&cwd));
        candidates.push(cwd.join("../config.json"));
        candidates.push(cwd.join("../config.toml"));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(candidate_files(exe_dir));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn candidate_files(dir: &Path) -> Vec<PathBuf> {
    ["config.json", "config.toml", "banklink.json", "banklink.toml"]
        .iter()
        .map(|name| dir.join(name))
        .collect()
}

fn parse_storage_backend(value: &str) -> Result<StorageBackend> {
    match value.to_ascii_lowercase().as_str() {
        "keychain" => Ok(StorageBackend::Keychain),
        "file" => Ok(StorageBackend::File),
        "memory" => Ok(StorageBackend::Memory),
        other => Err(BankLinkError::Config(format!("Invalid storage backend: {other}"))),
    }
}

fn parse_log_format(value: &str) -> Result<LogFormat> {
    match value.to_ascii_lowercase().as_str() {
        "pretty" => Ok(LogFormat::Pretty),
        "json" => Ok(LogFormat::Json),
        other => Err(BankLinkError::Config(format!("Invalid log format: {other}"))),
    }
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| BankLinkError::Config(format!("Missing required environment variable: {}", key)))
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_opt(key)
        .map(|value| {
            value.trim().parse::<T>().map_err(|e| BankLinkError::Config(format!("Invalid {key}: {e}")))
        })
        .transpose()
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use once_cell::sync::Lazy;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const ALL_VARS: [&str; 6] = [
        "BANKLINK_OAUTH_CLIENT_ID",
        "BANKLINK_OAUTH_CLIENT_SECRET",
        "BANKLINK_USER_ID",
        "BANKLINK_STORAGE_BACKEND",
        "BANKLINK_TIMEOUT_SECS",
        "BANKLINK_LOG_FORMAT",
    ];

    fn clear_env() {
        for var in ALL_VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_env_bool_parsing() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        std::env::set_var("BANKLINK_TEST_BOOL_ON", "on");
        std::env::set_var("BANKLINK_TEST_BOOL_OFF", "0");

        assert!(env_bool("BANKLINK_TEST_BOOL_ON", false));
        assert!(!env_bool("BANKLINK_TEST_BOOL_OFF", true));
        assert!(env_bool("BANKLINK_TEST_BOOL_MISSING", true));

        std::env::remove_var("BANKLINK_TEST_BOOL_ON");
        std::env::remove_var("BANKLINK_TEST_BOOL_OFF");
    }

    #[test]
    fn test_load_from_env_all_vars_set() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("BANKLINK_OAUTH_CLIENT_ID", "client");
        std::env::set_var("BANKLINK_OAUTH_CLIENT_SECRET", "secret");
        std::env::set_var("BANKLINK_USER_ID", "42");
        std::env::set_var("BANKLINK_STORAGE_BACKEND", "Memory");
        std::env::set_var("BANKLINK_TIMEOUT_SECS", "10");
        std::env::set_var("BANKLINK_LOG_FORMAT", "json");

        let config = load_from_env().expect("config from env");

        assert_eq!(config.oauth.client_id, "client");
        assert_eq!(config.oauth.client_secret, "secret");
        assert_eq!(config.poller.user_id, Some(42));
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.api.timeout_secs, 10);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.api.base_url, "https://api.bunq.com");

        clear_env();
    }

    #[test]
    fn test_load_from_env_missing_var() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, BankLinkError::Config(_)), "Should be a Config error");
    }

    #[test]
    fn test_load_from_env_invalid_number() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("BANKLINK_OAUTH_CLIENT_ID", "client");
        std::env::set_var("BANKLINK_OAUTH_CLIENT_SECRET", "secret");
        std::env::set_var("BANKLINK_USER_ID", "not-a-number");

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, BankLinkError::Config(_)), "Should be a Config error");

        clear_env();
    }

    #[test]
    fn test_parse_config_toml() {
        let toml_content = r#"
[oauth]
client_id = "client"

[poller]
user_id = 7
interval_secs = 60
"#;

        let config = parse_config(toml_content, &PathBuf::from("test.toml")).expect("valid TOML");
        assert_eq!(config.oauth.client_id, "client");
        assert_eq!(config.poller.user_id, Some(7));
        assert_eq!(config.poller.interval_secs, 60);
    }

    #[test]
    fn test_parse_config_json() {
        let config = parse_config(r#"{"api": {"timeout_secs": 5}}"#, &PathBuf::from("test.json"))
            .expect("valid JSON");
        assert_eq!(config.api.timeout_secs, 5);
    }

    #[test]
    fn test_parse_config_unsupported_format() {
        let result = parse_config("some content", &PathBuf::from("test.yaml"));
        assert!(result.is_err(), "Should fail with unsupported format");
    }

    #[test]
    fn test_load_from_file_not_found() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/config.json")));
        assert!(matches!(result, Err(BankLinkError::Config(_))));
    }
}

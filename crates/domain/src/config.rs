//! Configuration structures
//!
//! Every section has serde defaults so a config file only needs the values
//! that differ (typically the OAuth client credentials and the user id).

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_API_URL, DEFAULT_DEVICE_DESCRIPTION, DEFAULT_KEY_BITS, DEFAULT_LOCALE,
    DEFAULT_OAUTH_AUTHORIZATION_URL, DEFAULT_OAUTH_TOKEN_URL, DEFAULT_POLL_INTERVAL_SECS,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_USER_AGENT, PERMIT_ALL_IPS,
};

/// Top-level application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub oauth: OAuthSettings,
    pub storage: StorageConfig,
    pub poller: PollerConfig,
    pub logging: LoggingConfig,
}

/// Remote API and request header settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Total attempts per HTTP call (initial try + retries on connect errors)
    pub max_attempts: usize,
    pub user_agent: String,
    pub language: String,
    pub region: String,
    pub device_description: String,
    pub permitted_ips: Vec<String>,
    pub key_bits: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_attempts: 1,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            language: DEFAULT_LOCALE.to_string(),
            region: DEFAULT_LOCALE.to_string(),
            device_description: DEFAULT_DEVICE_DESCRIPTION.to_string(),
            permitted_ips: vec![PERMIT_ALL_IPS.to_string()],
            key_bits: DEFAULT_KEY_BITS,
        }
    }
}

/// OAuth2 client registration used for the authorization-code exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuthSettings {
    pub client_id: String,
    pub client_secret: String,
    pub authorization_url: String,
    pub token_url: String,
    pub redirect_url: String,
}

impl Default for OAuthSettings {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            authorization_url: DEFAULT_OAUTH_AUTHORIZATION_URL.to_string(),
            token_url: DEFAULT_OAUTH_TOKEN_URL.to_string(),
            redirect_url: "http://localhost:8888/callback".to_string(),
        }
    }
}

/// Where credentials (keypair, installation token, OAuth token) live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    Keychain,
    File,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// JSON file used by the `file` backend
    pub path: String,
    /// Keychain service name used by the `keychain` backend
    pub keychain_service: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            path: "banklink-credentials.json".to_string(),
            keychain_service: "BankLink.credentials".to_string(),
        }
    }
}

/// Balance poller settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    pub enabled: bool,
    pub interval_secs: u64,
    /// Remote user id whose monetary accounts are polled
    pub user_id: Option<u64>,
    /// Prefix used in published balance labels
    pub device_name: String,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            user_id: None,
            device_name: "bunq".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, overridden by `RUST_LOG` when set
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Pretty }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"oauth": {"client_id": "abc"}, "poller": {"user_id": 42}}"#)
                .unwrap();

        assert_eq!(config.oauth.client_id, "abc");
        assert_eq!(config.oauth.token_url, DEFAULT_OAUTH_TOKEN_URL);
        assert_eq!(config.poller.user_id, Some(42));
        assert_eq!(config.poller.interval_secs, DEFAULT_POLL_INTERVAL_SECS);
        assert_eq!(config.api.key_bits, 2048);
        assert_eq!(config.api.permitted_ips, vec!["*".to_string()]);
        assert_eq!(config.storage.backend, StorageBackend::File);
    }

    #[test]
    fn storage_backend_uses_snake_case() {
        let storage: StorageConfig = serde_json::from_str(r#"{"backend": "keychain"}"#).unwrap();
        assert_eq!(storage.backend, StorageBackend::Keychain);
    }
}

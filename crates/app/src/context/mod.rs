//! Application context - dependency injection container

use std::sync::Arc;
use std::time::Duration;

use banklink_core::{BalanceSink, CredentialStore, SecretStore};
use banklink_domain::{Config, Result};
use banklink_infra::storage::{secret_store, CredentialRepository};
use banklink_infra::{
    AccountPoller, ApiClient, HandshakeClient, KeyManager, OAuthCodeExchanger, PollerSettings,
    StoredAccessSecret,
};

use crate::sink::LoggingBalanceSink;

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    pub keys: Arc<KeyManager>,
    pub access: Arc<StoredAccessSecret>,
    pub client: ApiClient,
    pub oauth: OAuthCodeExchanger,
    pub sink: Arc<dyn BalanceSink>,
}

impl AppContext {
    /// Wire every service from configuration.
    ///
    /// Nothing touches the network here; installation happens on demand.
    ///
    /// # Errors
    /// Returns `Config` if an HTTP client cannot be built.
    pub fn new(config: Config) -> Result<Self> {
        let secrets = secret_store(&config.storage);
        Self::with_secret_store(config, secrets)
    }

    /// Wire every service on top of an existing secret store.
    pub fn with_secret_store(config: Config, secrets: Arc<dyn SecretStore>) -> Result<Self> {
        let credentials: Arc<dyn CredentialStore> = Arc::new(CredentialRepository::new(secrets.clone()));
        let handshake = HandshakeClient::from_config(&config.api)?;

        let keys = Arc::new(KeyManager::new(credentials, handshake.clone(), config.api.key_bits));
        let access = Arc::new(StoredAccessSecret::new(secrets));
        let client = ApiClient::with_handshake(handshake, keys.clone(), access.clone());
        let oauth = OAuthCodeExchanger::from_settings(
            config.oauth.clone(),
            Duration::from_secs(config.api.timeout_secs.max(1)),
        )?;

        tracing::debug!(backend = ?config.storage.backend, api = %config.api.base_url, "context wired");

        Ok(Self { config, keys, access, client, oauth, sink: Arc::new(LoggingBalanceSink) })
    }

    /// Poller over the configured user, publishing to the context sink.
    ///
    /// # Errors
    /// Returns `Config` if no user id is configured.
    pub fn poller(&self) -> Result<AccountPoller> {
        let settings = PollerSettings::from_config(&self.config.poller)?;
        Ok(AccountPoller::new(self.client.clone(), self.sink.clone(), settings))
    }
}

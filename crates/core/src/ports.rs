//! Port interfaces
//!
//! These traits define the boundaries between the protocol logic and the
//! collaborators it depends on: key material, persistence, the OAuth2
//! client, and whoever consumes polled balances.

use async_trait::async_trait;
use banklink_domain::{AccountBalance, CredentialBundle, Result};

/// Signs raw payloads with the installation's private key
#[async_trait]
pub trait PayloadSigner: Send + Sync {
    /// Return the base64 encoded signature over `payload`.
    ///
    /// Fails with `NoCredentials` when no keypair is installed.
    async fn sign(&self, payload: &[u8]) -> Result<String>;
}

/// Durable storage of the credential bundle
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Load the persisted bundle, `None` when not installed yet
    async fn load(&self) -> Result<Option<CredentialBundle>>;

    /// Persist the bundle in a single write
    async fn save(&self, bundle: &CredentialBundle) -> Result<()>;

    /// Remove the persisted bundle (idempotent)
    async fn clear(&self) -> Result<()>;
}

/// Generic string secret storage backend (keychain, file, memory)
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a secret (idempotent)
    async fn delete(&self, key: &str) -> Result<()>;
}

/// The OAuth2 collaborator: yields the stored access secret, if any
#[async_trait]
pub trait AccessSecretProvider: Send + Sync {
    async fn access_secret(&self) -> Result<Option<String>>;
}

/// Consumer of polled account balances
#[async_trait]
pub trait BalanceSink: Send + Sync {
    async fn publish(&self, balance: &AccountBalance) -> Result<()>;
}

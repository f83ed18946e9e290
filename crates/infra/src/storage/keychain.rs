//! Platform keychain secret store

use async_trait::async_trait;
use banklink_core::SecretStore;
use banklink_domain::{BankLinkError, Result};
use keyring::Entry;
use tracing::debug;

use crate::errors::InfraError;

/// Secrets stored as keychain entries under one service name
///
/// (macOS Keychain Access, Windows Credential Manager, Linux Secret Service)
pub struct KeychainSecretStore {
    service_name: String,
}

impl KeychainSecretStore {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self { service_name: service_name.into() }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    fn entry(&self, key: &str) -> Result<Entry> {
        Entry::new(&self.service_name, key).map_err(|e| BankLinkError::from(InfraError::from(e)))
    }
}

#[async_trait]
impl SecretStore for KeychainSecretStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        debug!(service = %self.service_name, key = %key, "reading secret from keychain");

        match self.entry(key)?.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(InfraError::from(e).into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        debug!(service = %self.service_name, key = %key, "storing secret in keychain");

        self.entry(key)?.set_password(value).map_err(|e| BankLinkError::from(InfraError::from(e)))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        debug!(service = %self.service_name, key = %key, "deleting secret from keychain");

        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(InfraError::from(e).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_entries_read_as_none() {
        let store = KeychainSecretStore::new("BankLink.tests.missing");
        assert_eq!(store.get("never-written").await.unwrap(), None);
        store.delete("never-written").await.unwrap();
    }
}

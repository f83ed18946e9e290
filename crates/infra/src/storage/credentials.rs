//! Credential bundle persistence on top of a secret store

use std::sync::Arc;

use async_trait::async_trait;
use banklink_core::{CredentialStore, SecretStore};
use banklink_domain::{BankLinkError, CredentialBundle, Result};

/// Key of the serialized bundle; one value so a save is a single write
pub const CREDENTIALS_KEY: &str = "credentials.bundle";

pub struct CredentialRepository {
    secrets: Arc<dyn SecretStore>,
}

impl CredentialRepository {
    pub fn new(secrets: Arc<dyn SecretStore>) -> Self {
        Self { secrets }
    }
}

#[async_trait]
impl CredentialStore for CredentialRepository {
    async fn load(&self) -> Result<Option<CredentialBundle>> {
        let Some(json) = self.secrets.get(CREDENTIALS_KEY).await? else {
            return Ok(None);
        };
        serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| BankLinkError::Storage(format!("stored credential bundle is unreadable: {e}")))
    }

    async fn save(&self, bundle: &CredentialBundle) -> Result<()> {
        let json = serde_json::to_string(bundle)
            .map_err(|e| BankLinkError::Internal(format!("failed to serialize credentials: {e}")))?;
        self.secrets.set(CREDENTIALS_KEY, &json).await
    }

    async fn clear(&self) -> Result<()> {
        self.secrets.delete(CREDENTIALS_KEY).await
    }
}

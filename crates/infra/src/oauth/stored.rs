//! OAuth token persistence

use std::sync::Arc;

use async_trait::async_trait;
use banklink_core::{AccessSecretProvider, SecretStore};
use banklink_domain::{BankLinkError, Result, TokenSet};

/// Key of the serialized token set
pub const OAUTH_TOKEN_KEY: &str = "oauth.token";

/// Access secret backed by a secret store
pub struct StoredAccessSecret {
    secrets: Arc<dyn SecretStore>,
}

impl StoredAccessSecret {
    pub fn new(secrets: Arc<dyn SecretStore>) -> Self {
        Self { secrets }
    }

    pub async fn store_tokens(&self, tokens: &TokenSet) -> Result<()> {
        let json = serde_json::to_string(tokens)
            .map_err(|e| BankLinkError::Internal(format!("failed to serialize OAuth token: {e}")))?;
        self.secrets.set(OAUTH_TOKEN_KEY, &json).await
    }

    pub async fn tokens(&self) -> Result<Option<TokenSet>> {
        let Some(json) = self.secrets.get(OAUTH_TOKEN_KEY).await? else {
            return Ok(None);
        };
        serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| BankLinkError::Storage(format!("stored OAuth token is unreadable: {e}")))
    }

    pub async fn clear(&self) -> Result<()> {
        self.secrets.delete(OAUTH_TOKEN_KEY).await
    }
}

#[async_trait]
impl AccessSecretProvider for StoredAccessSecret {
    async fn access_secret(&self) -> Result<Option<String>> {
        Ok(self.tokens().await?.map(|tokens| tokens.access_token))
    }
}

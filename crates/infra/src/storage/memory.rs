//! In-memory secret store for tests and ephemeral runs

use std::collections::HashMap;

use async_trait::async_trait;
use banklink_core::SecretStore;
use banklink_domain::Result;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemorySecretStore {
    secrets: RwLock<HashMap<String, String>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.secrets.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.secrets.write().await.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.secrets.write().await.remove(key);
        Ok(())
    }
}

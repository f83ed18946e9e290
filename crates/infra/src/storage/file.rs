//! JSON file secret store
//!
//! All secrets live in one JSON object. Every write replaces the file through
//! a temporary sibling and a rename, so a crash never leaves a half-written
//! file behind.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use banklink_core::SecretStore;
use banklink_domain::{BankLinkError, Result};
use tokio::sync::Mutex;
use tracing::debug;

use crate::errors::InfraError;

type SecretMap = BTreeMap<String, String>;

pub struct FileSecretStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles
    write_lock: Mutex<()>,
}

impl FileSecretStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<SecretMap> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(SecretMap::new()),
            Err(e) => return Err(InfraError::from(e).into()),
        };

        if contents.trim().is_empty() {
            return Ok(SecretMap::new());
        }

        serde_json::from_str(&contents).map_err(|e| {
            BankLinkError::Storage(format!("secret file {} is corrupt: {e}", self.path.display()))
        })
    }

    async fn write_all(&self, secrets: &SecretMap) -> Result<()> {
        let json = serde_json::to_string_pretty(secrets).map_err(|e| BankLinkError::from(InfraError::from(e)))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| BankLinkError::from(InfraError::from(e)))?;
        }

        let mut temp = self.path.clone().into_os_string();
        temp.push(".tmp");
        let temp = PathBuf::from(temp);

        tokio::fs::write(&temp, json).await.map_err(|e| BankLinkError::from(InfraError::from(e)))?;
        tokio::fs::rename(&temp, &self.path).await.map_err(|e| BankLinkError::from(InfraError::from(e)))?;

        debug!(path = %self.path.display(), entries = secrets.len(), "secret file written");
        Ok(())
    }
}

#[async_trait]
impl SecretStore for FileSecretStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut secrets = self.read_all().await?;
        secrets.insert(key.to_string(), value.to_string());
        self.write_all(&secrets).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut secrets = self.read_all().await?;
        if secrets.remove(key).is_some() {
            self.write_all(&secrets).await?;
        }
        Ok(())
    }
}

//! Secret storage backends and the credential repository

pub mod credentials;
pub mod file;
pub mod keychain;
pub mod memory;

use std::sync::Arc;

use banklink_core::SecretStore;
use banklink_domain::{StorageBackend, StorageConfig};

pub use credentials::{CredentialRepository, CREDENTIALS_KEY};
pub use file::FileSecretStore;
pub use keychain::KeychainSecretStore;
pub use memory::MemorySecretStore;

/// Secret store for the configured backend.
pub fn secret_store(config: &StorageConfig) -> Arc<dyn SecretStore> {
    match config.backend {
        StorageBackend::Keychain => Arc::new(KeychainSecretStore::new(config.keychain_service.clone())),
        StorageBackend::File => Arc::new(FileSecretStore::new(&config.path)),
        StorageBackend::Memory => Arc::new(MemorySecretStore::new()),
    }
}

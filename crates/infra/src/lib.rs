//! # BankLink Infrastructure
//!
//! Infrastructure implementations of the core ports.
//!
//! This crate contains:
//! - HTTP transport and the signed banking API client
//! - RSA key management and the installation handshake
//! - Session management and the balance poller
//! - Secret storage backends (keychain, file, memory)
//! - OAuth2 code exchange, config loading, tracing setup
//!
//! ## Architecture
//! - Implements traits defined in `banklink-core`
//! - Contains all "impure" code (network, storage, crypto)

pub mod api;
pub mod config;
pub mod errors;
pub mod http;
pub mod key_manager;
pub mod oauth;
pub mod observability;
pub mod storage;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;

// Re-export commonly used items
pub use api::{AccountPoller, ApiClient, HandshakeClient, PollerSettings, SessionManager};
pub use errors::InfraError;
pub use http::HttpClient;
pub use key_manager::KeyManager;
pub use oauth::{OAuthCodeExchanger, StoredAccessSecret};
pub use observability::init_tracing;

//! # BankLink Core
//!
//! Pure protocol logic - no infrastructure dependencies.
//!
//! This crate contains:
//! - Canonical request strings and the signature builder
//! - The session lifecycle state machine
//! - Response envelope and error body handling
//! - Port/adapter interfaces (traits)
//!
//! ## Architecture Principles
//! - Only depends on `banklink-domain`
//! - No network, storage, or crypto code
//! - All external dependencies via traits

pub mod accounts;
pub mod envelope;
pub mod ports;
pub mod session;
pub mod signing;

pub use envelope::{error_description, is_authentication_failure, ApiResponse};
pub use ports::{AccessSecretProvider, BalanceSink, CredentialStore, PayloadSigner, SecretStore};
pub use session::{SessionPhase, SessionState};
pub use signing::{build_canonical_string, SignatureBuilder};

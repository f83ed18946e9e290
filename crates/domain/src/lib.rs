//! # BankLink Domain
//!
//! Business domain types and models for BankLink.
//!
//! This crate contains:
//! - Trust artifacts (keypair, installation token, session token)
//! - Request envelopes and banking result models
//! - Domain error types and Result definitions
//! - Configuration structures and wire constants
//!
//! ## Architecture
//! - No dependencies on other BankLink crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;

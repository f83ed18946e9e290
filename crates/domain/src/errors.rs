//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message used when the remote API returns no usable error description.
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown Error";

/// Main error type for BankLink
///
/// `Clone` so a single session-establishment outcome can be handed to every
/// caller waiting on it.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail")]
pub enum BankLinkError {
    /// Keypair or installation token missing. Fatal until the installation
    /// flow is triggered again.
    #[error("No signing credentials available")]
    NoCredentials,

    /// No OAuth2 access secret stored; the user must authorize again.
    #[error("Authorization required: {0}")]
    AuthRequired(String),

    /// Non-2xx response carrying a server supplied (or generic) message.
    #[error("{message}")]
    RemoteApi { status: u16, message: String },

    /// Network failure or timeout.
    #[error("Transport error: {message}")]
    Transport { message: String, retryable: bool },

    /// The session was rejected; the next request establishes a new one.
    #[error("Session invalid: {0}")]
    SessionInvalid(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    /// Key generation, key decoding or signing failure.
    #[error("Security error: {0}")]
    Security(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Categories of errors for retry and reporting decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Credentials or authorization missing - operator or user action needed
    Credentials,
    /// Session rejected - next request re-authenticates
    Session,
    /// Remote API rejected the request - not retried automatically
    Remote,
    /// Network/timeout - safe to retry with backoff
    Transport,
    /// Local failures (config, storage, keys, decoding)
    Local,
}

impl BankLinkError {
    /// Build a retryable transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport { message: message.into(), retryable: true }
    }

    /// Build a remote API error from a status code and message.
    pub fn remote(status: u16, message: impl Into<String>) -> Self {
        Self::RemoteApi { status, message: message.into() }
    }

    /// Get the error category for this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NoCredentials | Self::AuthRequired(_) => ErrorCategory::Credentials,
            Self::SessionInvalid(_) => ErrorCategory::Session,
            Self::RemoteApi { .. } => ErrorCategory::Remote,
            Self::Transport { .. } => ErrorCategory::Transport,
            Self::Config(_)
            | Self::Storage(_)
            | Self::Security(_)
            | Self::Decode(_)
            | Self::Internal(_) => ErrorCategory::Local,
        }
    }

    /// Check if the failed call may simply be issued again
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { retryable, .. } => *retryable,
            Self::SessionInvalid(_) => true,
            _ => false,
        }
    }
}

/// Result type alias for BankLink operations
pub type Result<T> = std::result::Result<T, BankLinkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_error_displays_server_message_verbatim() {
        let err = BankLinkError::remote(400, "Invalid signature");
        assert_eq!(err.to_string(), "Invalid signature");
        assert_eq!(err.category(), ErrorCategory::Remote);
        assert!(!err.is_retryable());
    }

    #[test]
    fn transport_errors_are_retryable() {
        assert!(BankLinkError::transport("timed out").is_retryable());
        assert!(!BankLinkError::Transport { message: "bad url".into(), retryable: false }
            .is_retryable());
    }

    #[test]
    fn credential_errors_are_not_retryable() {
        assert!(!BankLinkError::NoCredentials.is_retryable());
        assert_eq!(
            BankLinkError::AuthRequired("missing token".into()).category(),
            ErrorCategory::Credentials
        );
    }

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_value(BankLinkError::SessionInvalid("expired".into())).unwrap();
        assert_eq!(json["type"], "SessionInvalid");
        assert_eq!(json["detail"], "expired");
    }
}

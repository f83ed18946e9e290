//! Trust artifacts of the request-authentication protocol
//!
//! Three artifacts are involved: a locally generated RSA keypair, the
//! installation token the server issues for that keypair, and the short-lived
//! session token. Only the first two are ever persisted, together, as a
//! [`CredentialBundle`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// PEM encoded RSA keypair (PKCS#8 private key, SPKI public key)
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPair {
    pub public_key_pem: String,
    pub private_key_pem: String,
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key_pem", &self.public_key_pem)
            .field("private_key_pem", &"<redacted>")
            .finish()
    }
}

/// Unit of persistence: keypair plus the installation token bound to it.
///
/// Absence of a bundle means the client is not installed yet.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialBundle {
    pub key_pair: KeyPair,
    pub installation_token: String,
}

impl fmt::Debug for CredentialBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialBundle")
            .field("key_pair", &self.key_pair)
            .field("installation_token", &"<redacted>")
            .finish()
    }
}

/// Short-lived session credential. Held in memory only.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

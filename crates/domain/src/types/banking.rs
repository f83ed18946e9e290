//! Banking API result types
//!
//! The API wraps every result object in a single-key object naming its type,
//! e.g. `{"MonetaryAccountBank": {...}}`. [`TaggedObject`] keeps that pair;
//! the typed models below are extracted from it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One keyed result object from a response envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedObject {
    /// Object type, e.g. `UserApiKey`, `MonetaryAccountBank`, `Token`
    pub kind: String,
    pub body: Value,
}

/// User the OAuth grant gives access to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiUser {
    pub id: u64,
    pub kind: String,
    pub display_name: Option<String>,
}

/// Monetary amount as transmitted (decimal string + ISO currency)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    pub value: String,
    pub currency: String,
}

impl Amount {
    /// Parse the decimal string into a float signal value.
    pub fn as_f64(&self) -> Option<f64> {
        self.value.trim().parse().ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonetaryAccount {
    pub id: u64,
    /// Account type tag, e.g. `MonetaryAccountBank`, `MonetaryAccountSavings`
    pub kind: String,
    pub description: String,
    pub balance: Amount,
    pub status: Option<String>,
}

/// Balance signal published by the poller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// Stable signal identifier: `"<user_id>-<account_id>"`
    pub key: String,
    /// Human readable title: `"<device> - <description> (<currency>)"`
    pub label: String,
    pub user_id: u64,
    pub account_id: u64,
    pub value: f64,
    pub currency: String,
}

/// OAuth2 token obtained from the authorization-code exchange
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub state: Option<String>,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl std::fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSet")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("state", &self.state)
            .finish()
    }
}

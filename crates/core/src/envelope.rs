//! Response envelope handling
//!
//! Successful responses look like `{"Response": [{"<Kind>": {...}}, ...]}`,
//! failures like `{"Error": [{"error_description_translated": "..."}]}`.

use banklink_domain::{BankLinkError, Result, TaggedObject, UNKNOWN_ERROR_MESSAGE};
use serde_json::Value;

const RESPONSE_FIELD: &str = "Response";
const ERROR_FIELD: &str = "Error";
const ERROR_DESCRIPTION_FIELD: &str = "error_description_translated";
const TOKEN_KIND: &str = "Token";

/// Substrings of server error messages that mean the session is unusable
const AUTH_FAILURE_MARKERS: [&str; 2] = ["authentication", "session"];

/// Unwrapped body of a successful API call
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ApiResponse {
    items: Vec<TaggedObject>,
}

impl ApiResponse {
    pub fn new(items: Vec<TaggedObject>) -> Self {
        Self { items }
    }

    /// Parse a raw JSON body.
    pub fn from_body(body: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| BankLinkError::Decode(format!("response is not JSON: {e}")))?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> Result<Self> {
        let entries = value.get(RESPONSE_FIELD).and_then(Value::as_array).ok_or_else(|| {
            BankLinkError::Decode(format!("response has no `{RESPONSE_FIELD}` list"))
        })?;

        let mut items = Vec::with_capacity(entries.len());
        for entry in entries {
            let object = entry.as_object().ok_or_else(|| {
                BankLinkError::Decode(format!("`{RESPONSE_FIELD}` entry is not an object"))
            })?;
            items.extend(
                object
                    .iter()
                    .map(|(kind, body)| TaggedObject { kind: kind.clone(), body: body.clone() }),
            );
        }

        Ok(Self { items })
    }

    pub fn items(&self) -> &[TaggedObject] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<TaggedObject> {
        self.items
    }

    /// The single result object of a by-id endpoint.
    pub fn single(self) -> Result<TaggedObject> {
        let count = self.items.len();
        let mut items = self.items.into_iter();
        match (items.next(), count) {
            (Some(item), 1) => Ok(item),
            _ => Err(BankLinkError::Decode(format!("expected exactly one result object, got {count}"))),
        }
    }

    /// First object of the given kind.
    pub fn find(&self, kind: &str) -> Option<&TaggedObject> {
        self.items.iter().find(|item| item.kind == kind)
    }

    /// The `Token.token` value of installation and session responses.
    pub fn token(&self) -> Option<&str> {
        self.find(TOKEN_KIND)?.body.get("token")?.as_str()
    }
}

/// Extract the server supplied error message, falling back to a generic one.
pub fn error_description(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .as_ref()
        .and_then(|value| value.get(ERROR_FIELD))
        .and_then(|errors| errors.get(0))
        .and_then(|first| first.get(ERROR_DESCRIPTION_FIELD))
        .and_then(Value::as_str)
        .map_or_else(|| UNKNOWN_ERROR_MESSAGE.to_string(), str::to_string)
}

/// Whether a failed call means the session must be re-established.
pub fn is_authentication_failure(status: u16, message: &str) -> bool {
    if status == 401 {
        return true;
    }
    let lower = message.to_ascii_lowercase();
    AUTH_FAILURE_MARKERS.iter().any(|marker| lower.contains(marker))
}

//! Outgoing request representation
//!
//! A [`RequestEnvelope`] is built per call and frozen into a
//! [`SignedRequest`] once its signature is computed. `SignedRequest` exposes
//! no mutable access, so the header set that was signed is the header set
//! that gets sent.

use std::collections::BTreeMap;

use crate::constants::HEADER_CLIENT_SIGNATURE;

/// Header mapping with unique keys (last write wins)
pub type Headers = BTreeMap<String, String>;

/// Method, path, headers and body of one API call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestEnvelope {
    pub method: String,
    /// Path including the leading slash and any query string
    pub path: String,
    pub headers: Headers,
    pub body: Option<String>,
}

impl RequestEnvelope {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self { method: method.into(), path: path.into(), headers: Headers::new(), body: None }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers.extend(headers);
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// An envelope together with the signature computed over it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    envelope: RequestEnvelope,
    signature: String,
}

impl SignedRequest {
    pub fn new(envelope: RequestEnvelope, signature: String) -> Self {
        Self { envelope, signature }
    }

    pub fn envelope(&self) -> &RequestEnvelope {
        &self.envelope
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Headers to put on the wire: the signed set plus the signature header.
    pub fn wire_headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.envelope
            .headers
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
            .chain(std::iter::once((HEADER_CLIENT_SIGNATURE, self.signature.as_str())))
    }
}

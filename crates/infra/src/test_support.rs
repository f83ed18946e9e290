//! Shared fixtures for unit and integration tests
//!
//! Compiled for this crate's tests and behind the `test-utils` feature.

use std::sync::Arc;

use async_trait::async_trait;
use banklink_core::{build_canonical_string, AccessSecretProvider, CredentialStore};
use banklink_domain::constants::{
    HEADER_CACHE_CONTROL, HEADER_CLIENT_AUTHENTICATION, HEADER_CLIENT_SIGNATURE, HEADER_CONTENT_TYPE,
    HEADER_GEOLOCATION, HEADER_LANGUAGE, HEADER_REGION, HEADER_REQUEST_ID, HEADER_USER_AGENT,
};
use banklink_domain::{ApiConfig, CredentialBundle, Headers, KeyPair, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use once_cell::sync::Lazy;
use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::pkcs8::DecodePublicKey;
use rsa::signature::Verifier;
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use crate::key_manager::{encode_key_pair, KeyManager};
use crate::storage::{CredentialRepository, MemorySecretStore};

/// Header names covered by request signatures
const SIGNED_HEADERS: [&str; 8] = [
    HEADER_CACHE_CONTROL,
    HEADER_USER_AGENT,
    HEADER_LANGUAGE,
    HEADER_REGION,
    HEADER_REQUEST_ID,
    HEADER_GEOLOCATION,
    HEADER_CLIENT_AUTHENTICATION,
    HEADER_CONTENT_TYPE,
];

/// One 2048-bit key shared by every test that does not exercise installation
static FIXTURE_KEY_PAIR: Lazy<KeyPair> = Lazy::new(|| {
    let private_key = RsaPrivateKey::new(&mut rand::thread_rng(), 2048).expect("fixture key");
    encode_key_pair(&private_key).expect("fixture key encoding")
});

pub const FIXTURE_INSTALLATION_TOKEN: &str = "fixture-installation-token";

pub fn fixture_bundle() -> CredentialBundle {
    CredentialBundle {
        key_pair: FIXTURE_KEY_PAIR.clone(),
        installation_token: FIXTURE_INSTALLATION_TOKEN.to_string(),
    }
}

pub fn test_api_config(base_url: &str) -> ApiConfig {
    ApiConfig { base_url: base_url.to_string(), timeout_secs: 10, ..ApiConfig::default() }
}

pub fn empty_store() -> Arc<CredentialRepository> {
    Arc::new(CredentialRepository::new(Arc::new(MemorySecretStore::new())))
}

/// Key manager pre-loaded with the fixture bundle.
pub async fn installed_key_manager(config: &ApiConfig) -> Arc<KeyManager> {
    let store = empty_store();
    store.save(&fixture_bundle()).await.expect("fixture bundle saved");
    Arc::new(KeyManager::from_config(config, store).expect("key manager"))
}

/// Success body carrying a token, as returned by installation and session creation
pub fn token_response(token: &str) -> String {
    format!(r#"{{"Response":[{{"Id":{{"id":1}}}},{{"Token":{{"id":2,"token":"{token}"}}}}]}}"#)
}

/// Mount successful device registration and session creation.
pub async fn mount_handshake(server: &MockServer, session_token: &str) {
    Mock::given(method("POST"))
        .and(path("/v1/device-server"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"Response":[{"Id":{"id":5}}]}"#))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/session-server"))
        .respond_with(ResponseTemplate::new(200).set_body_string(token_response(session_token)))
        .mount(server)
        .await;
}

pub fn verify_signature(public_key_pem: &str, payload: &[u8], signature_b64: &str) -> bool {
    let Ok(public_key) = RsaPublicKey::from_public_key_pem(public_key_pem) else {
        return false;
    };
    let Ok(bytes) = BASE64.decode(signature_b64) else {
        return false;
    };
    let Ok(signature) = Signature::try_from(bytes.as_slice()) else {
        return false;
    };
    VerifyingKey::<Sha256>::new(public_key).verify(payload, &signature).is_ok()
}

/// Rebuild the canonical string of a request as the server received it.
///
/// Header names arrive lower-cased, so the signed names are mapped back.
pub fn canonical_string_of(request: &Request) -> String {
    let mut headers = Headers::new();
    for name in SIGNED_HEADERS {
        if let Some(value) = request.headers.get(name.to_ascii_lowercase().as_str()) {
            headers.insert(name.to_string(), value.to_str().expect("ascii header").to_string());
        }
    }

    let mut path = request.url.path().to_string();
    if let Some(query) = request.url.query() {
        path.push('?');
        path.push_str(query);
    }

    let body = String::from_utf8(request.body.clone()).expect("utf-8 body");
    build_canonical_string(request.method.as_str(), &path, &headers, Some(body.as_str()))
}

/// Check the signature header of a received request against `public_key_pem`.
pub fn request_signature_verifies(request: &Request, public_key_pem: &str) -> bool {
    request
        .headers
        .get(HEADER_CLIENT_SIGNATURE.to_ascii_lowercase().as_str())
        .and_then(|value| value.to_str().ok())
        .is_some_and(|signature| {
            verify_signature(public_key_pem, canonical_string_of(request).as_bytes(), signature)
        })
}

/// Access secret provider with a fixed answer
pub struct FixedAccessSecret(pub Option<String>);

#[async_trait]
impl AccessSecretProvider for FixedAccessSecret {
    async fn access_secret(&self) -> Result<Option<String>> {
        Ok(self.0.clone())
    }
}

//! RSA keypair and installation token management
//!
//! The keypair and the installation token are created together and persisted
//! together. Nothing is written until the server accepted the public key, so
//! a failed installation leaves the client uninstalled rather than holding a
//! key the server does not know.

use std::sync::Arc;

use async_trait::async_trait;
use banklink_core::{CredentialStore, PayloadSigner};
use banklink_domain::{ApiConfig, BankLinkError, CredentialBundle, KeyPair, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::{DecodePrivateKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::signature::{SignatureEncoding, Signer};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, instrument};

use crate::api::HandshakeClient;
use crate::errors::InfraError;

/// A persisted bundle together with its parsed signing key
struct LoadedCredentials {
    bundle: CredentialBundle,
    signing_key: SigningKey<Sha256>,
}

impl LoadedCredentials {
    fn parse(bundle: CredentialBundle) -> Result<Self> {
        let private_key = RsaPrivateKey::from_pkcs8_pem(&bundle.key_pair.private_key_pem)
            .map_err(|e| BankLinkError::Security(format!("stored private key is unreadable: {e}")))?;
        Ok(Self { bundle, signing_key: SigningKey::<Sha256>::new(private_key) })
    }
}

/// Owns the installation's key material.
///
/// Signing only reads the cached key, so any number of requests can sign in
/// parallel. Installation is serialized behind a gate: concurrent callers of
/// [`KeyManager::ensure_key_pair`] cause at most one installation call.
pub struct KeyManager {
    store: Arc<dyn CredentialStore>,
    installer: HandshakeClient,
    key_bits: usize,
    loaded: RwLock<Option<Arc<LoadedCredentials>>>,
    install_gate: Mutex<()>,
}

impl KeyManager {
    pub fn new(store: Arc<dyn CredentialStore>, installer: HandshakeClient, key_bits: usize) -> Self {
        Self { store, installer, key_bits, loaded: RwLock::new(None), install_gate: Mutex::new(()) }
    }

    pub fn from_config(config: &ApiConfig, store: Arc<dyn CredentialStore>) -> Result<Self> {
        Ok(Self::new(store, HandshakeClient::from_config(config)?, config.key_bits))
    }

    /// Warm the cache from the store without installing.
    ///
    /// Returns `None` when the client is not installed.
    pub async fn load(&self) -> Result<Option<CredentialBundle>> {
        Ok(self.cached_or_stored().await?.map(|loaded| loaded.bundle.clone()))
    }

    /// Return the credential bundle, installing first if none exists.
    #[instrument(skip(self))]
    pub async fn ensure_key_pair(&self) -> Result<CredentialBundle> {
        if let Some(loaded) = self.cached().await {
            return Ok(loaded.bundle.clone());
        }

        let _gate = self.install_gate.lock().await;

        // Another caller may have finished installing while we waited.
        if let Some(loaded) = self.cached_or_stored().await? {
            return Ok(loaded.bundle.clone());
        }

        info!(key_bits = self.key_bits, "no credentials stored; creating installation");
        let (key_pair, signing_key) = generate_key_pair(self.key_bits).await?;

        let installation_token =
            self.installer.create_installation(&key_pair.public_key_pem).await.inspect_err(|err| {
                error!(error = %err, "installation failed; client stays uninstalled");
            })?;

        let bundle = CredentialBundle { key_pair, installation_token };
        self.store.save(&bundle).await.inspect_err(|err| {
            error!(error = %err, "persisting credentials failed; client stays uninstalled");
        })?;

        let loaded = Arc::new(LoadedCredentials { bundle: bundle.clone(), signing_key });
        *self.loaded.write().await = Some(loaded);

        info!("installation complete");
        Ok(bundle)
    }

    /// The installation token, or `NoCredentials` when not installed.
    pub async fn installation_token(&self) -> Result<String> {
        Ok(self.credentials().await?.bundle.installation_token.clone())
    }

    pub async fn public_key_pem(&self) -> Result<String> {
        Ok(self.credentials().await?.bundle.key_pair.public_key_pem.clone())
    }

    /// Forget the installation. The next `ensure_key_pair` installs anew.
    #[instrument(skip(self))]
    pub async fn reset_credentials(&self) -> Result<()> {
        let _gate = self.install_gate.lock().await;
        self.store.clear().await?;
        *self.loaded.write().await = None;
        info!("credentials reset");
        Ok(())
    }

    async fn credentials(&self) -> Result<Arc<LoadedCredentials>> {
        self.cached_or_stored().await?.ok_or(BankLinkError::NoCredentials)
    }

    async fn cached(&self) -> Option<Arc<LoadedCredentials>> {
        self.loaded.read().await.clone()
    }

    async fn cached_or_stored(&self) -> Result<Option<Arc<LoadedCredentials>>> {
        if let Some(loaded) = self.cached().await {
            return Ok(Some(loaded));
        }

        let Some(bundle) = self.store.load().await? else {
            return Ok(None);
        };

        debug!("loaded credentials from store");
        let loaded = Arc::new(LoadedCredentials::parse(bundle)?);
        *self.loaded.write().await = Some(Arc::clone(&loaded));
        Ok(Some(loaded))
    }
}

#[async_trait]
impl PayloadSigner for KeyManager {
    async fn sign(&self, payload: &[u8]) -> Result<String> {
        let loaded = self.credentials().await?;
        let signature = loaded
            .signing_key
            .try_sign(payload)
            .map_err(|e| BankLinkError::Security(format!("signing failed: {e}")))?;
        Ok(BASE64.encode(signature.to_bytes()))
    }
}

/// Generate a keypair on the blocking pool and encode it as PEM.
pub async fn generate_key_pair(bits: usize) -> Result<(KeyPair, SigningKey<Sha256>)> {
    tokio::task::spawn_blocking(move || {
        let mut rng = rand::thread_rng();
        let private_key =
            RsaPrivateKey::new(&mut rng, bits).map_err(|e| BankLinkError::from(InfraError::from(e)))?;
        let key_pair = encode_key_pair(&private_key)?;
        Ok((key_pair, SigningKey::<Sha256>::new(private_key)))
    })
    .await
    .map_err(|e| BankLinkError::Internal(format!("key generation task failed: {e}")))?
}

/// PKCS#8 private key and SPKI public key, both PEM with LF line endings.
pub fn encode_key_pair(private_key: &RsaPrivateKey) -> Result<KeyPair> {
    let private_key_pem = private_key
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| BankLinkError::Security(format!("failed to encode private key: {e}")))?
        .to_string();
    let public_key_pem = RsaPublicKey::from(private_key)
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| BankLinkError::Security(format!("failed to encode public key: {e}")))?;
    Ok(KeyPair { public_key_pem, private_key_pem })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rsa::pkcs8::DecodePublicKey;
    use rsa::traits::PublicKeyParts;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::{ApiTransport, ClientHeaders};
    use crate::http::HttpClient;
    use crate::test_support::{empty_store, fixture_bundle, verify_signature};

    fn installer(base_url: &str) -> HandshakeClient {
        let transport = ApiTransport::new(HttpClient::new().unwrap(), base_url, Duration::from_secs(10));
        HandshakeClient::new(transport, ClientHeaders::default(), &ApiConfig::default())
    }

    async fn installation_server(token: &str, expected_calls: u64) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/installation"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                r#"{{"Response":[{{"Id":{{"id":1}}}},{{"Token":{{"id":2,"token":"{token}"}}}}]}}"#
            )))
            .expect(expected_calls)
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn empty_store_installs_a_2048_bit_key_and_persists_the_token() {
        let server = installation_server("install-token", 1).await;
        let store = empty_store();
        let keys = KeyManager::new(store.clone(), installer(&server.uri()), 2048);

        let bundle = keys.ensure_key_pair().await.unwrap();

        assert_eq!(bundle.installation_token, "install-token");
        let requests = server.received_requests().await.unwrap();
        let posted: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        let posted_pem = posted["client_public_key"].as_str().unwrap();
        assert_eq!(posted_pem, bundle.key_pair.public_key_pem);
        let public_key = RsaPublicKey::from_public_key_pem(posted_pem).unwrap();
        assert_eq!(public_key.size() * 8, 2048);

        let persisted = store.load().await.unwrap().expect("bundle persisted");
        assert_eq!(persisted, bundle);
    }

    #[tokio::test]
    async fn ensure_key_pair_is_idempotent() {
        let server = installation_server("install-token", 1).await;
        let keys = KeyManager::new(empty_store(), installer(&server.uri()), 1024);

        let first = keys.ensure_key_pair().await.unwrap();
        let second = keys.ensure_key_pair().await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn concurrent_installs_share_one_installation_call() {
        let server = installation_server("install-token", 1).await;
        let keys = Arc::new(KeyManager::new(empty_store(), installer(&server.uri()), 1024));

        let (a, b) = tokio::join!(keys.ensure_key_pair(), keys.ensure_key_pair());

        assert_eq!(a.unwrap(), b.unwrap());
    }

    #[tokio::test]
    async fn stored_bundle_is_reused_without_network() {
        let server = installation_server("unused", 0).await;
        let store = empty_store();
        store.save(&fixture_bundle()).await.unwrap();
        let keys = KeyManager::new(store, installer(&server.uri()), 2048);

        let bundle = keys.ensure_key_pair().await.unwrap();

        assert_eq!(bundle, fixture_bundle());
        assert_eq!(keys.installation_token().await.unwrap(), fixture_bundle().installation_token);
    }

    #[tokio::test]
    async fn failed_installation_persists_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string(
                r#"{"Error":[{"error_description_translated":"Public key is invalid"}]}"#,
            ))
            .mount(&server)
            .await;
        let store = empty_store();
        let keys = KeyManager::new(store.clone(), installer(&server.uri()), 1024);

        let err = keys.ensure_key_pair().await.unwrap_err();

        assert_eq!(err, BankLinkError::remote(400, "Public key is invalid"));
        assert!(store.load().await.unwrap().is_none());
        assert_eq!(keys.installation_token().await.unwrap_err(), BankLinkError::NoCredentials);
    }

    #[tokio::test]
    async fn signatures_verify_against_the_public_key() {
        let store = empty_store();
        store.save(&fixture_bundle()).await.unwrap();
        let keys = KeyManager::new(store, installer("http://127.0.0.1:9"), 2048);

        let payload = b"GET /v1/user\nCache-Control: no-cache\n\n";
        let signature = keys.sign(payload).await.unwrap();

        let public_key_pem = keys.public_key_pem().await.unwrap();
        assert!(verify_signature(&public_key_pem, payload, &signature));
        assert!(!verify_signature(&public_key_pem, b"tampered", &signature));
    }

    #[tokio::test]
    async fn signing_without_credentials_fails() {
        let keys = KeyManager::new(empty_store(), installer("http://127.0.0.1:9"), 2048);
        assert_eq!(keys.sign(b"payload").await.unwrap_err(), BankLinkError::NoCredentials);
        assert!(keys.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reset_credentials_forgets_the_installation() {
        let store = empty_store();
        store.save(&fixture_bundle()).await.unwrap();
        let keys = KeyManager::new(store.clone(), installer("http://127.0.0.1:9"), 2048);
        assert!(keys.load().await.unwrap().is_some());

        keys.reset_credentials().await.unwrap();

        assert!(store.load().await.unwrap().is_none());
        assert_eq!(keys.installation_token().await.unwrap_err(), BankLinkError::NoCredentials);
    }
}

//! Installation, device registration and session creation calls

use banklink_core::SignatureBuilder;
use banklink_domain::constants::{
    CONTENT_TYPE_JSON, HEADER_CONTENT_TYPE, PATH_DEVICE_SERVER, PATH_INSTALLATION, PATH_SESSION_SERVER,
};
use banklink_domain::{ApiConfig, BankLinkError, RequestEnvelope, Result, SessionToken};
use serde_json::json;
use tracing::{debug, info, instrument};

use super::headers::ClientHeaders;
use super::transport::ApiTransport;

/// Marker in the server message when the device secret is already known
const ALREADY_REGISTERED_MARKER: &str = "already";

/// Low-level handshake client.
///
/// Holds no state: the key manager and the session manager decide when each
/// call happens.
#[derive(Clone)]
pub struct HandshakeClient {
    transport: ApiTransport,
    headers: ClientHeaders,
    device_description: String,
    permitted_ips: Vec<String>,
}

impl HandshakeClient {
    pub fn new(transport: ApiTransport, headers: ClientHeaders, config: &ApiConfig) -> Self {
        Self {
            transport,
            headers,
            device_description: config.device_description.clone(),
            permitted_ips: config.permitted_ips.clone(),
        }
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        Ok(Self::new(ApiTransport::from_config(config)?, ClientHeaders::from_config(config), config))
    }

    pub fn transport(&self) -> &ApiTransport {
        &self.transport
    }

    pub fn headers(&self) -> &ClientHeaders {
        &self.headers
    }

    /// Register a public key and return the installation token.
    ///
    /// Unsigned: no key is registered yet that a signature could be checked
    /// against.
    #[instrument(skip_all)]
    pub async fn create_installation(&self, public_key_pem: &str) -> Result<String> {
        let mut headers = self.headers.build();
        headers.insert(HEADER_CONTENT_TYPE.into(), CONTENT_TYPE_JSON.into());
        let body = json!({ "client_public_key": public_key_pem }).to_string();
        let envelope = RequestEnvelope::new("POST", PATH_INSTALLATION).with_headers(headers).with_body(body);

        let response = self.transport.send_unsigned(&envelope).await?;
        let token = response
            .token()
            .ok_or_else(|| BankLinkError::Decode("installation response carries no token".into()))?;

        info!("installation created");
        Ok(token.to_string())
    }

    /// Bind the access secret to this installation.
    ///
    /// A device that is already registered for the secret counts as success.
    #[instrument(skip_all)]
    pub async fn register_device(
        &self,
        signer: &SignatureBuilder,
        installation_token: &str,
        access_secret: &str,
    ) -> Result<()> {
        let body = json!({
            "description": self.device_description,
            "secret": access_secret,
            "permitted_ips": self.permitted_ips,
        })
        .to_string();
        let envelope = RequestEnvelope::new("POST", PATH_DEVICE_SERVER)
            .with_headers(self.headers.authenticated_json(installation_token))
            .with_body(body);
        let signed = signer.sign_envelope(envelope).await?;

        match self.transport.send_signed(&signed).await {
            Ok(_) => {
                info!("device registered");
                Ok(())
            }
            Err(BankLinkError::RemoteApi { message, .. })
                if message.to_ascii_lowercase().contains(ALREADY_REGISTERED_MARKER) =>
            {
                debug!(%message, "device already registered");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Open a session for the access secret and return its token.
    #[instrument(skip_all)]
    pub async fn create_session(
        &self,
        signer: &SignatureBuilder,
        installation_token: &str,
        access_secret: &str,
    ) -> Result<SessionToken> {
        let body = json!({ "secret": access_secret }).to_string();
        let envelope = RequestEnvelope::new("POST", PATH_SESSION_SERVER)
            .with_headers(self.headers.authenticated_json(installation_token))
            .with_body(body);
        let signed = signer.sign_envelope(envelope).await?;

        let response = self.transport.send_signed(&signed).await?;
        let token = response
            .token()
            .ok_or_else(|| BankLinkError::Decode("session response carries no token".into()))?;

        info!("session created");
        Ok(SessionToken::new(token))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use banklink_core::PayloadSigner;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::http::HttpClient;

    struct FixedSigner;

    #[async_trait]
    impl PayloadSigner for FixedSigner {
        async fn sign(&self, _payload: &[u8]) -> Result<String> {
            Ok("c2lnbmF0dXJl".into())
        }
    }

    fn client(server: &MockServer) -> HandshakeClient {
        let transport = ApiTransport::new(HttpClient::new().unwrap(), server.uri(), Duration::from_secs(5));
        HandshakeClient::new(transport, ClientHeaders::default(), &ApiConfig::default())
    }

    fn signer() -> SignatureBuilder {
        SignatureBuilder::new(Arc::new(FixedSigner))
    }

    fn token_body(token: &str) -> String {
        format!(r#"{{"Response":[{{"Id":{{"id":1}}}},{{"Token":{{"id":2,"token":"{token}"}}}}]}}"#)
    }

    #[tokio::test]
    async fn installation_posts_the_public_key_unsigned() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/installation"))
            .and(body_json(serde_json::json!({"client_public_key": "PEM"})))
            .respond_with(ResponseTemplate::new(200).set_body_string(token_body("install-token")))
            .expect(1)
            .mount(&server)
            .await;

        let token = client(&server).create_installation("PEM").await.unwrap();

        assert_eq!(token, "install-token");
        let requests = server.received_requests().await.unwrap();
        assert!(requests[0].headers.get("x-bunq-client-signature").is_none());
    }

    #[tokio::test]
    async fn installation_without_token_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"Response":[{"Id":{"id":1}}]}"#))
            .mount(&server)
            .await;

        let result = client(&server).create_installation("PEM").await;
        assert!(matches!(result, Err(BankLinkError::Decode(_))));
    }

    #[tokio::test]
    async fn device_registration_is_signed_with_installation_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/device-server"))
            .and(header("X-Bunq-Client-Authentication", "install-token"))
            .and(header("X-Bunq-Client-Signature", "c2lnbmF0dXJl"))
            .and(body_json(serde_json::json!({
                "description": "BankLink",
                "secret": "access",
                "permitted_ips": ["*"],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"Response":[{"Id":{"id":9}}]}"#))
            .expect(1)
            .mount(&server)
            .await;

        client(&server).register_device(&signer(), "install-token", "access").await.unwrap();
    }

    #[tokio::test]
    async fn already_registered_device_is_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/device-server"))
            .respond_with(ResponseTemplate::new(400).set_body_string(
                r#"{"Error":[{"error_description_translated":"Device is already registered."}]}"#,
            ))
            .mount(&server)
            .await;

        let result = client(&server).register_device(&signer(), "install-token", "access").await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn session_failures_carry_the_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/session-server"))
            .respond_with(ResponseTemplate::new(400).set_body_string(
                r#"{"Error":[{"error_description_translated":"Invalid signature"}]}"#,
            ))
            .mount(&server)
            .await;

        let err = client(&server).create_session(&signer(), "install-token", "access").await.unwrap_err();
        assert_eq!(err, BankLinkError::remote(400, "Invalid signature"));
    }

    #[tokio::test]
    async fn session_token_is_extracted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/session-server"))
            .and(body_json(serde_json::json!({"secret": "access"})))
            .respond_with(ResponseTemplate::new(200).set_body_string(token_body("session-token")))
            .mount(&server)
            .await;

        let token = client(&server).create_session(&signer(), "install-token", "access").await.unwrap();
        assert_eq!(token.as_str(), "session-token");
    }
}

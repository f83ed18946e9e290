//! Authenticated API client
//!
//! Every call goes through the same pipeline: access secret from the OAuth
//! collaborator, session from the session manager, client headers, signature
//! over exactly those headers, send with a timeout, normalize the response.

use std::sync::Arc;

use banklink_core::accounts::{parse_monetary_accounts, parse_user, parse_users};
use banklink_core::{AccessSecretProvider, ApiResponse, SessionPhase, SignatureBuilder};
use banklink_domain::constants::PATH_USERS;
use banklink_domain::{
    ApiConfig, ApiUser, BankLinkError, MonetaryAccount, RequestEnvelope, Result, TaggedObject,
};
use tracing::{debug, instrument, warn};

use super::errors::classify_session_error;
use super::handshake::HandshakeClient;
use super::headers::ClientHeaders;
use super::session::SessionManager;
use super::transport::ApiTransport;
use crate::key_manager::KeyManager;

/// Banking API client with one session state machine per instance
#[derive(Clone)]
pub struct ApiClient {
    transport: ApiTransport,
    headers: ClientHeaders,
    signer: SignatureBuilder,
    session: SessionManager,
    auth: Arc<dyn AccessSecretProvider>,
}

impl ApiClient {
    /// Build a client from configuration, signing with `keys`.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the HTTP client cannot be built.
    pub fn new(
        config: &ApiConfig,
        keys: Arc<KeyManager>,
        auth: Arc<dyn AccessSecretProvider>,
    ) -> Result<Self> {
        let handshake = HandshakeClient::from_config(config)?;
        Ok(Self::with_handshake(handshake, keys, auth))
    }

    /// Build a client sharing the transport of an existing handshake client.
    pub fn with_handshake(
        handshake: HandshakeClient,
        keys: Arc<KeyManager>,
        auth: Arc<dyn AccessSecretProvider>,
    ) -> Self {
        let signer = SignatureBuilder::new(keys.clone());
        let transport = handshake.transport().clone();
        let headers = handshake.headers().clone();
        let session = SessionManager::new(keys, handshake, signer.clone());
        Self { transport, headers, signer, session, auth }
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub async fn session_state(&self) -> SessionPhase {
        self.session.state().await
    }

    /// Issue an authenticated, signed call and unwrap the response envelope.
    ///
    /// # Errors
    ///
    /// - `AuthRequired` when no OAuth access secret is stored
    /// - `SessionInvalid` when the server rejected the session; it has been
    ///   dropped and the next call establishes a new one
    /// - `RemoteApi` for any other non-2xx response
    /// - `Transport` for network failures and timeouts
    #[instrument(skip(self, body))]
    pub async fn request(&self, method: &str, path: &str, body: Option<String>) -> Result<ApiResponse> {
        let access_secret = self.access_secret().await?;
        let token = self.session.ensure_session(&access_secret).await?;

        let envelope = match body {
            Some(body) => RequestEnvelope::new(method, path)
                .with_headers(self.headers.authenticated_json(token.as_str()))
                .with_body(body),
            None => RequestEnvelope::new(method, path).with_headers(self.headers.authenticated(token.as_str())),
        };
        let signed = self.signer.sign_envelope(envelope).await?;

        match self.transport.send_signed(&signed).await.map_err(classify_session_error) {
            Err(BankLinkError::SessionInvalid(message)) => {
                warn!(%message, "session rejected by server");
                self.session.invalidate_token(&token).await;
                Err(BankLinkError::SessionInvalid(message))
            }
            other => other,
        }
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse> {
        self.request("GET", path, None).await
    }

    pub async fn list_users(&self) -> Result<Vec<TaggedObject>> {
        Ok(self.get(PATH_USERS).await?.into_vec())
    }

    pub async fn get_user(&self, user_id: u64) -> Result<TaggedObject> {
        self.get(&format!("{PATH_USERS}/{user_id}")).await?.single()
    }

    pub async fn list_invoices(&self, user_id: u64) -> Result<Vec<TaggedObject>> {
        Ok(self.get(&format!("{PATH_USERS}/{user_id}/invoice")).await?.into_vec())
    }

    pub async fn list_events(&self, user_id: u64) -> Result<Vec<TaggedObject>> {
        Ok(self.get(&format!("{PATH_USERS}/{user_id}/event")).await?.into_vec())
    }

    pub async fn list_monetary_accounts(&self, user_id: u64) -> Result<Vec<MonetaryAccount>> {
        let response = self.get(&format!("{PATH_USERS}/{user_id}/monetary-account")).await?;
        Ok(parse_monetary_accounts(response.items()))
    }

    /// Users the grant gives access to, typed.
    pub async fn users(&self) -> Result<Vec<ApiUser>> {
        parse_users(&self.list_users().await?)
    }

    pub async fn user(&self, user_id: u64) -> Result<ApiUser> {
        parse_user(&self.get_user(user_id).await?)
    }

    /// Pair with a freshly authorized account: register the device, open a
    /// new session and list the users the grant covers.
    #[instrument(skip(self))]
    pub async fn pair(&self) -> Result<Vec<ApiUser>> {
        let access_secret = self.access_secret().await?;
        self.session.invalidate().await;
        self.session.ensure_device_registered(&access_secret).await?;
        let users = self.users().await?;
        debug!(count = users.len(), "paired");
        Ok(users)
    }

    async fn access_secret(&self) -> Result<String> {
        self.auth.access_secret().await?.ok_or_else(|| {
            BankLinkError::AuthRequired("no OAuth access token stored; authorize first".into())
        })
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::test_support::{
        installed_key_manager, mount_handshake, test_api_config, FixedAccessSecret,
    };

    async fn client(server: &MockServer, secret: Option<&str>) -> ApiClient {
        let config = test_api_config(&server.uri());
        let keys = installed_key_manager(&config).await;
        ApiClient::new(&config, keys, Arc::new(FixedAccessSecret(secret.map(str::to_string)))).unwrap()
    }

    #[tokio::test]
    async fn missing_access_secret_requires_authorization() {
        let server = MockServer::start().await;
        Mock::given(method("POST")).respond_with(ResponseTemplate::new(500)).expect(0).mount(&server).await;

        let err = client(&server, None).await.list_users().await.unwrap_err();
        assert!(matches!(err, BankLinkError::AuthRequired(_)));
    }

    #[tokio::test]
    async fn requests_carry_the_session_token() {
        let server = MockServer::start().await;
        mount_handshake(&server, "session-token").await;
        Mock::given(method("GET"))
            .and(path("/v1/user/42/monetary-account"))
            .and(header("X-Bunq-Client-Authentication", "session-token"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"Response":[
                    {"MonetaryAccountBank":{"id":1,"description":"Main","balance":{"value":"12.50","currency":"EUR"},"status":"ACTIVE"}},
                    {"MonetaryAccountSavings":{"id":2,"description":"Savings","balance":{"value":"100.00","currency":"EUR"}}}
                ]}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let accounts = client(&server, Some("access")).await.list_monetary_accounts(42).await.unwrap();

        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].description, "Main");
        assert_eq!(accounts[1].kind, "MonetaryAccountSavings");
    }

    #[tokio::test]
    async fn error_body_becomes_remote_api_error() {
        let server = MockServer::start().await;
        mount_handshake(&server, "session-token").await;
        Mock::given(method("GET"))
            .and(path("/v1/user"))
            .respond_with(ResponseTemplate::new(400).set_body_string(
                r#"{"Error":[{"error_description_translated":"Invalid signature"}]}"#,
            ))
            .mount(&server)
            .await;

        let client = client(&server, Some("access")).await;
        let err = client.list_users().await.unwrap_err();

        assert_eq!(err, BankLinkError::remote(400, "Invalid signature"));
        assert_eq!(err.to_string(), "Invalid signature");
        assert_eq!(client.session_state().await, SessionPhase::SessionActive);
    }

    #[tokio::test]
    async fn authentication_failure_invalidates_the_session() {
        let server = MockServer::start().await;
        mount_handshake(&server, "session-token").await;
        Mock::given(method("GET"))
            .and(path("/v1/user"))
            .respond_with(ResponseTemplate::new(401).set_body_string(
                r#"{"Error":[{"error_description_translated":"Insufficient authentication."}]}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server, Some("access")).await;
        let err = client.list_users().await.unwrap_err();

        assert_eq!(err, BankLinkError::SessionInvalid("Insufficient authentication.".into()));
        assert!(err.is_retryable());
        assert_eq!(client.session_state().await, SessionPhase::NoSession);
    }

    #[tokio::test]
    async fn get_user_returns_the_single_object() {
        let server = MockServer::start().await;
        mount_handshake(&server, "session-token").await;
        Mock::given(method("GET"))
            .and(path("/v1/user/7"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"Response":[{"UserPerson":{"id":7,"display_name":"Jane"}}]}"#,
            ))
            .mount(&server)
            .await;

        let user = client(&server, Some("access")).await.user(7).await.unwrap();

        assert_eq!(user.id, 7);
        assert_eq!(user.display_name.as_deref(), Some("Jane"));
    }

    #[tokio::test]
    async fn invoices_and_events_are_listed() {
        let server = MockServer::start().await;
        mount_handshake(&server, "session-token").await;
        Mock::given(method("GET"))
            .and(path("/v1/user/7/invoice"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"Response":[{"Invoice":{"id":1}}]}"#))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/user/7/event"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"Response":[{"Event":{"id":1}},{"Event":{"id":2}}]}"#,
            ))
            .mount(&server)
            .await;

        let client = client(&server, Some("access")).await;

        assert_eq!(client.list_invoices(7).await.unwrap()[0].kind, "Invoice");
        assert_eq!(client.list_events(7).await.unwrap().len(), 2);
    }
}

//! Authorization-code exchange with the OAuth2 token endpoint

use std::time::Duration;

use banklink_domain::{BankLinkError, OAuthSettings, Result, TokenSet};
use reqwest::Method;
use tracing::{info, instrument, warn};
use url::Url;

use crate::errors::InfraError;
use crate::http::HttpClient;

pub struct OAuthCodeExchanger {
    settings: OAuthSettings,
    http: HttpClient,
}

impl OAuthCodeExchanger {
    pub fn new(settings: OAuthSettings, http: HttpClient) -> Self {
        Self { settings, http }
    }

    pub fn from_settings(settings: OAuthSettings, timeout: Duration) -> Result<Self> {
        Ok(Self::new(settings, HttpClient::builder().timeout(timeout).build()?))
    }

    /// Browser URL where the user grants access.
    pub fn authorization_url(&self, state: &str) -> Result<Url> {
        let mut url = Url::parse(&self.settings.authorization_url).map_err(|e| {
            BankLinkError::Config(format!("invalid OAuth authorization URL: {e}"))
        })?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.settings.client_id)
            .append_pair("redirect_uri", &self.settings.redirect_url)
            .append_pair("state", state);
        Ok(url)
    }

    /// Exchange an authorization code for an access token.
    ///
    /// The token endpoint takes its parameters in the query string of an
    /// empty POST.
    #[instrument(skip_all)]
    pub async fn exchange_code(&self, code: &str) -> Result<TokenSet> {
        if self.settings.client_id.is_empty() {
            return Err(BankLinkError::Config("oauth.client_id is not set".into()));
        }

        let mut url = Url::parse(&self.settings.token_url)
            .map_err(|e| BankLinkError::Config(format!("invalid OAuth token URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("grant_type", "authorization_code")
            .append_pair("client_id", &self.settings.client_id)
            .append_pair("client_secret", &self.settings.client_secret)
            .append_pair("code", code)
            .append_pair("redirect_uri", &self.settings.redirect_url);

        let response = self.http.send(self.http.request(Method::POST, url)).await?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "token exchange rejected");
            return Err(BankLinkError::AuthRequired(format!("Invalid Response ({})", status.as_u16())));
        }

        let tokens: TokenSet =
            response.json().await.map_err(|e| BankLinkError::from(InfraError::from(e)))?;
        info!(token_type = %tokens.token_type, "authorization code exchanged");
        Ok(tokens)
    }
}

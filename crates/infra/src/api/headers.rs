//! Client headers sent with every API call

use banklink_domain::constants::{
    CACHE_CONTROL_NO_CACHE, CONTENT_TYPE_JSON, GEOLOCATION_PLACEHOLDER, HEADER_CACHE_CONTROL,
    HEADER_CLIENT_AUTHENTICATION, HEADER_CONTENT_TYPE, HEADER_GEOLOCATION, HEADER_LANGUAGE,
    HEADER_REGION, HEADER_REQUEST_ID, HEADER_USER_AGENT,
};
use banklink_domain::{ApiConfig, Headers};
use uuid::Uuid;

/// Static part of the client header set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientHeaders {
    user_agent: String,
    language: String,
    region: String,
}

impl ClientHeaders {
    pub fn from_config(config: &ApiConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            language: config.language.clone(),
            region: config.region.clone(),
        }
    }

    /// Client headers with a fresh request id.
    pub fn build(&self) -> Headers {
        let mut headers = Headers::new();
        headers.insert(HEADER_CACHE_CONTROL.into(), CACHE_CONTROL_NO_CACHE.into());
        headers.insert(HEADER_USER_AGENT.into(), self.user_agent.clone());
        headers.insert(HEADER_LANGUAGE.into(), self.language.clone());
        headers.insert(HEADER_REGION.into(), self.region.clone());
        headers.insert(HEADER_REQUEST_ID.into(), Uuid::new_v4().to_string());
        headers.insert(HEADER_GEOLOCATION.into(), GEOLOCATION_PLACEHOLDER.into());
        headers
    }

    /// Client headers authenticated with an installation or session token.
    pub fn authenticated(&self, token: &str) -> Headers {
        let mut headers = self.build();
        headers.insert(HEADER_CLIENT_AUTHENTICATION.into(), token.to_string());
        headers
    }

    /// Authenticated headers for a request carrying a JSON body.
    pub fn authenticated_json(&self, token: &str) -> Headers {
        let mut headers = self.authenticated(token);
        headers.insert(HEADER_CONTENT_TYPE.into(), CONTENT_TYPE_JSON.into());
        headers
    }
}

impl Default for ClientHeaders {
    fn default() -> Self {
        Self::from_config(&ApiConfig::default())
    }
}

//! Sends request envelopes to the remote API

use std::time::Duration;

use banklink_core::ApiResponse;
use banklink_domain::{ApiConfig, BankLinkError, RequestEnvelope, Result, SignedRequest};
use reqwest::Method;
use tracing::debug;

use super::errors::parse_response;
use crate::errors::InfraError;
use crate::http::HttpClient;

/// Base URL plus HTTP client, bounded by a per-call timeout
#[derive(Clone)]
pub struct ApiTransport {
    http: HttpClient,
    base_url: String,
    timeout: Duration,
}

impl ApiTransport {
    pub fn new(http: HttpClient, base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url, timeout }
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let http = HttpClient::builder().timeout(timeout).max_attempts(config.max_attempts).build()?;
        Ok(Self::new(http, config.base_url.clone(), timeout))
    }

    /// Send a request that carries no signature (installation only).
    pub async fn send_unsigned(&self, envelope: &RequestEnvelope) -> Result<ApiResponse> {
        let headers =
            envelope.headers.iter().map(|(name, value)| (name.as_str(), value.as_str()));
        self.dispatch(envelope, headers).await
    }

    /// Send a signed request with exactly the headers that were signed.
    pub async fn send_signed(&self, request: &SignedRequest) -> Result<ApiResponse> {
        self.dispatch(request.envelope(), request.wire_headers()).await
    }

    async fn dispatch<'a>(
        &self,
        envelope: &RequestEnvelope,
        headers: impl Iterator<Item = (&'a str, &'a str)>,
    ) -> Result<ApiResponse> {
        let method = Method::from_bytes(envelope.method.to_ascii_uppercase().as_bytes())
            .map_err(|_| BankLinkError::Internal(format!("invalid HTTP method {}", envelope.method)))?;
        let url = format!("{}{}", self.base_url, envelope.path);

        let mut builder = self.http.request(method, &url);
        for (name, value) in headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &envelope.body {
            builder = builder.body(body.clone());
        }

        let response = match tokio::time::timeout(self.timeout, self.http.send(builder)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(BankLinkError::transport(format!(
                    "request timed out after {}s",
                    self.timeout.as_secs()
                )))
            }
        };

        let status = response.status();
        let body = response.text().await.map_err(|err| BankLinkError::from(InfraError::from(err)))?;
        debug!(method = %envelope.method, path = %envelope.path, %status, "API call completed");

        parse_response(status, &body)
    }
}

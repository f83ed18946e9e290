use std::sync::Arc;

use banklink_domain::{Headers, RequestEnvelope, Result, SignedRequest};
use tracing::trace;

use super::canonical::build_canonical_string;
use crate::ports::PayloadSigner;

/// Computes request signatures over the canonical string.
///
/// Stateless apart from the shared signer, so one builder can serve any
/// number of concurrent requests.
#[derive(Clone)]
pub struct SignatureBuilder {
    signer: Arc<dyn PayloadSigner>,
}

impl SignatureBuilder {
    pub fn new(signer: Arc<dyn PayloadSigner>) -> Self {
        Self { signer }
    }

    pub fn build_canonical_string(
        &self,
        method: &str,
        path: &str,
        headers: &Headers,
        body: Option<&str>,
    ) -> String {
        build_canonical_string(method, path, headers, body)
    }

    /// Signature header value for the given request parts.
    pub async fn sign(
        &self,
        method: &str,
        path: &str,
        headers: &Headers,
        body: Option<&str>,
    ) -> Result<String> {
        let canonical = build_canonical_string(method, path, headers, body);
        trace!(method, path, header_count = headers.len(), "signing canonical request");
        self.signer.sign(canonical.as_bytes()).await
    }

    /// Sign an envelope and freeze it; the result cannot be mutated anymore.
    pub async fn sign_envelope(&self, envelope: RequestEnvelope) -> Result<SignedRequest> {
        let signature =
            self.sign(&envelope.method, &envelope.path, &envelope.headers, envelope.body.as_deref())
                .await?;
        Ok(SignedRequest::new(envelope, signature))
    }
}

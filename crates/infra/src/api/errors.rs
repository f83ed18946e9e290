//! Normalization of API responses into results

use banklink_core::{error_description, is_authentication_failure, ApiResponse};
use banklink_domain::{BankLinkError, Result};
use reqwest::StatusCode;

/// Turn a status code and raw body into the envelope or a `RemoteApi` error.
pub fn parse_response(status: StatusCode, body: &str) -> Result<ApiResponse> {
    if status.is_success() {
        ApiResponse::from_body(body)
    } else {
        Err(map_status_error(status, body))
    }
}

/// Error for a non-2xx response, carrying the server message verbatim.
pub fn map_status_error(status: StatusCode, body: &str) -> BankLinkError {
    BankLinkError::remote(status.as_u16(), error_description(body))
}

/// Re-classify a remote rejection of an authenticated call.
///
/// Authentication failures become `SessionInvalid` so callers know the next
/// request will establish a new session; anything else passes through.
pub fn classify_session_error(error: BankLinkError) -> BankLinkError {
    match error {
        BankLinkError::RemoteApi { status, message } if is_authentication_failure(status, &message) => {
            BankLinkError::SessionInvalid(message)
        }
        other => other,
    }
}

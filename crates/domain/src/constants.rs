//! Application constants
//!
//! Wire-level names and defaults for the banking API.

// Remote API
pub const DEFAULT_API_URL: &str = "https://api.bunq.com";
pub const DEFAULT_OAUTH_TOKEN_URL: &str = "https://api.oauth.bunq.com/v1/token";
pub const DEFAULT_OAUTH_AUTHORIZATION_URL: &str = "https://oauth.bunq.com/auth";

pub const PATH_INSTALLATION: &str = "/v1/installation";
pub const PATH_DEVICE_SERVER: &str = "/v1/device-server";
pub const PATH_SESSION_SERVER: &str = "/v1/session-server";
pub const PATH_USERS: &str = "/v1/user";

// Request headers
pub const HEADER_CACHE_CONTROL: &str = "Cache-Control";
pub const HEADER_USER_AGENT: &str = "User-Agent";
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";
pub const HEADER_LANGUAGE: &str = "X-Bunq-Language";
pub const HEADER_REGION: &str = "X-Bunq-Region";
pub const HEADER_REQUEST_ID: &str = "X-Bunq-Client-Request-Id";
pub const HEADER_GEOLOCATION: &str = "X-Bunq-Geolocation";
pub const HEADER_CLIENT_AUTHENTICATION: &str = "X-Bunq-Client-Authentication";
pub const HEADER_CLIENT_SIGNATURE: &str = "X-Bunq-Client-Signature";

pub const CACHE_CONTROL_NO_CACHE: &str = "no-cache";
pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const DEFAULT_USER_AGENT: &str = "BankLink/0.1";
pub const DEFAULT_LOCALE: &str = "en_US";
pub const GEOLOCATION_PLACEHOLDER: &str = "0 0 0 0 000";

// Handshake defaults
pub const DEFAULT_DEVICE_DESCRIPTION: &str = "BankLink";
pub const PERMIT_ALL_IPS: &str = "*";
pub const DEFAULT_KEY_BITS: usize = 2048;

// Timing
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 300;

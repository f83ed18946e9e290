//! OAuth2 collaborator: code exchange and the stored access secret

pub mod exchanger;
pub mod stored;

pub use exchanger::OAuthCodeExchanger;
pub use stored::{StoredAccessSecret, OAUTH_TOKEN_KEY};

//! Domain types and models

pub mod banking;
pub mod credentials;
pub mod request;

pub use banking::{AccountBalance, Amount, ApiUser, MonetaryAccount, TaggedObject, TokenSet};
pub use credentials::{CredentialBundle, KeyPair, SessionToken};
pub use request::{Headers, RequestEnvelope, SignedRequest};

//! Banking API client
//!
//! Layers, bottom-up:
//!
//! - [`transport`]: sends envelopes with a timeout and unwraps responses
//! - [`handshake`]: installation, device registration, session creation
//! - [`session`]: session state machine with single-flight establishment
//! - [`client`]: authenticated, signed domain operations
//! - [`poller`]: periodic balance polling on top of the client

pub mod client;
pub mod errors;
pub mod handshake;
pub mod headers;
pub mod poller;
pub mod session;
pub mod transport;

pub use client::ApiClient;
pub use handshake::HandshakeClient;
pub use headers::ClientHeaders;
pub use poller::{AccountPoller, PollerSettings};
pub use session::SessionManager;
pub use transport::ApiTransport;

//! # BankLink App
//!
//! Host layer - context wiring and the commands behind the `banklink` binary.
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture

pub mod commands;
pub mod context;
pub mod sink;

pub use commands::{run, run_poller, Command, USAGE};
pub use context::AppContext;
pub use sink::LoggingBalanceSink;

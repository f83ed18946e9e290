//! Request signing: canonical string construction and signature building

pub mod builder;
pub mod canonical;

pub use builder::SignatureBuilder;
pub use canonical::build_canonical_string;

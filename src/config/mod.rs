//! # Configuration
//!
//! Provider-level settings loaded from environment variables.
//!
//! - `provider`: endpoints, credentials, logging and not-found policy
//! - `timeouts`: per-operation timeouts

pub mod provider;
pub mod timeouts;

pub use provider::ProviderConfig;
pub use timeouts::OperationTimeouts;

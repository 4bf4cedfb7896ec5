//! # Users Service Core
//!
//! Core business logic for the message-driven users service. This crate
//! contains the domain entities, the credential store abstraction, the
//! token lifecycle manager, the account command handlers, and the
//! dispatch/delivery machinery that turns at-least-once message delivery
//! into exactly-once-effective account mutations.

pub mod dispatch;
pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::*;
pub use errors::*;
pub use repositories::*;
pub use services::*;

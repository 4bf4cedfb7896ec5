//! Token lifecycle manager
//!
//! Issues, resolves and supersedes the single-use verification tokens
//! that authorize email verification and password resets. Consumption
//! itself happens inside the credential store, atomically with the
//! authorized effect.

mod config;
mod service;


pub use config::TokenServiceConfig;
pub use service::{IssuedToken, TokenService};

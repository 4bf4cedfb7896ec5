//! Account command handlers
//!
//! One method per inbound command pattern. Handlers receive validated
//! payload data, express every mutation as a single compare-and-swap or
//! transactional store operation, and never decide retry policy - they
//! just return the typed failure and let the delivery layer classify it.

mod config;
mod service;
mod traits;

#[cfg(test)]
mod tests;

pub use config::AccountServiceConfig;
pub use service::AccountService;
pub use traits::{EmailNotifier, PasswordHasher};

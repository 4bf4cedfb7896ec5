//! Infrastructure layer for the users service
//!
//! Concrete implementations of the core collaborator traits:
//!
//! - `database` - MySQL credential store backed by SQLx
//! - `hashing` - bcrypt password hashing
//! - `email` - HTTP email gateway client
//! - `broker` - broker adapters, including the in-process queue used by
//!   tests and local development

pub mod broker;
pub mod database;
pub mod email;
pub mod hashing;

pub use broker::InMemoryQueue;
pub use database::{DatabasePool, MySqlCredentialStore};
pub use email::HttpEmailNotifier;
pub use hashing::BcryptPasswordHasher;

//! Storage abstractions owned by the domain layer.

pub mod store;

pub use store::{CredentialStore, InMemoryCredentialStore};

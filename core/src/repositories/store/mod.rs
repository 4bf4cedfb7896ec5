//! Credential store boundary.
//!
//! One trait owns all durable account and token state. The atomic
//! consume-and-apply operations span both entities, which is exactly why
//! they live on a single store boundary instead of per-entity
//! repositories: a token may authorize its effect at most once, and the
//! effect must commit in the same transaction as the consumption.

#[path = "trait.rs"]
mod trait_;

mod memory;


pub use memory::InMemoryCredentialStore;
pub use trait_::CredentialStore;

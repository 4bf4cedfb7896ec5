//! MySQL implementations of the persistence traits

pub mod credential_store_impl;

pub use credential_store_impl::MySqlCredentialStore;

//! # Users Service Shared
//!
//! Cross-crate configuration structs, reply envelope types and validation
//! utilities shared by the core, infra and consumer crates.

pub mod config;
pub mod types;
pub mod utils;

//! Shared wire types

pub mod response;

pub use response::{ErrorBody, Reply};

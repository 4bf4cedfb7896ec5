//! Outbound email delivery

pub mod gateway;

pub use gateway::HttpEmailNotifier;

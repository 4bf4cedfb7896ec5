//! Broker adapters
//!
//! `memory` provides an in-process queue with the same ack/nack/requeue
//! contract as the durable broker, used by tests and local development.

pub mod memory;


pub use memory::{DeadLetter, InMemoryQueue};

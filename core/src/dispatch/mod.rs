//! Message dispatch and delivery guarantees
//!
//! `router` maps inbound patterns to handlers; `delivery` wraps each
//! handling cycle with the ack/nack/dead-letter discipline that turns
//! at-least-once delivery into exactly-once-effective handling.

pub mod delivery;
pub mod envelope;
pub mod payloads;
pub mod router;
pub mod source;

#[cfg(test)]
mod tests;

pub use delivery::{DeadLetterSink, DeliveryGuarantee};
pub use envelope::{patterns, Acknowledge, CommandEnvelope, InboundCommand};
pub use router::Router;
pub use source::CommandSource;

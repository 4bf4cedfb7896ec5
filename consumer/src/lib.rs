//! Consumer wiring for the users service
//!
//! Builds the pattern registry over the account service and runs one of
//! the two transport bindings: the queue worker loop with manual
//! acknowledgment, or the TCP JSON-lines RPC listener where a reply is
//! the implicit acknowledgment.

pub mod config;
pub mod routes;
pub mod rpc;
pub mod worker;

pub use config::{AppConfig, TransportBinding};
pub use routes::build_router;
pub use rpc::RpcServer;
pub use worker::QueueWorker;

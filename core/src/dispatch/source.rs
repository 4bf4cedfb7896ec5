//! Inbound command source capability

use async_trait::async_trait;

use crate::errors::CommandResult;

use super::envelope::InboundCommand;

/// Source of inbound deliveries for the queue-driven worker
///
/// `next` blocks until a delivery arrives; `None` means the source is
/// closed and the worker should drain out.
#[async_trait]
pub trait CommandSource: Send + Sync {
    /// Wait for the next delivery
    async fn next(&self) -> CommandResult<Option<InboundCommand>>;
}

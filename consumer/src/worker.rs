//! Queue-driven worker loop

use std::sync::Arc;

use users_core::dispatch::{CommandSource, DeliveryGuarantee, Router};
use users_core::errors::CommandResult;

/// Worker consuming deliveries from a command source
///
/// Each delivery runs one handling cycle through the delivery guarantee
/// layer, which owns the ack/nack/dead-letter decision. The loop ends
/// when the source closes or a shutdown signal arrives; the in-flight
/// cycle always drains first.
pub struct QueueWorker {
    source: Arc<dyn CommandSource>,
    router: Router,
    delivery: DeliveryGuarantee,
}

impl QueueWorker {
    /// Create a worker over the given source and registry
    pub fn new(source: Arc<dyn CommandSource>, router: Router, delivery: DeliveryGuarantee) -> Self {
        Self {
            source,
            router,
            delivery,
        }
    }

    /// Consume deliveries until the source closes
    pub async fn run(&self) -> CommandResult<()> {
        while let Some(command) = self.source.next().await? {
            tracing::debug!(
                pattern = %command.pattern,
                delivery_count = command.delivery_count,
                "delivery received"
            );
            // Fire-and-forget callers never read the reply
            let _ = self.delivery.process(&self.router, command).await;
        }
        tracing::info!("command source closed, worker draining out");
        Ok(())
    }

    /// Consume deliveries until the source closes or ctrl-c arrives
    pub async fn run_until_shutdown(&self) -> CommandResult<()> {
        tokio::select! {
            result = self.run() => result,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!(event = "shutdown", "shutdown signal received");
                Ok(())
            }
        }
    }
}

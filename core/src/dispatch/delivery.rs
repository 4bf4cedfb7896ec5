//! Delivery guarantee layer
//!
//! The single place where error classification maps to an acknowledgment
//! action:
//!
//! - success: ack
//! - permanent failure: ack, surface the typed error in the reply
//! - transient failure below the retry bound: backoff, nack with requeue
//! - transient failure at the bound: publish to the dead-letter
//!   destination, then ack the original
//!
//! Requeueing a permanent failure would spin forever; acking a transient
//! one would silently drop a legitimate mutation.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};

use users_shared::config::RetryConfig;
use users_shared::types::Reply;

use crate::errors::{CommandError, CommandResult};

use super::envelope::InboundCommand;
use super::router::Router;

/// Destination for messages that exhausted their retries
#[async_trait]
pub trait DeadLetterSink: Send + Sync {
    /// Publish the failed command for later inspection
    async fn publish(
        &self,
        pattern: &str,
        payload: &Value,
        error: &CommandError,
    ) -> CommandResult<()>;
}

/// Wraps each handling cycle with retry, backoff and dead-lettering
pub struct DeliveryGuarantee {
    retry: RetryConfig,
    dead_letter: Arc<dyn DeadLetterSink>,
}

impl DeliveryGuarantee {
    /// Creates a new delivery guarantee layer
    pub fn new(retry: RetryConfig, dead_letter: Arc<dyn DeadLetterSink>) -> Self {
        Self { retry, dead_letter }
    }

    /// Run one handling cycle for a queue delivery
    ///
    /// Always consumes the command's ack handle, and always produces a
    /// reply for callers that expect one.
    pub async fn process(&self, router: &Router, command: InboundCommand) -> Reply {
        let InboundCommand {
            pattern,
            payload,
            correlation_id,
            delivery_count,
            ack,
        } = command;

        let outcome = self.route_bounded(router, &pattern, payload.clone()).await;

        match outcome {
            Ok(()) => {
                tracing::info!(pattern = %pattern, event = "command_completed", "command completed");
                if let Err(err) = ack.ack().await {
                    // The broker will redeliver; handlers are idempotent
                    tracing::error!(pattern = %pattern, error = %err, "ack failed");
                }
                Reply::ok().with_correlation_id(correlation_id)
            }
            Err(err) if err.is_transient() => {
                let reply = Reply::from(&err).with_correlation_id(correlation_id);
                if delivery_count >= self.retry.max_attempts {
                    tracing::error!(
                        pattern = %pattern,
                        kind = err.kind(),
                        delivery_count,
                        event = "command_dead_lettered",
                        "retries exhausted, dead-lettering"
                    );
                    match self.dead_letter.publish(&pattern, &payload, &err).await {
                        Ok(()) => {
                            if let Err(ack_err) = ack.ack().await {
                                tracing::error!(pattern = %pattern, error = %ack_err, "ack failed");
                            }
                        }
                        Err(dl_err) => {
                            // Keep the message rather than lose it
                            tracing::error!(
                                pattern = %pattern,
                                error = %dl_err,
                                "dead-letter publish failed, requeueing"
                            );
                            if let Err(nack_err) = ack.nack(true).await {
                                tracing::error!(pattern = %pattern, error = %nack_err, "nack failed");
                            }
                        }
                    }
                } else {
                    let backoff_ms = self.retry.backoff_ms(delivery_count);
                    tracing::warn!(
                        pattern = %pattern,
                        kind = err.kind(),
                        delivery_count,
                        backoff_ms,
                        event = "command_requeued",
                        "transient failure, requeueing"
                    );
                    sleep(Duration::from_millis(backoff_ms)).await;
                    if let Err(nack_err) = ack.nack(true).await {
                        tracing::error!(pattern = %pattern, error = %nack_err, "nack failed");
                    }
                }
                reply
            }
            Err(err) => {
                tracing::warn!(
                    pattern = %pattern,
                    kind = err.kind(),
                    event = "command_rejected",
                    "permanent failure"
                );
                if let Err(ack_err) = ack.ack().await {
                    tracing::error!(pattern = %pattern, error = %ack_err, "ack failed");
                }
                Reply::from(&err).with_correlation_id(correlation_id)
            }
        }
    }

    /// Run one handling cycle for the connection-oriented RPC binding
    ///
    /// No manual ack primitive exists here, so the layer degrades to
    /// "respond with the error, no redelivery".
    pub async fn process_rpc(
        &self,
        router: &Router,
        pattern: &str,
        payload: Value,
        correlation_id: Option<String>,
    ) -> Reply {
        match self.route_bounded(router, pattern, payload).await {
            Ok(()) => Reply::ok().with_correlation_id(correlation_id),
            Err(err) => {
                tracing::warn!(
                    pattern = %pattern,
                    kind = err.kind(),
                    event = "rpc_command_failed",
                    "command failed"
                );
                Reply::from(&err).with_correlation_id(correlation_id)
            }
        }
    }

    async fn route_bounded(
        &self,
        router: &Router,
        pattern: &str,
        payload: Value,
    ) -> CommandResult<()> {
        let bound = Duration::from_secs(self.retry.handler_timeout_secs);
        match timeout(bound, router.route(pattern, payload)).await {
            Ok(result) => result,
            Err(_) => Err(CommandError::Timeout),
        }
    }
}

//! TCP JSON-lines RPC binding
//!
//! One request envelope per line, one reply per line. Writing the reply
//! is the acknowledgment; there is no redelivery on this path, so the
//! delivery layer degrades transient failures to error replies.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use users_core::dispatch::{CommandEnvelope, DeliveryGuarantee, Router};
use users_shared::config::RpcServerConfig;
use users_shared::types::Reply;

/// JSON-lines RPC listener
pub struct RpcServer {
    config: RpcServerConfig,
    router: Arc<Router>,
    delivery: Arc<DeliveryGuarantee>,
}

impl RpcServer {
    /// Create a listener over the given registry
    pub fn new(config: RpcServerConfig, router: Arc<Router>, delivery: Arc<DeliveryGuarantee>) -> Self {
        Self {
            config,
            router,
            delivery,
        }
    }

    /// Accept connections until ctrl-c arrives
    pub async fn run_until_shutdown(&self) -> anyhow::Result<()> {
        let address = self.config.bind_address();
        let listener = TcpListener::bind(&address).await?;
        tracing::info!(%address, event = "rpc_listening", "rpc listener started");

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, peer) = accepted?;
                    tracing::debug!(%peer, "connection accepted");
                    let router = Arc::clone(&self.router);
                    let delivery = Arc::clone(&self.delivery);
                    tokio::spawn(async move {
                        handle_connection(stream, router, delivery).await;
                    });
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!(event = "shutdown", "shutdown signal received");
                    return Ok(());
                }
            }
        }
    }
}

async fn handle_connection(stream: TcpStream, router: Arc<Router>, delivery: Arc<DeliveryGuarantee>) {
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                tracing::debug!(error = %err, "connection read failed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let reply = match serde_json::from_str::<CommandEnvelope>(&line) {
            Ok(envelope) => {
                delivery
                    .process_rpc(
                        &router,
                        &envelope.pattern,
                        envelope.payload,
                        envelope.correlation_id,
                    )
                    .await
            }
            Err(err) => Reply::err("MALFORMED_PAYLOAD", err.to_string()),
        };

        let mut encoded = match serde_json::to_vec(&reply) {
            Ok(encoded) => encoded,
            Err(err) => {
                tracing::error!(error = %err, "reply encoding failed");
                continue;
            }
        };
        encoded.push(b'\n');
        if write_half.write_all(&encoded).await.is_err() {
            break;
        }
    }
}

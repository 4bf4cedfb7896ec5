//! In-process queue with broker acknowledgment semantics
//!
//! Deliveries must be acked or nacked exactly once; a nack with requeue
//! puts the message back at the tail with its delivery count bumped, so
//! redelivery and dead-lettering behave the same as against the durable
//! broker.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use users_core::dispatch::{Acknowledge, CommandEnvelope, CommandSource, InboundCommand};
use users_core::dispatch::delivery::DeadLetterSink;
use users_core::errors::{CommandError, CommandResult};

/// A message parked on the dead-letter destination
#[derive(Debug, Clone)]
pub struct DeadLetter {
    /// Pattern of the failed command
    pub pattern: String,
    /// Payload as originally delivered
    pub payload: Value,
    /// Error kind that exhausted the retries
    pub kind: String,
}

struct Queued {
    envelope: CommandEnvelope,
    delivery_count: u32,
}

#[derive(Default)]
struct QueueState {
    ready: VecDeque<Queued>,
    dead: Vec<DeadLetter>,
    closed: bool,
}

struct Inner {
    state: Mutex<QueueState>,
    notify: Notify,
}

/// In-process queue for tests and local development
#[derive(Clone)]
pub struct InMemoryQueue {
    inner: Arc<Inner>,
}

impl InMemoryQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(QueueState::default()),
                notify: Notify::new(),
            }),
        }
    }

    /// Enqueue a fresh delivery
    pub fn enqueue(&self, envelope: CommandEnvelope) {
        let mut state = self.inner.state.lock().unwrap();
        state.ready.push_back(Queued {
            envelope,
            delivery_count: 1,
        });
        drop(state);
        self.inner.notify.notify_one();
    }

    /// Close the queue; `next` returns `None` once drained
    pub fn close(&self) {
        self.inner.state.lock().unwrap().closed = true;
        self.inner.notify.notify_one();
    }

    /// Number of messages waiting for delivery
    pub fn pending(&self) -> usize {
        self.inner.state.lock().unwrap().ready.len()
    }

    /// Snapshot of the dead-letter destination
    pub fn dead_letters(&self) -> Vec<DeadLetter> {
        self.inner.state.lock().unwrap().dead.clone()
    }
}

impl Default for InMemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandSource for InMemoryQueue {
    async fn next(&self) -> CommandResult<Option<InboundCommand>> {
        loop {
            {
                let mut state = self.inner.state.lock().unwrap();
                if let Some(queued) = state.ready.pop_front() {
                    let Queued {
                        envelope,
                        delivery_count,
                    } = queued;
                    return Ok(Some(InboundCommand {
                        ack: Box::new(QueueAck {
                            inner: Arc::clone(&self.inner),
                            envelope: envelope.clone(),
                            delivery_count,
                        }),
                        pattern: envelope.pattern,
                        payload: envelope.payload,
                        correlation_id: envelope.correlation_id,
                        delivery_count,
                    }));
                }
                if state.closed {
                    return Ok(None);
                }
            }
            self.inner.notify.notified().await;
        }
    }
}

#[async_trait]
impl DeadLetterSink for InMemoryQueue {
    async fn publish(
        &self,
        pattern: &str,
        payload: &Value,
        error: &CommandError,
    ) -> CommandResult<()> {
        let mut state = self.inner.state.lock().unwrap();
        state.dead.push(DeadLetter {
            pattern: pattern.to_string(),
            payload: payload.clone(),
            kind: error.kind().to_string(),
        });
        Ok(())
    }
}

struct QueueAck {
    inner: Arc<Inner>,
    envelope: CommandEnvelope,
    delivery_count: u32,
}

#[async_trait]
impl Acknowledge for QueueAck {
    async fn ack(self: Box<Self>) -> CommandResult<()> {
        // The message was already removed on delivery
        Ok(())
    }

    async fn nack(self: Box<Self>, requeue: bool) -> CommandResult<()> {
        if requeue {
            let mut state = self.inner.state.lock().unwrap();
            state.ready.push_back(Queued {
                envelope: self.envelope,
                delivery_count: self.delivery_count + 1,
            });
            drop(state);
            self.inner.notify.notify_one();
        }
        Ok(())
    }
}

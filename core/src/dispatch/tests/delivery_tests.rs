//! Delivery guarantee layer tests
//!
//! Time-dependent cases run with the tokio clock paused so backoff
//! sleeps and handler timeouts resolve instantly.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use users_shared::config::RetryConfig;

use crate::dispatch::delivery::{DeadLetterSink, DeliveryGuarantee};
use crate::dispatch::envelope::{Acknowledge, InboundCommand};
use crate::dispatch::router::Router;
use crate::errors::{CommandError, CommandResult};

#[derive(Debug, Clone, PartialEq, Eq)]
enum AckEvent {
    Acked,
    Nacked { requeue: bool },
}

#[derive(Clone, Default)]
struct AckRecorder {
    events: Arc<Mutex<Vec<AckEvent>>>,
}

impl AckRecorder {
    fn handle(&self) -> Box<dyn Acknowledge> {
        Box::new(RecordingAck {
            events: Arc::clone(&self.events),
        })
    }

    fn events(&self) -> Vec<AckEvent> {
        self.events.lock().unwrap().clone()
    }
}

struct RecordingAck {
    events: Arc<Mutex<Vec<AckEvent>>>,
}

#[async_trait]
impl Acknowledge for RecordingAck {
    async fn ack(self: Box<Self>) -> CommandResult<()> {
        self.events.lock().unwrap().push(AckEvent::Acked);
        Ok(())
    }

    async fn nack(self: Box<Self>, requeue: bool) -> CommandResult<()> {
        self.events.lock().unwrap().push(AckEvent::Nacked { requeue });
        Ok(())
    }
}

#[derive(Clone, Default)]
struct RecordingDeadLetter {
    published: Arc<Mutex<Vec<(String, String)>>>,
    fail: bool,
}

impl RecordingDeadLetter {
    fn failing() -> Self {
        Self {
            published: Arc::default(),
            fail: true,
        }
    }

    fn published(&self) -> Vec<(String, String)> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeadLetterSink for RecordingDeadLetter {
    async fn publish(
        &self,
        pattern: &str,
        _payload: &Value,
        error: &CommandError,
    ) -> CommandResult<()> {
        if self.fail {
            return Err(CommandError::Unavailable {
                message: "dead-letter destination down".to_string(),
            });
        }
        self.published
            .lock()
            .unwrap()
            .push((pattern.to_string(), error.kind().to_string()));
        Ok(())
    }
}

#[derive(Deserialize)]
struct OutcomePayload {
    outcome: String,
}

fn router() -> Router {
    let mut router = Router::new();
    router.register("mutate", |payload: OutcomePayload| async move {
        match payload.outcome.as_str() {
            "ok" => Ok(()),
            "not-found" => Err(CommandError::NotFound),
            "storage" => Err(CommandError::Storage {
                message: "connection reset".to_string(),
            }),
            "hang" => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            }
            other => panic!("unexpected outcome {other}"),
        }
    });
    router
}

fn retry_config() -> RetryConfig {
    RetryConfig {
        max_attempts: 3,
        base_backoff_ms: 10,
        max_backoff_ms: 100,
        handler_timeout_secs: 5,
    }
}

fn command(outcome: &str, delivery_count: u32, ack: Box<dyn Acknowledge>) -> InboundCommand {
    InboundCommand {
        pattern: "mutate".to_string(),
        payload: json!({ "outcome": outcome }),
        correlation_id: Some("corr-1".to_string()),
        delivery_count,
        ack,
    }
}

fn guarantee(sink: &RecordingDeadLetter) -> DeliveryGuarantee {
    DeliveryGuarantee::new(retry_config(), Arc::new(sink.clone()))
}

#[tokio::test]
async fn test_success_acks() {
    let recorder = AckRecorder::default();
    let sink = RecordingDeadLetter::default();
    let layer = guarantee(&sink);

    let reply = layer
        .process(&router(), command("ok", 1, recorder.handle()))
        .await;

    assert!(reply.ok);
    assert_eq!(reply.correlation_id.as_deref(), Some("corr-1"));
    assert_eq!(recorder.events(), vec![AckEvent::Acked]);
    assert!(sink.published().is_empty());
}

#[tokio::test]
async fn test_permanent_failure_acks_without_requeue() {
    let recorder = AckRecorder::default();
    let sink = RecordingDeadLetter::default();
    let layer = guarantee(&sink);

    let reply = layer
        .process(&router(), command("not-found", 1, recorder.handle()))
        .await;

    assert!(!reply.ok);
    assert_eq!(reply.error.unwrap().kind, "NOT_FOUND");
    assert_eq!(recorder.events(), vec![AckEvent::Acked]);
    assert!(sink.published().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_transient_failure_below_bound_requeues() {
    let recorder = AckRecorder::default();
    let sink = RecordingDeadLetter::default();
    let layer = guarantee(&sink);

    let reply = layer
        .process(&router(), command("storage", 1, recorder.handle()))
        .await;

    assert!(!reply.ok);
    assert_eq!(reply.error.unwrap().kind, "STORAGE_ERROR");
    assert_eq!(recorder.events(), vec![AckEvent::Nacked { requeue: true }]);
    assert!(sink.published().is_empty());
}

#[tokio::test]
async fn test_transient_failure_at_bound_dead_letters() {
    let recorder = AckRecorder::default();
    let sink = RecordingDeadLetter::default();
    let layer = guarantee(&sink);

    let reply = layer
        .process(&router(), command("storage", 3, recorder.handle()))
        .await;

    assert!(!reply.ok);
    assert_eq!(recorder.events(), vec![AckEvent::Acked]);
    assert_eq!(
        sink.published(),
        vec![("mutate".to_string(), "STORAGE_ERROR".to_string())]
    );
}

#[tokio::test]
async fn test_dead_letter_publish_failure_keeps_message() {
    let recorder = AckRecorder::default();
    let sink = RecordingDeadLetter::failing();
    let layer = guarantee(&sink);

    layer
        .process(&router(), command("storage", 3, recorder.handle()))
        .await;

    assert_eq!(recorder.events(), vec![AckEvent::Nacked { requeue: true }]);
}

#[tokio::test(start_paused = true)]
async fn test_handler_timeout_is_transient() {
    let recorder = AckRecorder::default();
    let sink = RecordingDeadLetter::default();
    let layer = guarantee(&sink);

    let reply = layer
        .process(&router(), command("hang", 1, recorder.handle()))
        .await;

    assert!(!reply.ok);
    assert_eq!(reply.error.unwrap().kind, "TIMEOUT");
    assert_eq!(recorder.events(), vec![AckEvent::Nacked { requeue: true }]);
}

#[tokio::test]
async fn test_unknown_pattern_is_permanent() {
    let recorder = AckRecorder::default();
    let sink = RecordingDeadLetter::default();
    let layer = guarantee(&sink);

    let reply = layer
        .process(
            &router(),
            InboundCommand {
                pattern: "no-such-pattern".to_string(),
                payload: json!({}),
                correlation_id: None,
                delivery_count: 1,
                ack: recorder.handle(),
            },
        )
        .await;

    assert!(!reply.ok);
    assert_eq!(reply.error.unwrap().kind, "UNKNOWN_PATTERN");
    assert_eq!(recorder.events(), vec![AckEvent::Acked]);
}

#[tokio::test]
async fn test_malformed_payload_is_permanent() {
    let recorder = AckRecorder::default();
    let sink = RecordingDeadLetter::default();
    let layer = guarantee(&sink);

    let reply = layer
        .process(
            &router(),
            InboundCommand {
                pattern: "mutate".to_string(),
                payload: json!({ "unexpected": true }),
                correlation_id: None,
                delivery_count: 1,
                ack: recorder.handle(),
            },
        )
        .await;

    assert!(!reply.ok);
    assert_eq!(reply.error.unwrap().kind, "MALFORMED_PAYLOAD");
    assert_eq!(recorder.events(), vec![AckEvent::Acked]);
}

#[tokio::test]
async fn test_rpc_reports_error_without_retry() {
    let sink = RecordingDeadLetter::default();
    let layer = guarantee(&sink);

    let reply = layer
        .process_rpc(
            &router(),
            "mutate",
            json!({ "outcome": "storage" }),
            Some("corr-9".to_string()),
        )
        .await;

    assert!(!reply.ok);
    assert_eq!(reply.error.unwrap().kind, "STORAGE_ERROR");
    assert_eq!(reply.correlation_id.as_deref(), Some("corr-9"));
    assert!(sink.published().is_empty());
}

#[tokio::test]
async fn test_rpc_success_echoes_correlation_id() {
    let sink = RecordingDeadLetter::default();
    let layer = guarantee(&sink);

    let reply = layer
        .process_rpc(
            &router(),
            "mutate",
            json!({ "outcome": "ok" }),
            Some("corr-2".to_string()),
        )
        .await;

    assert!(reply.ok);
    assert_eq!(reply.correlation_id.as_deref(), Some("corr-2"));
}

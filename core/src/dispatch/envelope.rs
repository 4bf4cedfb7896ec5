//! Inbound command envelope and acknowledgment capability

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::CommandResult;

/// Recognized command patterns
pub mod patterns {
    pub const UPDATE_USER: &str = "update-user";
    pub const CHANGE_USERNAME: &str = "change-username";
    pub const CHANGE_PASSWORD: &str = "change-password";
    pub const CHANGE_EMAIL: &str = "change-email";
    pub const SEND_EMAIL_VERIFICATION_TOKEN: &str = "send-email-verification-token";
    pub const VERIFY_EMAIL: &str = "verify-email";
    pub const FORGOT_PASSWORD: &str = "forgot-password";
    pub const RESET_PASSWORD: &str = "reset-password";
}

/// Wire shape of an inbound message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandEnvelope {
    /// Command pattern name
    pub pattern: String,

    /// Pattern-specific payload
    #[serde(default)]
    pub payload: Value,

    /// Caller-supplied correlation id, echoed in the reply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

/// Broker acknowledgment capability
///
/// Both methods consume the handle: an acknowledgment happens at most
/// once per delivery, and the handle must not outlive the handling
/// cycle.
#[async_trait]
pub trait Acknowledge: Send {
    /// Remove the message from the broker
    async fn ack(self: Box<Self>) -> CommandResult<()>;

    /// Negatively acknowledge; `requeue` asks the broker to redeliver
    async fn nack(self: Box<Self>, requeue: bool) -> CommandResult<()>;
}

/// One in-flight delivery: envelope contents plus its ack handle
///
/// Owned by the dispatch cycle from arrival to ack/nack, never persisted.
pub struct InboundCommand {
    /// Command pattern name
    pub pattern: String,

    /// Decoded payload
    pub payload: Value,

    /// Caller-supplied correlation id
    pub correlation_id: Option<String>,

    /// How many times the broker has delivered this message (1-based)
    pub delivery_count: u32,

    /// Acknowledgment handle, consumed exactly once
    pub ack: Box<dyn Acknowledge>,
}

impl std::fmt::Debug for InboundCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InboundCommand")
            .field("pattern", &self.pattern)
            .field("correlation_id", &self.correlation_id)
            .field("delivery_count", &self.delivery_count)
            .finish_non_exhaustive()
    }
}

//! Reply envelope for request-reply command patterns

use serde::{Deserialize, Serialize};

/// Structured error body carried in a failed reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable error code for programmatic handling
    pub kind: String,
    /// Human-readable error message
    pub message: String,
}

/// Reply envelope returned to the calling service
///
/// Every command produces a reply with the same shape: `{ ok, error? }`,
/// plus the correlation id of the inbound envelope when one was supplied.
/// Fire-and-forget callers simply never read it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    /// Whether the command took effect
    pub ok: bool,

    /// Error details (present on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,

    /// Correlation id echoed from the inbound envelope
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl Reply {
    /// Create a successful reply
    pub fn ok() -> Self {
        Self {
            ok: true,
            error: None,
            correlation_id: None,
        }
    }

    /// Create a failed reply
    pub fn err(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(ErrorBody {
                kind: kind.into(),
                message: message.into(),
            }),
            correlation_id: None,
        }
    }

    /// Attach the correlation id from the inbound envelope
    pub fn with_correlation_id(mut self, correlation_id: Option<String>) -> Self {
        self.correlation_id = correlation_id;
        self
    }
}

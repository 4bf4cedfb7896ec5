//! Error taxonomy for command handling.
//!
//! Every failure a command can produce is a `CommandError`. The split
//! that matters operationally is transient vs permanent: the delivery
//! guarantee layer is the only place that maps the classification to an
//! ack/nack/dead-letter action, so handlers stay pure with respect to
//! retry policy.

use thiserror::Error;

use users_shared::types::Reply;

/// Failures produced while routing or executing a command
#[derive(Error, Debug)]
pub enum CommandError {
    /// No handler is registered for the inbound pattern
    #[error("unknown command pattern: {pattern}")]
    UnknownPattern { pattern: String },

    /// Payload failed to decode or validate against the handler's shape
    #[error("malformed payload: {message}")]
    MalformedPayload { message: String },

    /// The referenced account does not exist
    #[error("account not found")]
    NotFound,

    /// A unique identity field is already owned by another account
    #[error("{field} already in use")]
    Conflict { field: &'static str },

    /// Presented credential did not verify. Deliberately uniform: it
    /// never reveals whether the account exists or the password differs.
    #[error("invalid credentials")]
    InvalidCredential,

    /// Token is absent, expired, or already consumed
    #[error("invalid or expired token")]
    InvalidOrExpiredToken,

    /// Optimistic concurrency check failed; a retry re-reads current state
    #[error("account version moved during update")]
    VersionConflict,

    /// The credential store failed or is unreachable
    #[error("storage error: {message}")]
    Storage { message: String },

    /// An external collaborator (notifier, broker) is unavailable
    #[error("service unavailable: {message}")]
    Unavailable { message: String },

    /// The handling cycle exceeded its configured time bound
    #[error("command timed out")]
    Timeout,
}

impl CommandError {
    /// Stable error code surfaced in replies and logs
    pub fn kind(&self) -> &'static str {
        match self {
            CommandError::UnknownPattern { .. } => "UNKNOWN_PATTERN",
            CommandError::MalformedPayload { .. } => "MALFORMED_PAYLOAD",
            CommandError::NotFound => "NOT_FOUND",
            CommandError::Conflict { .. } => "CONFLICT",
            CommandError::InvalidCredential => "INVALID_CREDENTIAL",
            CommandError::InvalidOrExpiredToken => "INVALID_OR_EXPIRED_TOKEN",
            CommandError::VersionConflict => "VERSION_CONFLICT",
            CommandError::Storage { .. } => "STORAGE_ERROR",
            CommandError::Unavailable { .. } => "UNAVAILABLE",
            CommandError::Timeout => "TIMEOUT",
        }
    }

    /// Whether a retry can succeed without the caller changing anything.
    ///
    /// Transient failures are requeued with backoff; permanent failures
    /// are acknowledged and surfaced to the caller.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CommandError::VersionConflict
                | CommandError::Storage { .. }
                | CommandError::Unavailable { .. }
                | CommandError::Timeout
        )
    }
}

impl From<&CommandError> for Reply {
    fn from(err: &CommandError) -> Self {
        Reply::err(err.kind(), err.to_string())
    }
}

/// Convenience alias used throughout the core crate
pub type CommandResult<T> = Result<T, CommandError>;

//! Mock collaborators for account service tests

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::errors::{CommandError, CommandResult};
use crate::services::account::traits::{EmailNotifier, PasswordHasher};

/// Transparent "hash" that keeps tests readable
pub struct MockPasswordHasher;

impl PasswordHasher for MockPasswordHasher {
    fn hash(&self, password: &str) -> CommandResult<String> {
        Ok(format!("hashed:{}", password))
    }

    fn verify(&self, password: &str, password_hash: &str) -> CommandResult<bool> {
        Ok(password_hash == format!("hashed:{}", password))
    }
}

/// A message captured by the recording notifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    pub email: String,
    pub raw_token: String,
    pub kind: &'static str,
}

/// Records every notification instead of sending it
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Arc<Mutex<Vec<SentMail>>>,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            sent: Arc::default(),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }

    fn record(&self, email: &str, raw_token: &str, kind: &'static str) -> CommandResult<()> {
        if self.fail {
            return Err(CommandError::Unavailable {
                message: "mail gateway down".to_string(),
            });
        }
        self.sent.lock().unwrap().push(SentMail {
            email: email.to_string(),
            raw_token: raw_token.to_string(),
            kind,
        });
        Ok(())
    }
}

#[async_trait]
impl EmailNotifier for RecordingNotifier {
    async fn send_email_verification(&self, email: &str, raw_token: &str) -> CommandResult<()> {
        self.record(email, raw_token, "email-verification")
    }

    async fn send_password_reset(&self, email: &str, raw_token: &str) -> CommandResult<()> {
        self.record(email, raw_token, "password-reset")
    }
}

//! Payload shapes for the recognized command patterns
//!
//! Field names stay camelCase on the wire, matching the calling
//! services.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::account::ProfileFields;

/// `update-user`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserPayload {
    pub account_id: Uuid,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

impl UpdateUserPayload {
    /// Extract the profile fields carried by this update
    pub fn profile(&self) -> ProfileFields {
        ProfileFields {
            display_name: self.display_name.clone(),
            bio: self.bio.clone(),
        }
    }
}

/// `change-username`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeUsernamePayload {
    pub account_id: Uuid,
    pub new_username: String,
}

/// `change-password`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordPayload {
    pub account_id: Uuid,
    pub old_password_proof: String,
    pub new_password: String,
}

/// `change-email`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEmailPayload {
    pub account_id: Uuid,
    pub new_email: String,
}

/// `send-email-verification-token`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailVerificationTokenPayload {
    pub account_id: Uuid,
}

/// `verify-email`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyEmailPayload {
    pub raw_token: String,
}

/// `forgot-password`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordPayload {
    pub email: String,
}

/// `reset-password`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordPayload {
    pub raw_token: String,
    pub new_password: String,
}

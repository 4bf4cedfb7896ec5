//! Account entity representing a registered user account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Non-identity profile fields carried by the update-user command
///
/// All fields are optional; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileFields {
    /// Display name shown to other users
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Free-form biography text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

impl ProfileFields {
    /// Whether the update carries no fields at all
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none() && self.bio.is_none()
    }
}

/// Account entity representing a registered user
///
/// The `version` counter backs optimistic concurrency: every committed
/// mutation increments it, and the store rejects writes whose expected
/// version no longer matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier for the account (immutable)
    pub id: Uuid,

    /// Unique username (mutable)
    pub username: String,

    /// Unique email address (mutable)
    pub email: String,

    /// Whether the current email address has been verified
    pub email_verified: bool,

    /// One-way hash of the account password
    pub password_hash: String,

    /// Display name shown to other users
    pub display_name: Option<String>,

    /// Free-form biography text
    pub bio: Option<String>,

    /// Optimistic concurrency version, incremented on every mutation
    pub version: i64,

    /// Timestamp when the account was created
    pub created_at: DateTime<Utc>,

    /// Timestamp when the account was last updated
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Creates a new Account instance
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username,
            email,
            email_verified: false,
            password_hash,
            display_name: None,
            bio: None,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies a partial profile update, returning whether anything changed
    pub fn apply_profile(&mut self, fields: &ProfileFields) -> bool {
        let mut changed = false;
        if let Some(display_name) = &fields.display_name {
            if self.display_name.as_deref() != Some(display_name.as_str()) {
                self.display_name = Some(display_name.clone());
                changed = true;
            }
        }
        if let Some(bio) = &fields.bio {
            if self.bio.as_deref() != Some(bio.as_str()) {
                self.bio = Some(bio.clone());
                changed = true;
            }
        }
        if changed {
            self.touch();
        }
        changed
    }

    /// Sets a new username
    pub fn set_username(&mut self, username: String) {
        self.username = username;
        self.touch();
    }

    /// Sets a new email address; verification is reset until re-proven
    pub fn set_email(&mut self, email: String) {
        self.email = email;
        self.email_verified = false;
        self.touch();
    }

    /// Marks the current email address as verified
    pub fn mark_email_verified(&mut self) {
        self.email_verified = true;
        self.touch();
    }

    /// Rotates the password hash
    pub fn set_password_hash(&mut self, password_hash: String) {
        self.password_hash = password_hash;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

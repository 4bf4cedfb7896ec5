//! Account service configuration

/// Policy knobs for the account command handlers
#[derive(Debug, Clone)]
pub struct AccountServiceConfig {
    /// Minimum accepted password length
    pub password_min_length: usize,
}

impl Default for AccountServiceConfig {
    fn default() -> Self {
        Self {
            password_min_length: 8,
        }
    }
}

//! bcrypt password hashing

use bcrypt::{hash, verify, DEFAULT_COST};

use users_core::errors::{CommandError, CommandResult};
use users_core::services::PasswordHasher;

/// bcrypt-backed password hasher
pub struct BcryptPasswordHasher {
    cost: u32,
}

impl BcryptPasswordHasher {
    /// Create a hasher with the default work factor
    pub fn new() -> Self {
        Self { cost: DEFAULT_COST }
    }

    /// Create a hasher with an explicit work factor
    ///
    /// Low factors are only acceptable in tests.
    pub fn with_cost(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptPasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordHasher for BcryptPasswordHasher {
    fn hash(&self, password: &str) -> CommandResult<String> {
        hash(password, self.cost).map_err(|e| CommandError::Storage {
            message: format!("password hashing failed: {}", e),
        })
    }

    fn verify(&self, password: &str, password_hash: &str) -> CommandResult<bool> {
        verify(password, password_hash).map_err(|e| CommandError::Storage {
            message: format!("password verification failed: {}", e),
        })
    }
}

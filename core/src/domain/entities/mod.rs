//! Domain entities representing durable account state.

pub mod account;
pub mod verification_token;

// Re-export commonly used types
pub use account::{Account, ProfileFields};
pub use verification_token::{TokenPurpose, VerificationToken};

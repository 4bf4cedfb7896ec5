//! Identity field validation utilities

use once_cell::sync::Lazy;
use regex::Regex;

/// Pragmatic email shape check: local part, one `@`, dotted domain.
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("valid email regex")
});

/// Usernames: 3-32 characters from a conservative charset.
static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._-]{3,32}$").expect("valid username regex"));

/// Check if an email address has a plausible shape
pub fn is_valid_email(email: &str) -> bool {
    email.len() <= 254 && EMAIL_RE.is_match(email)
}

/// Check if a username satisfies the charset and length policy
pub fn is_valid_username(username: &str) -> bool {
    USERNAME_RE.is_match(username)
}

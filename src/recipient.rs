//! Recipient resolution
//!
//! Clients may send either a bare username (`john.doe`) or a full
//! address on the configured domain (`john.doe@example.com`). Both
//! resolve to the same validated [`Recipient`].

use crate::username::{InvalidUsername, Username, validate_username};
use thiserror::Error;

/// A validated recipient on the configured domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    username: Username,
    address: String,
}

impl Recipient {
    #[must_use]
    pub const fn username(&self) -> &Username {
        &self.username
    }

    /// The full `username@domain` address sent upstream.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecipientError {
    #[error("No valid `recipient` param found")]
    Missing,

    #[error(transparent)]
    Invalid(#[from] InvalidUsername),
}

/// Cut `recipient` at the first occurrence of `@domain`.
///
/// Matching is case-sensitive. Anything that is not on `domain` is
/// returned unchanged and left for validation to reject.
#[must_use]
pub fn strip_domain<'a>(recipient: &'a str, domain: &str) -> &'a str {
    let suffix = format!("@{domain}");
    recipient
        .find(&suffix)
        .map_or(recipient, |pos| &recipient[..pos])
}

/// Resolve the raw `recipient` query value into a full address.
///
/// # Errors
///
/// [`RecipientError::Missing`] when the value is absent or blank,
/// [`RecipientError::Invalid`] when the username fails validation.
pub fn resolve_recipient(raw: Option<&str>, domain: &str) -> Result<Recipient, RecipientError> {
    let trimmed = raw.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return Err(RecipientError::Missing);
    }

    let username = validate_username(strip_domain(trimmed, domain))?;
    let address = format!("{username}@{domain}");
    Ok(Recipient { username, address })
}

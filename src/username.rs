//! Mailbox username validation
//!
//! Strictly validates the local part of an inbox address before it is
//! handed to a mail provider. Rules run in a fixed order and the first
//! failing rule decides the reported [`Rejection`].

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

static DISALLOWED_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9._+-]").expect("hardcoded regex"));
static ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-zA-Z0-9]").expect("hardcoded regex"));
static CONSECUTIVE_DOTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.{2,}").expect("hardcoded regex"));
static LEADING_SYMBOL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[._+-]").expect("hardcoded regex"));
static TRAILING_SYMBOL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[._+-]$").expect("hardcoded regex"));
static ALL_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("hardcoded regex"));
static LEADING_LETTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z]").expect("hardcoded regex"));
static TRAILING_LETTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-zA-Z]$").expect("hardcoded regex"));

/// Usernames that pass every structural rule but must never be served.
/// Compared ASCII case-insensitively.
pub const BLOCKED_USERNAMES: &[&str] = &["akunlama.com"];

/// Why a candidate username was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    /// Nothing left after trimming whitespace.
    Empty,
    /// Contains a character outside `[A-Za-z0-9._+-]`.
    DisallowedChars,
    /// Contains no letter or digit at all.
    NoAlphanumeric,
    /// Contains `..` somewhere.
    ConsecutiveDots,
    /// Starts or ends with one of `._+-`.
    BoundaryNotAlnum,
    /// Consists of digits only.
    PureNumeric,
    /// Neither the first nor the last character is a letter.
    NoAlphaBoundary,
    /// Matches an entry of [`BLOCKED_USERNAMES`].
    BlockedLiteral,
}

impl Rejection {
    /// Stable machine-readable reason code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Empty => "EMPTY",
            Self::DisallowedChars => "DISALLOWED_CHARS",
            Self::NoAlphanumeric => "NO_ALPHANUMERIC",
            Self::ConsecutiveDots => "CONSECUTIVE_DOTS",
            Self::BoundaryNotAlnum => "BOUNDARY_NOT_ALNUM",
            Self::PureNumeric => "PURE_NUMERIC",
            Self::NoAlphaBoundary => "NO_ALPHA_BOUNDARY",
            Self::BlockedLiteral => "BLOCKED_LITERAL",
        }
    }

    /// Human-readable explanation, suitable for logs.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Empty => "username cannot be empty",
            Self::DisallowedChars => "username contains disallowed characters",
            Self::NoAlphanumeric => "username must contain at least one alphanumeric character",
            Self::ConsecutiveDots => "username cannot contain consecutive dots",
            Self::BoundaryNotAlnum => {
                "username must start and end with an alphanumeric character"
            }
            Self::PureNumeric => "username must not be purely numeric",
            Self::NoAlphaBoundary => {
                "username must start or end with an alphabetical character"
            }
            Self::BlockedLiteral => "username is not allowed",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A username that failed validation.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Invalid username ({reason}): {}", reason.message())]
pub struct InvalidUsername {
    pub reason: Rejection,
}

impl From<Rejection> for InvalidUsername {
    fn from(reason: Rejection) -> Self {
        Self { reason }
    }
}

/// A validated mailbox local part.
///
/// Only obtainable through [`validate_username`], so holding one means
/// every rule has passed. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validate a candidate username.
///
/// Surrounding whitespace is trimmed; otherwise the value is returned
/// exactly as given, case included.
///
/// # Errors
///
/// Returns [`InvalidUsername`] carrying the first rule that failed.
pub fn validate_username(candidate: &str) -> Result<Username, InvalidUsername> {
    let username = candidate.trim();

    if username.is_empty() {
        return Err(Rejection::Empty.into());
    }
    if DISALLOWED_CHARS.is_match(username) {
        return Err(Rejection::DisallowedChars.into());
    }
    if !ALPHANUMERIC.is_match(username) {
        return Err(Rejection::NoAlphanumeric.into());
    }
    if CONSECUTIVE_DOTS.is_match(username) {
        return Err(Rejection::ConsecutiveDots.into());
    }
    if LEADING_SYMBOL.is_match(username) || TRAILING_SYMBOL.is_match(username) {
        return Err(Rejection::BoundaryNotAlnum.into());
    }
    if ALL_DIGITS.is_match(username) {
        return Err(Rejection::PureNumeric.into());
    }
    if !(LEADING_LETTER.is_match(username) || TRAILING_LETTER.is_match(username)) {
        return Err(Rejection::NoAlphaBoundary.into());
    }
    if BLOCKED_USERNAMES
        .iter()
        .any(|blocked| username.eq_ignore_ascii_case(blocked))
    {
        return Err(Rejection::BlockedLiteral.into());
    }

    Ok(Username(username.to_string()))
}

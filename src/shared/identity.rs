//! User Identity
//!
//! `UserId` is the key the registry routes on. It is opaque to the core: the
//! credential service may issue UUIDs or short handles, and both are accepted
//! as long as they are syntactically valid.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Maximum length of a user identifier in bytes
pub const MAX_USER_ID_LEN: usize = 128;

/// Reason a string was refused as a user identifier
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidUserId {
    #[error("user id is empty")]
    Empty,
    #[error("user id exceeds {MAX_USER_ID_LEN} characters")]
    TooLong,
    #[error("user id contains invalid character {0:?}")]
    InvalidChar(char),
}

/// Validated user identifier
///
/// Allowed characters are ASCII alphanumerics plus `-`, `_`, `.`, `:` and `@`,
/// which covers UUIDs, numeric ids and email-like handles.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Parse and validate a user identifier
    pub fn parse(raw: impl Into<String>) -> Result<Self, InvalidUserId> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(InvalidUserId::Empty);
        }
        if raw.len() > MAX_USER_ID_LEN {
            return Err(InvalidUserId::TooLong);
        }
        if let Some(bad) = raw.chars().find(|c| !is_id_char(*c)) {
            return Err(InvalidUserId::InvalidChar(bad));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':' | '@')
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for UserId {
    type Error = InvalidUserId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Authenticated identity attached to a connection
///
/// Produced by the principal resolver during the handshake and immutable for
/// the lifetime of the connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: UserId,
    pub display_name: String,
}

impl Principal {
    pub fn new(user_id: UserId, display_name: impl Into<String>) -> Self {
        Self {
            user_id,
            display_name: display_name.into(),
        }
    }
}

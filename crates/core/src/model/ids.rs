use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UserIdError {
    #[error("user id cannot be empty")]
    Empty,
}

/// Opaque identifier for an authenticated user.
///
/// The value is minted by the identity provider and is never interpreted
/// beyond equality; it scopes every profile and set record.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a `UserId` from the raw provider string.
    ///
    /// # Errors
    ///
    /// Returns `UserIdError::Empty` if the value is empty or whitespace-only.
    pub fn new(raw: impl Into<String>) -> Result<Self, UserIdError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(UserIdError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the underlying identity string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = UserIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_rejects_empty() {
        assert_eq!(UserId::new("").unwrap_err(), UserIdError::Empty);
        assert_eq!(UserId::new("   ").unwrap_err(), UserIdError::Empty);
    }

    #[test]
    fn user_id_trims_whitespace() {
        let id = UserId::new("  uid-123  ").unwrap();
        assert_eq!(id.as_str(), "uid-123");
    }

    #[test]
    fn user_id_display_and_from_str() {
        let id: UserId = "abc".parse().unwrap();
        assert_eq!(id.to_string(), "abc");
        assert_eq!(id, UserId::new("abc").unwrap());
    }
}

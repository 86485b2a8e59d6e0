use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::card::Flashcard;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SetNameError {
    #[error("set name cannot be empty")]
    Empty,
}

//
// ─── SET NAME ──────────────────────────────────────────────────────────────────
//

/// Validated name of a flashcard set.
///
/// Set records are keyed by `(user, name)`, so the name doubles as the set's
/// identity within one user's namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SetName(String);

impl SetName {
    /// Creates a set name, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns `SetNameError::Empty` if the name is empty or whitespace-only.
    pub fn new(name: impl Into<String>) -> Result<Self, SetNameError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(SetNameError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//
// ─── FLASHCARD SET ─────────────────────────────────────────────────────────────
//

/// A named, ordered collection of flashcards owned by one user.
///
/// Built at save time and immutable afterwards; re-saving the same name
/// replaces the whole set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashcardSet {
    name: SetName,
    cards: Vec<Flashcard>,
    created_at: DateTime<Utc>,
}

impl FlashcardSet {
    #[must_use]
    pub fn new(name: SetName, cards: Vec<Flashcard>, created_at: DateTime<Utc>) -> Self {
        Self {
            name,
            cards,
            created_at,
        }
    }

    #[must_use]
    pub fn name(&self) -> &SetName {
        &self.name
    }

    #[must_use]
    pub fn cards(&self) -> &[Flashcard] {
        &self.cards
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

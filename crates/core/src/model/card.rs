use serde::{Deserialize, Serialize};

//
// ─── CARD ──────────────────────────────────────────────────────────────────────
//

/// A front/back text pair shown to the learner.
///
/// Cards have positional identity: within a set a card is addressed by its
/// index, not by a stable key. The stored shape carries no presentation
/// state; transient study state lives in [`crate::model::FlipCard`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    front: String,
    back: String,
}

impl Flashcard {
    /// Creates a card from its two faces.
    #[must_use]
    pub fn new(front: impl Into<String>, back: impl Into<String>) -> Self {
        Self {
            front: front.into(),
            back: back.into(),
        }
    }

    #[must_use]
    pub fn front(&self) -> &str {
        &self.front
    }

    #[must_use]
    pub fn back(&self) -> &str {
        &self.back
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

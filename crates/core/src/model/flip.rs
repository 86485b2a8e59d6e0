use crate::model::card::Flashcard;

//
// ─── FLIP VIEW ─────────────────────────────────────────────────────────────────
//

/// Study-time decoration over a [`Flashcard`].
///
/// Tracks which face is visible while the learner reviews generated cards.
/// This state is transient: it never reaches the wire or storage schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlipCard {
    card: Flashcard,
    flipped: bool,
}

impl FlipCard {
    /// Wraps a card, front face showing.
    #[must_use]
    pub fn new(card: Flashcard) -> Self {
        Self {
            card,
            flipped: false,
        }
    }

    /// Wraps a freshly generated batch, every card front-up.
    #[must_use]
    pub fn deal(cards: Vec<Flashcard>) -> Vec<Self> {
        cards.into_iter().map(Self::new).collect()
    }

    #[must_use]
    pub fn card(&self) -> &Flashcard {
        &self.card
    }

    #[must_use]
    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    /// Toggles which face is visible.
    pub fn flip(&mut self) {
        self.flipped = !self.flipped;
    }

    /// Returns the text of the currently visible face.
    #[must_use]
    pub fn visible(&self) -> &str {
        if self.flipped {
            self.card.back()
        } else {
            self.card.front()
        }
    }

    /// Discards the view state, yielding the plain card.
    #[must_use]
    pub fn into_card(self) -> Flashcard {
        self.card
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_card_starts_front_up() {
        let view = FlipCard::new(Flashcard::new("Q", "A"));
        assert!(!view.is_flipped());
        assert_eq!(view.visible(), "Q");
    }

    #[test]
    fn flip_toggles_visible_face() {
        let mut view = FlipCard::new(Flashcard::new("Q", "A"));
        view.flip();
        assert!(view.is_flipped());
        assert_eq!(view.visible(), "A");
        view.flip();
        assert_eq!(view.visible(), "Q");
    }

    #[test]
    fn deal_wraps_every_card_front_up() {
        let cards = vec![Flashcard::new("Q1", "A1"), Flashcard::new("Q2", "A2")];
        let views = FlipCard::deal(cards.clone());
        assert_eq!(views.len(), 2);
        assert!(views.iter().all(|v| !v.is_flipped()));
        assert_eq!(views[1].card(), &cards[1]);
    }

    #[test]
    fn into_card_drops_view_state() {
        let mut view = FlipCard::new(Flashcard::new("Q", "A"));
        view.flip();
        assert_eq!(view.into_card(), Flashcard::new("Q", "A"));
    }
}

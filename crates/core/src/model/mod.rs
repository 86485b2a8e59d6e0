mod card;
mod flip;
mod ids;
mod index;
mod set;

pub use card::Flashcard;
pub use flip::FlipCard;
pub use ids::{UserId, UserIdError};
pub use index::{SetIndex, SetIndexEntry};
pub use set::{FlashcardSet, SetName, SetNameError};

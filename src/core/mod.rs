//! Card primitives.
//!
//! Suits, ranks, cards and the double deck. Plain values, no game rules.

pub mod card;
pub mod deck;

// Re-export core types
pub use card::{Card, CardId, Rank, Suit};
pub use deck::{Deck, DECK_SIZE, HAND_SIZE, SEAT_COUNT};

//! Card Definitions
//!
//! Suits, ranks and the card identity triplet.
//! Two physical decks are in play, so (suit, rank) pairs repeat;
//! every card also carries a unique instance id.

use serde::{Serialize, Deserialize};

// =============================================================================
// SUIT
// =============================================================================

/// Card suit. Jokers carry their own suit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum Suit {
    /// Hearts (the wild suit)
    Hearts = 0,
    /// Diamonds
    Diamonds = 1,
    /// Clubs
    Clubs = 2,
    /// Spades
    Spades = 3,
    /// Joker pseudo-suit
    Joker = 4,
}

impl Suit {
    /// The four standard suits in deck construction order.
    pub const STANDARD: [Suit; 4] = [Suit::Hearts, Suit::Diamonds, Suit::Clubs, Suit::Spades];

    /// Get suit from wire index (0-4).
    pub fn from_index(index: u8) -> Option<Suit> {
        match index {
            0 => Some(Suit::Hearts),
            1 => Some(Suit::Diamonds),
            2 => Some(Suit::Clubs),
            3 => Some(Suit::Spades),
            4 => Some(Suit::Joker),
            _ => None,
        }
    }
}

impl From<Suit> for u8 {
    fn from(suit: Suit) -> u8 {
        suit as u8
    }
}

impl TryFrom<u8> for Suit {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Suit::from_index(value).ok_or_else(|| format!("invalid suit index {}", value))
    }
}

// =============================================================================
// RANK
// =============================================================================

/// Card rank. Two..Ace follow natural order, jokers sit above.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum Rank {
    /// 2
    Two = 0,
    /// 3
    Three = 1,
    /// 4
    Four = 2,
    /// 5
    Five = 3,
    /// 6
    Six = 4,
    /// 7
    Seven = 5,
    /// 8
    Eight = 6,
    /// 9
    Nine = 7,
    /// 10
    Ten = 8,
    /// J
    Jack = 9,
    /// Q
    Queen = 10,
    /// K
    King = 11,
    /// A
    Ace = 12,
    /// Black (small) joker
    BlackJoker = 13,
    /// Red (big) joker
    RedJoker = 14,
}

/// Number of distinct ranks, jokers included.
pub const RANK_COUNT: usize = 15;

/// Rank value of the level rank, above every natural rank.
pub const LEVEL_RANK_VALUE: u32 = 98;
/// Rank value of the black joker.
pub const BLACK_JOKER_VALUE: u32 = 99;
/// Rank value of the red joker.
pub const RED_JOKER_VALUE: u32 = 100;

impl Rank {
    /// The thirteen natural ranks, Two..Ace.
    pub const NATURAL: [Rank; 13] = [
        Rank::Two, Rank::Three, Rank::Four, Rank::Five, Rank::Six,
        Rank::Seven, Rank::Eight, Rank::Nine, Rank::Ten,
        Rank::Jack, Rank::Queen, Rank::King, Rank::Ace,
    ];

    /// The 14-symbol run order: Ace may sit below Two or above King.
    pub const RUN_ORDER: [Rank; 14] = [
        Rank::Ace, Rank::Two, Rank::Three, Rank::Four, Rank::Five,
        Rank::Six, Rank::Seven, Rank::Eight, Rank::Nine, Rank::Ten,
        Rank::Jack, Rank::Queen, Rank::King, Rank::Ace,
    ];

    /// Get rank from wire index (0-14).
    pub fn from_index(index: u8) -> Option<Rank> {
        match index {
            0..=12 => Some(Rank::NATURAL[index as usize]),
            13 => Some(Rank::BlackJoker),
            14 => Some(Rank::RedJoker),
            _ => None,
        }
    }

    /// Array index for per-rank counting.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Is this one of the two jokers?
    #[inline]
    pub fn is_joker(self) -> bool {
        matches!(self, Rank::BlackJoker | Rank::RedJoker)
    }

    /// Position in the natural order 2..Ace (0..12). Jokers have none.
    #[inline]
    pub fn natural_value(self) -> Option<u32> {
        if self.is_joker() {
            None
        } else {
            Some(self as u32)
        }
    }

    /// Comparison value for singles, pairs, triples and full houses.
    ///
    /// Natural ranks map to 0..12, the level rank is lifted to 98,
    /// the black joker is 99 and the red joker 100.
    pub fn value(self, level: Rank) -> u32 {
        match self {
            Rank::RedJoker => RED_JOKER_VALUE,
            Rank::BlackJoker => BLACK_JOKER_VALUE,
            r if r == level => LEVEL_RANK_VALUE,
            r => r as u32,
        }
    }
}

impl From<Rank> for u8 {
    fn from(rank: Rank) -> u8 {
        rank as u8
    }
}

impl TryFrom<u8> for Rank {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Rank::from_index(value).ok_or_else(|| format!("invalid rank index {}", value))
    }
}

// =============================================================================
// CARD
// =============================================================================

/// Unique card instance id within a 108-card double deck.
pub type CardId = u32;

/// A single physical card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    /// Suit
    pub suit: Suit,
    /// Rank
    pub rank: Rank,
    /// Instance id (0..108)
    pub id: CardId,
}

impl Card {
    /// Create a card.
    pub const fn new(suit: Suit, rank: Rank, id: CardId) -> Self {
        Self { suit, rank, id }
    }

    /// A card is wild iff it is a heart of the level rank.
    #[inline]
    pub fn is_wild(&self, level: Rank) -> bool {
        self.suit == Suit::Hearts && self.rank == level
    }

    /// Comparison value of this card under `level`.
    #[inline]
    pub fn value(&self, level: Rank) -> u32 {
        self.rank.value(level)
    }
}

/// Count cards per rank into a fixed array indexed by [`Rank::index`].
pub fn count_ranks(cards: &[Card]) -> [u8; RANK_COUNT] {
    let mut counts = [0u8; RANK_COUNT];
    for card in cards {
        counts[card.rank.index()] += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_values() {
        assert_eq!(Rank::Two.value(Rank::Five), 0);
        assert_eq!(Rank::Ace.value(Rank::Five), 12);
        assert_eq!(Rank::Five.value(Rank::Five), LEVEL_RANK_VALUE);
        assert_eq!(Rank::BlackJoker.value(Rank::Five), BLACK_JOKER_VALUE);
        assert_eq!(Rank::RedJoker.value(Rank::Five), RED_JOKER_VALUE);
    }

    #[test]
    fn test_wild_only_heart_of_level() {
        assert!(Card::new(Suit::Hearts, Rank::Seven, 0).is_wild(Rank::Seven));
        assert!(!Card::new(Suit::Spades, Rank::Seven, 1).is_wild(Rank::Seven));
        assert!(!Card::new(Suit::Hearts, Rank::Eight, 2).is_wild(Rank::Seven));
    }

    #[test]
    fn test_card_wire_format() {
        let card = Card::new(Suit::Clubs, Rank::Queen, 42);
        let json = serde_json::to_string(&card).unwrap();
        assert_eq!(json, r#"{"suit":2,"rank":10,"id":42}"#);

        let parsed: Card = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, card);
    }

    #[test]
    fn test_invalid_rank_index_rejected() {
        assert!(serde_json::from_str::<Card>(r#"{"suit":0,"rank":15,"id":1}"#).is_err());
        assert!(serde_json::from_str::<Card>(r#"{"suit":5,"rank":1,"id":1}"#).is_err());
    }

    #[test]
    fn test_count_ranks() {
        let cards = [
            Card::new(Suit::Hearts, Rank::Nine, 0),
            Card::new(Suit::Spades, Rank::Nine, 1),
            Card::new(Suit::Joker, Rank::RedJoker, 2),
        ];
        let counts = count_ranks(&cards);
        assert_eq!(counts[Rank::Nine.index()], 2);
        assert_eq!(counts[Rank::RedJoker.index()], 1);
        assert_eq!(counts.iter().map(|&c| c as usize).sum::<usize>(), 3);
    }
}

//! Double Deck
//!
//! 108 cards: two copies of the 52 standard cards plus a black and a red
//! joker per copy. A deck lives for one hand: built, shuffled, dealt, dropped.

use rand::Rng;
use rand::seq::SliceRandom;

use super::card::{Card, CardId, Rank, Suit};

/// Cards in a full double deck.
pub const DECK_SIZE: usize = 108;

/// Seats at the table.
pub const SEAT_COUNT: usize = 4;

/// Cards dealt to each seat.
pub const HAND_SIZE: usize = DECK_SIZE / SEAT_COUNT;

/// An ordered 108-card double deck.
#[derive(Clone, Debug)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Default for Deck {
    fn default() -> Self {
        Self::new()
    }
}

impl Deck {
    /// Build an unshuffled deck with ids 0..108 in construction order.
    pub fn new() -> Self {
        let mut cards = Vec::with_capacity(DECK_SIZE);
        let mut id: CardId = 0;

        for _copy in 0..2 {
            for suit in Suit::STANDARD {
                for rank in Rank::NATURAL {
                    cards.push(Card::new(suit, rank, id));
                    id += 1;
                }
            }
            cards.push(Card::new(Suit::Joker, Rank::BlackJoker, id));
            id += 1;
            cards.push(Card::new(Suit::Joker, Rank::RedJoker, id));
            id += 1;
        }

        Self { cards }
    }

    /// Shuffle in place (Fisher-Yates via `rand`).
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
    }

    /// Cards in current order.
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Number of cards.
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Is the deck empty?
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Consume the deck into four hands; card `i` goes to seat `i % 4`.
    pub fn deal(self) -> [Vec<Card>; SEAT_COUNT] {
        let mut hands: [Vec<Card>; SEAT_COUNT] =
            std::array::from_fn(|_| Vec::with_capacity(HAND_SIZE));

        for (i, card) in self.cards.into_iter().enumerate() {
            hands[i % SEAT_COUNT].push(card);
        }

        hands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::BTreeSet;

    #[test]
    fn test_deck_composition() {
        let deck = Deck::new();
        assert_eq!(deck.len(), DECK_SIZE);

        let jokers = deck.cards().iter().filter(|c| c.rank.is_joker()).count();
        assert_eq!(jokers, 4);

        let heart_aces = deck.cards().iter()
            .filter(|c| c.suit == Suit::Hearts && c.rank == Rank::Ace)
            .count();
        assert_eq!(heart_aces, 2);

        let ids: BTreeSet<CardId> = deck.cards().iter().map(|c| c.id).collect();
        assert_eq!(ids.len(), DECK_SIZE);
        assert_eq!(ids.iter().next_back(), Some(&(DECK_SIZE as CardId - 1)));
    }

    #[test]
    fn test_shuffle_is_reproducible_with_seed() {
        let mut deck1 = Deck::new();
        let mut deck2 = Deck::new();
        deck1.shuffle(&mut StdRng::seed_from_u64(7));
        deck2.shuffle(&mut StdRng::seed_from_u64(7));
        assert_eq!(deck1.cards(), deck2.cards());
        assert_ne!(deck1.cards(), Deck::new().cards());
    }

    #[test]
    fn test_deal_four_hands() {
        let hands = Deck::new().deal();
        for hand in &hands {
            assert_eq!(hand.len(), HAND_SIZE);
        }
        // Round-robin: seat 1 gets ids 1, 5, 9, ...
        assert_eq!(hands[1][0].id, 1);
        assert_eq!(hands[1][1].id, 5);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_deal_preserves_full_deck(seed in any::<u64>()) {
                let mut deck = Deck::new();
                deck.shuffle(&mut StdRng::seed_from_u64(seed));
                let hands = deck.deal();

                let mut ids = BTreeSet::new();
                for hand in &hands {
                    prop_assert_eq!(hand.len(), HAND_SIZE);
                    for card in hand {
                        prop_assert!(ids.insert(card.id), "duplicate id {}", card.id);
                    }
                }
                prop_assert_eq!(ids.len(), DECK_SIZE);

                let mut dealt: Vec<Card> = hands.into_iter().flatten().collect();
                dealt.sort_by_key(|c| c.id);
                let fresh = Deck::new();
                prop_assert_eq!(dealt.as_slice(), fresh.cards());
            }
        }
    }
}

//! Bomb Detection
//!
//! Bombs beat every non-bomb play and compare among themselves by a single
//! power number:
//!
//! | Bomb                 | Power                                   |
//! |----------------------|-----------------------------------------|
//! | n of a kind (4..=10) | `n * 100 + rank value`                  |
//! | straight flush (5+)  | `900 + n * 10 + top rank natural value` |
//! | four jokers          | `1000`                                  |

use crate::core::card::{Card, Rank, Suit, LEVEL_RANK_VALUE};
use super::combination::{Combination, Grouping};

/// Power of the four-joker bomb.
pub const FOUR_JOKER_POWER: u32 = 1000;

/// Base power of a straight flush.
pub const STRAIGHT_FLUSH_BASE: u32 = 900;

/// Smallest n-of-a-kind bomb.
pub const MIN_KIND_BOMB: usize = 4;

/// Largest n-of-a-kind bomb (eight naturals plus two wilds).
pub const MAX_KIND_BOMB: usize = 10;

/// Smallest straight flush.
pub const MIN_STRAIGHT_FLUSH: usize = 5;

/// Detect a bomb. Checked in order: four jokers, straight flush, n of a kind.
pub fn detect_bomb(cards: &[Card], level: Rank) -> Option<Combination> {
    if is_four_jokers(cards) {
        return Some(Combination::bomb(cards, FOUR_JOKER_POWER));
    }

    let groups = Grouping::of(cards, level);

    straight_flush_power(cards, &groups, level)
        .or_else(|| n_of_kind_power(&groups, cards.len(), level))
        .map(|power| Combination::bomb(cards, power))
}

/// Exactly the two black and two red jokers.
fn is_four_jokers(cards: &[Card]) -> bool {
    cards.len() == 4
        && cards.iter().filter(|c| c.rank == Rank::BlackJoker).count() == 2
        && cards.iter().filter(|c| c.rank == Rank::RedJoker).count() == 2
}

/// Five or more consecutive ranks of one suit, wilds filling gaps.
fn straight_flush_power(cards: &[Card], groups: &Grouping, level: Rank) -> Option<u32> {
    let size = cards.len();
    if size < MIN_STRAIGHT_FLUSH || groups.natural == 0 {
        return None;
    }

    let mut suits = cards.iter()
        .filter(|c| !c.is_wild(level))
        .map(|c| c.suit);
    let suit = suits.next()?;
    if suit == Suit::Joker || suits.any(|s| s != suit) {
        return None;
    }

    let top = groups.lowest_run(size, 1)?;
    let top_value = top.natural_value()?;

    Some(STRAIGHT_FLUSH_BASE + size as u32 * 10 + top_value)
}

/// Four to ten cards of one non-joker rank, wilds included.
fn n_of_kind_power(groups: &Grouping, size: usize, level: Rank) -> Option<u32> {
    if !(MIN_KIND_BOMB..=MAX_KIND_BOMB).contains(&size) || groups.has_joker() {
        return None;
    }

    let base = size as u32 * 100;
    if groups.natural == 0 {
        return Some(base + LEVEL_RANK_VALUE);
    }

    let ranks = groups.ranks_by_value(level);
    let [rank] = ranks.as_slice() else {
        return None;
    };

    Some(base + rank.value(level))
}

//! Hand Settlement
//!
//! Decides when a hand is over, how far the winners advance,
//! where every seat placed, and who owes tribute for the next hand.

use serde::{Serialize, Deserialize};

use crate::core::card::Card;
use crate::core::deck::SEAT_COUNT;
use super::state::{partner_of, team_of, Seat, Tribute};

/// Highest team level (Ace). Winning a hand from here ends the match.
pub const MAX_LEVEL: u8 = 12;

/// Outcome of a finished hand.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandResult {
    /// Seats in the order they emptied their hands
    pub finish_order: Vec<Seat>,
    /// Every seat from first to last place
    pub placement: [Seat; SEAT_COUNT],
    /// Team of the first finisher
    pub winning_team: usize,
    /// Levels credited to the winning team
    pub level_advance: u8,
    /// Team levels after crediting
    pub new_levels: [u8; 2],
    /// Winning team was already at Ace
    pub match_over: bool,
}

/// A hand ends once the first two finishers are partners,
/// or three seats have finished.
pub fn is_hand_over(finish_order: &[Seat]) -> bool {
    match finish_order {
        [first, second, ..] if team_of(*first) == team_of(*second) => true,
        _ => finish_order.len() >= 3,
    }
}

/// Levels earned by the first finisher's team: 4 when the partner came
/// second, 2 when third, 1 otherwise.
pub fn level_advance(finish_order: &[Seat]) -> u8 {
    let Some(&first) = finish_order.first() else {
        return 0;
    };
    let partner = partner_of(first);

    match finish_order.iter().position(|&s| s == partner) {
        Some(1) => 4,
        Some(2) => 2,
        _ => 1,
    }
}

/// Full placement. Finished seats keep their finishing order; unfinished
/// seats follow, fewer cards first, lower seat index first on ties.
pub fn placement(finish_order: &[Seat], hands: &[Vec<Card>; SEAT_COUNT]) -> [Seat; SEAT_COUNT] {
    let mut unfinished: Vec<Seat> = (0..SEAT_COUNT)
        .filter(|s| !finish_order.contains(s))
        .collect();
    unfinished.sort_by_key(|&s| (hands[s].len(), s));

    let mut order = [0; SEAT_COUNT];
    for (slot, seat) in order.iter_mut().zip(finish_order.iter().chain(unfinished.iter())) {
        *slot = *seat;
    }
    order
}

/// Tribute obligations for the next hand.
///
/// The lowest-placed seat of the losing team pays the first-place seat.
/// When first and second place are partners, the other loser also pays
/// the second-place seat.
pub fn tributes_for(placement: &[Seat; SEAT_COUNT]) -> Vec<Tribute> {
    let first = placement[0];
    let winning_team = team_of(first);

    let mut losers = placement.iter()
        .rev()
        .copied()
        .filter(|&s| team_of(s) != winning_team);

    let mut tributes = Vec::with_capacity(2);
    if let Some(last) = losers.next() {
        tributes.push(Tribute::new(last, first));
    }

    let second = placement[1];
    if team_of(second) == winning_team {
        if let Some(other) = losers.next() {
            tributes.push(Tribute::new(other, second));
        }
    }

    tributes
}

/// Settle a finished hand against the levels the teams held when it began.
pub fn settle_hand(
    finish_order: &[Seat],
    hands: &[Vec<Card>; SEAT_COUNT],
    team_levels: [u8; 2],
) -> HandResult {
    let placement = placement(finish_order, hands);
    let winning_team = team_of(placement[0]);
    let level_advance = level_advance(finish_order);

    let match_over = team_levels[winning_team] >= MAX_LEVEL;
    let mut new_levels = team_levels;
    new_levels[winning_team] = (team_levels[winning_team] + level_advance).min(MAX_LEVEL);

    HandResult {
        finish_order: finish_order.to_vec(),
        placement,
        winning_team,
        level_advance,
        new_levels,
        match_over,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::card::{Rank, Suit};

    fn hands_with_sizes(sizes: [usize; SEAT_COUNT]) -> [Vec<Card>; SEAT_COUNT] {
        std::array::from_fn(|seat| {
            (0..sizes[seat])
                .map(|i| Card::new(Suit::Spades, Rank::Three, (seat * 100 + i) as u32))
                .collect()
        })
    }

    #[test]
    fn test_hand_over_rules() {
        assert!(!is_hand_over(&[]));
        assert!(!is_hand_over(&[0]));
        assert!(is_hand_over(&[0, 2]));
        assert!(is_hand_over(&[1, 3]));
        assert!(!is_hand_over(&[0, 1]));
        assert!(is_hand_over(&[0, 1, 2]));
    }

    #[test]
    fn test_level_advance() {
        assert_eq!(level_advance(&[0, 2]), 4);
        assert_eq!(level_advance(&[3, 0, 1]), 2);
        assert_eq!(level_advance(&[0, 1, 3]), 1);
    }

    #[test]
    fn test_placement_orders_unfinished_by_cards() {
        let hands = hands_with_sizes([0, 5, 0, 2]);
        assert_eq!(placement(&[2, 0], &hands), [2, 0, 3, 1]);

        let tied = hands_with_sizes([0, 4, 4, 4]);
        assert_eq!(placement(&[0], &tied), [0, 1, 2, 3]);
    }

    #[test]
    fn test_single_tribute() {
        let tributes = tributes_for(&[0, 1, 2, 3]);
        assert_eq!(tributes, vec![Tribute::new(3, 0)]);
    }

    #[test]
    fn test_tribute_skips_winning_partner_in_last_place() {
        // Seat 2 is last but on the winning team; seat 3 pays.
        let tributes = tributes_for(&[0, 1, 3, 2]);
        assert_eq!(tributes, vec![Tribute::new(3, 0)]);
    }

    #[test]
    fn test_double_win_tributes() {
        let tributes = tributes_for(&[1, 3, 0, 2]);
        assert_eq!(tributes, vec![Tribute::new(2, 1), Tribute::new(0, 3)]);
    }

    #[test]
    fn test_settle_double_win() {
        let hands = hands_with_sizes([0, 9, 0, 4]);
        let result = settle_hand(&[0, 2], &hands, [3, 5]);
        assert_eq!(result.winning_team, 0);
        assert_eq!(result.level_advance, 4);
        assert_eq!(result.new_levels, [7, 5]);
        assert_eq!(result.placement, [0, 2, 3, 1]);
        assert!(!result.match_over);
    }

    #[test]
    fn test_settle_caps_at_ace() {
        let hands = hands_with_sizes([0, 9, 0, 4]);
        let result = settle_hand(&[0, 2], &hands, [10, 0]);
        assert_eq!(result.new_levels, [MAX_LEVEL, 0]);
        assert!(!result.match_over);
    }

    #[test]
    fn test_settle_from_ace_ends_match() {
        let hands = hands_with_sizes([0, 0, 2, 0]);
        let result = settle_hand(&[3, 0, 1], &hands, [4, MAX_LEVEL]);
        assert_eq!(result.winning_team, 1);
        assert_eq!(result.level_advance, 2);
        assert!(result.match_over);
    }
}

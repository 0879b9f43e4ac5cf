//! Bot Policy
//!
//! Greedy, stateless play for seats without a human. Never bombs and never
//! splits a rank held four or more times. Same hand and same lead always
//! give the same move.

use crate::core::card::{count_ranks, Card, CardId, Rank};
use super::combination::{can_beat, classify, ComboType};
use super::state::{team_of, GameState, Phase, Seat};

/// A bot decision.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BotMove {
    /// Play these cards
    Play(Vec<CardId>),
    /// Pass on the lead
    Pass,
    /// Pay tribute with this card
    Tribute(CardId),
}

/// Decide for `seat`, or `None` when the seat has nothing to do.
pub fn decide(state: &GameState, seat: Seat) -> Option<BotMove> {
    match state.phase {
        Phase::Tribute => {
            state.owed_tribute(seat)?;
            tribute_card(&state.hands[seat], state.level).map(BotMove::Tribute)
        }
        Phase::Play if state.current_turn == seat => Some(play_or_pass(state, seat)),
        _ => None,
    }
}

fn play_or_pass(state: &GameState, seat: Seat) -> BotMove {
    let hand = &state.hands[seat];
    let level = state.level;

    let Some(lead) = &state.lead else {
        return lowest_card(hand, level)
            .map(|id| BotMove::Play(vec![id]))
            .unwrap_or(BotMove::Pass);
    };

    if team_of(state.lead_seat) == team_of(seat) {
        return BotMove::Pass;
    }

    let size = match lead.combo_type {
        ComboType::Single => 1,
        ComboType::Pair => 2,
        ComboType::Triple => 3,
        _ => return BotMove::Pass,
    };

    let counts = count_ranks(hand);
    let mut ranks: Vec<Rank> = hand.iter().map(|c| c.rank).collect();
    ranks.sort_by_key(|r| r.value(level));
    ranks.dedup();

    for rank in ranks {
        let held = counts[rank.index()] as usize;
        if held < size || held >= 4 {
            continue;
        }

        let mut group: Vec<&Card> = hand.iter().filter(|c| c.rank == rank).collect();
        group.sort_by_key(|c| c.id);
        let cards: Vec<Card> = group.into_iter().take(size).copied().collect();

        let combo = classify(&cards, level);
        if combo.is_valid() && !combo.is_bomb() && can_beat(&combo, lead) {
            return BotMove::Play(cards.iter().map(|c| c.id).collect());
        }
    }

    BotMove::Pass
}

/// Lowest value, lowest id.
fn lowest_card(hand: &[Card], level: Rank) -> Option<CardId> {
    hand.iter()
        .min_by_key(|c| (c.value(level), c.id))
        .map(|c| c.id)
}

/// Highest non-wild card, lowest id on ties.
fn tribute_card(hand: &[Card], level: Rank) -> Option<CardId> {
    hand.iter()
        .filter(|c| !c.is_wild(level))
        .min_by_key(|c| (std::cmp::Reverse(c.value(level)), c.id))
        .map(|c| c.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::card::Suit;
    use crate::game::state::Tribute;

    fn card(suit: Suit, rank: Rank, id: CardId) -> Card {
        Card::new(suit, rank, id)
    }

    fn table(hand: Vec<Card>) -> GameState {
        let mut state = GameState::new();
        state.phase = Phase::Play;
        state.current_turn = 1;
        state.hands[1] = hand;
        state
    }

    fn with_lead(mut state: GameState, lead_seat: Seat, lead: &[Card]) -> GameState {
        state.lead = Some(classify(lead, state.level));
        state.lead_seat = lead_seat;
        state
    }

    #[test]
    fn test_leads_lowest_single() {
        let state = table(vec![
            card(Suit::Spades, Rank::King, 5),
            card(Suit::Clubs, Rank::Four, 9),
            card(Suit::Spades, Rank::Four, 3),
            card(Suit::Joker, Rank::RedJoker, 1),
        ]);
        assert_eq!(decide(&state, 1), Some(BotMove::Play(vec![3])));
    }

    #[test]
    fn test_passes_on_partner_lead() {
        let state = with_lead(
            table(vec![card(Suit::Spades, Rank::Ace, 5)]),
            3,
            &[card(Suit::Clubs, Rank::Three, 40)],
        );
        assert_eq!(decide(&state, 1), Some(BotMove::Pass));
    }

    #[test]
    fn test_beats_single_cheaply() {
        let state = with_lead(
            table(vec![
                card(Suit::Spades, Rank::Ace, 5),
                card(Suit::Spades, Rank::Three, 6),
                card(Suit::Spades, Rank::Ten, 7),
            ]),
            0,
            &[card(Suit::Clubs, Rank::Eight, 40)],
        );
        assert_eq!(decide(&state, 1), Some(BotMove::Play(vec![7])));
    }

    #[test]
    fn test_beats_pair_without_breaking_bomb() {
        let mut hand: Vec<Card> = (0..4).map(|i| card(Suit::Spades, Rank::Nine, i)).collect();
        hand.push(card(Suit::Clubs, Rank::Queen, 20));
        hand.push(card(Suit::Diamonds, Rank::Queen, 21));
        hand.push(card(Suit::Diamonds, Rank::Queen, 22));

        let state = with_lead(
            table(hand),
            2,
            &[card(Suit::Clubs, Rank::Six, 40), card(Suit::Spades, Rank::Six, 41)],
        );
        assert_eq!(decide(&state, 1), Some(BotMove::Play(vec![20, 21])));
    }

    #[test]
    fn test_passes_on_unsupported_lead() {
        let lead = [
            card(Suit::Clubs, Rank::Three, 40),
            card(Suit::Clubs, Rank::Four, 41),
            card(Suit::Spades, Rank::Five, 42),
            card(Suit::Clubs, Rank::Six, 43),
            card(Suit::Clubs, Rank::Seven, 44),
        ];
        let state = with_lead(table(vec![card(Suit::Spades, Rank::Ace, 5)]), 0, &lead);
        assert_eq!(decide(&state, 1), Some(BotMove::Pass));
    }

    #[test]
    fn test_waits_for_turn() {
        let mut state = table(vec![card(Suit::Spades, Rank::Ace, 5)]);
        state.current_turn = 2;
        assert_eq!(decide(&state, 1), None);
    }

    #[test]
    fn test_tribute_highest_non_wild() {
        let mut state = table(vec![
            card(Suit::Hearts, Rank::Two, 1),
            card(Suit::Spades, Rank::Ace, 9),
            card(Suit::Clubs, Rank::Ace, 4),
            card(Suit::Clubs, Rank::Five, 2),
        ]);
        state.phase = Phase::Tribute;
        state.tributes = vec![Tribute::new(1, 0)];
        assert_eq!(decide(&state, 1), Some(BotMove::Tribute(4)));

        state.tributes[0].done = true;
        assert_eq!(decide(&state, 1), None);
    }

    #[test]
    fn test_deterministic() {
        let state = with_lead(
            table(vec![
                card(Suit::Spades, Rank::Jack, 5),
                card(Suit::Clubs, Rank::Jack, 6),
                card(Suit::Spades, Rank::King, 7),
            ]),
            0,
            &[card(Suit::Clubs, Rank::Ten, 40)],
        );
        assert_eq!(decide(&state, 1), decide(&state, 1));
    }
}

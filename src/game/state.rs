//! Game State Definitions
//!
//! The authoritative record of one match: hands, lead, turn, finish order,
//! team levels and tribute obligations.
//!
//! Every mutator validates completely before touching anything, so a
//! rejected action leaves the state exactly as it was.

use rand::Rng;
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::card::{Card, CardId, Rank};
use crate::core::deck::{Deck, SEAT_COUNT};
use super::combination::{can_beat, classify, Combination};
use super::settle::{is_hand_over, settle_hand, tributes_for, HandResult};

// =============================================================================
// SEATS & TEAMS
// =============================================================================

/// Seat index (0..4).
pub type Seat = usize;

/// Team of a seat. Seats 0 and 2 play seats 1 and 3.
#[inline]
pub fn team_of(seat: Seat) -> usize {
    seat % 2
}

/// Seat across the table.
#[inline]
pub fn partner_of(seat: Seat) -> Seat {
    (seat + 2) % SEAT_COUNT
}

// =============================================================================
// ERRORS
// =============================================================================

/// Rule violations. Display strings are sent to clients as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// Acting out of turn
    #[error("not your turn")]
    NotYourTurn,

    /// Action does not belong to the current phase
    #[error("action not allowed in this phase")]
    WrongPhase,

    /// Card ids missing from hand, duplicated or empty
    #[error("invalid cards")]
    InvalidCards,

    /// Cards form no legal play
    #[error("invalid combination")]
    InvalidCombination,

    /// Legal play that does not beat the lead
    #[error("cannot beat current play")]
    CannotBeat,

    /// Passing with no lead on the table
    #[error("cannot pass when leading")]
    CannotPassWhenLeading,

    /// Tribute from a seat that owes none
    #[error("you don't need to give tribute")]
    NoTributeOwed,

    /// Wild card offered as tribute
    #[error("cannot tribute wild cards")]
    WildTribute,

    /// Tribute card not in hand
    #[error("invalid card")]
    InvalidCard,

    /// Tribute card below the best non-wild card in hand
    #[error("must tribute your highest card")]
    TributeNotHighest,
}

// =============================================================================
// PHASE & TRIBUTE
// =============================================================================

/// Match lifecycle phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Seats filling up
    Waiting,
    /// Between hands, cards about to be dealt
    Deal,
    /// Trick play
    Play,
    /// Tribute exchange before play
    Tribute,
    /// Match finished
    End,
}

/// A tribute obligation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tribute {
    /// Paying seat
    pub from_seat: Seat,
    /// Receiving seat
    pub to_seat: Seat,
    /// Paid
    pub done: bool,
}

impl Tribute {
    /// New unpaid obligation.
    pub const fn new(from_seat: Seat, to_seat: Seat) -> Self {
        Self { from_seat, to_seat, done: false }
    }
}

// =============================================================================
// REPORTS
// =============================================================================

/// What an accepted play did.
#[derive(Clone, Debug)]
pub struct PlayReport {
    /// Seat that played
    pub seat: Seat,
    /// The play
    pub combo: Combination,
    /// The play emptied the seat's hand
    pub seat_finished: bool,
    /// Set when the play ended the hand
    pub hand_result: Option<HandResult>,
}

/// What an accepted pass did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PassReport {
    /// Seat that passed
    pub seat: Seat,
    /// Everyone passed and the table is free
    pub lead_cleared: bool,
}

/// What an accepted tribute did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TributeReport {
    /// Paying seat
    pub from_seat: Seat,
    /// Receiving seat
    pub to_seat: Seat,
    /// Card handed over
    pub card: Card,
    /// Every obligation is paid and play has started
    pub tributes_complete: bool,
}

// =============================================================================
// GAME STATE
// =============================================================================

/// Authoritative match state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameState {
    /// Current phase
    pub phase: Phase,
    /// Wild level of the current hand
    pub level: Rank,
    /// Per-team level, 0 (Two) to 12 (Ace)
    pub team_levels: [u8; 2],
    /// Cards held by each seat
    pub hands: [Vec<Card>; SEAT_COUNT],
    /// Seat to act
    pub current_turn: Seat,
    /// Play to beat, if any
    pub lead: Option<Combination>,
    /// Seat that made the lead
    pub lead_seat: Seat,
    /// Consecutive passes since the lead
    pub pass_count: u8,
    /// Seats that emptied their hands, in order
    pub finish_order: Vec<Seat>,
    /// Tribute obligations of the current hand
    pub tributes: Vec<Tribute>,
    /// First finisher of the previous hand
    pub tribute_leader: Seat,
    /// Hands dealt so far
    pub hand_number: u32,
    /// Bumped on every turn change
    pub turn_seq: u64,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    /// Fresh match, nothing dealt.
    pub fn new() -> Self {
        Self {
            phase: Phase::Waiting,
            level: Rank::Two,
            team_levels: [0, 0],
            hands: Default::default(),
            current_turn: 0,
            lead: None,
            lead_seat: 0,
            pass_count: 0,
            finish_order: Vec::with_capacity(SEAT_COUNT),
            tributes: Vec::new(),
            tribute_leader: 0,
            hand_number: 0,
            turn_seq: 0,
        }
    }

    /// Level rank a team plays at.
    pub fn level_for_team(&self, team: usize) -> Rank {
        Rank::from_index(self.team_levels[team]).unwrap_or(Rank::Ace)
    }

    /// Has this seat emptied its hand?
    #[inline]
    pub fn is_finished(&self, seat: Seat) -> bool {
        self.finish_order.contains(&seat)
    }

    /// Can the seat to act pass?
    #[inline]
    pub fn can_pass(&self) -> bool {
        self.lead.is_some()
    }

    /// Is the match over?
    #[inline]
    pub fn is_over(&self) -> bool {
        self.phase == Phase::End
    }

    // =========================================================================
    // DEALING
    // =========================================================================

    fn deal<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut deck = Deck::new();
        deck.shuffle(rng);
        self.hands = deck.deal();
        self.hand_number += 1;
    }

    /// Deal the first hand at level Two; seat 0 leads.
    pub fn start_match<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.phase = Phase::Deal;
        self.level = self.level_for_team(0);
        self.reset_table();
        self.deal(rng);

        self.phase = Phase::Play;
        self.set_turn(0);
    }

    /// Deal the hand after a settlement. Play starts once every tribute is
    /// paid, with the previous first finisher leading.
    pub fn start_next_hand<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), GameError> {
        if self.phase != Phase::Deal {
            return Err(GameError::WrongPhase);
        }

        self.level = self.level_for_team(team_of(self.tribute_leader));
        self.reset_table();
        self.deal(rng);

        self.phase = if self.tributes.is_empty() {
            Phase::Play
        } else {
            Phase::Tribute
        };
        self.set_turn(self.tribute_leader);
        Ok(())
    }

    fn reset_table(&mut self) {
        self.lead = None;
        self.lead_seat = 0;
        self.pass_count = 0;
        self.finish_order.clear();
    }

    // =========================================================================
    // PLAY
    // =========================================================================

    /// Resolve ids against a hand. Fails on an empty list, a repeated id
    /// or any id the seat does not hold.
    pub fn cards_by_ids(&self, seat: Seat, ids: &[CardId]) -> Result<Vec<Card>, GameError> {
        if ids.is_empty() {
            return Err(GameError::InvalidCards);
        }

        let hand = &self.hands[seat];
        let mut cards = Vec::with_capacity(ids.len());
        for (i, id) in ids.iter().enumerate() {
            if ids[..i].contains(id) {
                return Err(GameError::InvalidCards);
            }
            let card = hand.iter()
                .find(|c| c.id == *id)
                .ok_or(GameError::InvalidCards)?;
            cards.push(*card);
        }

        Ok(cards)
    }

    fn remove_cards(&mut self, seat: Seat, ids: &[CardId]) {
        self.hands[seat].retain(|c| !ids.contains(&c.id));
    }

    fn check_turn(&self, seat: Seat) -> Result<(), GameError> {
        if self.phase != Phase::Play {
            return Err(GameError::WrongPhase);
        }
        if seat != self.current_turn {
            return Err(GameError::NotYourTurn);
        }
        Ok(())
    }

    /// Play cards from `seat`.
    pub fn play_cards(&mut self, seat: Seat, ids: &[CardId]) -> Result<PlayReport, GameError> {
        self.check_turn(seat)?;

        let cards = self.cards_by_ids(seat, ids)?;
        let combo = classify(&cards, self.level);
        if !combo.is_valid() {
            return Err(GameError::InvalidCombination);
        }
        if let Some(lead) = &self.lead {
            if !can_beat(&combo, lead) {
                return Err(GameError::CannotBeat);
            }
        }

        self.remove_cards(seat, ids);
        self.lead = Some(combo.clone());
        self.lead_seat = seat;
        self.pass_count = 0;

        let seat_finished = self.hands[seat].is_empty();
        if seat_finished {
            self.finish_order.push(seat);
        }

        let hand_result = if seat_finished && is_hand_over(&self.finish_order) {
            Some(self.end_hand())
        } else {
            self.advance_turn();
            None
        };

        Ok(PlayReport { seat, combo, seat_finished, hand_result })
    }

    /// Pass on the current lead.
    pub fn pass(&mut self, seat: Seat) -> Result<PassReport, GameError> {
        self.check_turn(seat)?;
        if self.lead.is_none() {
            return Err(GameError::CannotPassWhenLeading);
        }

        self.pass_count += 1;

        let lead_cleared = self.pass_count as usize >= self.passes_to_clear();
        if lead_cleared {
            let leader = self.next_leader();
            self.lead = None;
            self.pass_count = 0;
            self.set_turn(leader);
        } else {
            self.advance_turn();
        }

        Ok(PassReport { seat, lead_cleared })
    }

    /// Every other seat still holding cards must pass.
    fn passes_to_clear(&self) -> usize {
        (0..SEAT_COUNT)
            .filter(|&s| s != self.lead_seat && !self.is_finished(s))
            .count()
    }

    /// Free lead goes to the lead seat, or its partner once it has finished.
    fn next_leader(&self) -> Seat {
        if !self.is_finished(self.lead_seat) {
            return self.lead_seat;
        }
        let partner = partner_of(self.lead_seat);
        if !self.is_finished(partner) {
            return partner;
        }
        self.next_active_after(self.lead_seat)
    }

    fn next_active_after(&self, seat: Seat) -> Seat {
        (1..=SEAT_COUNT)
            .map(|i| (seat + i) % SEAT_COUNT)
            .find(|&s| !self.is_finished(s))
            .unwrap_or(seat)
    }

    /// Move the turn to the next seat that still holds cards.
    pub fn advance_turn(&mut self) {
        let next = self.next_active_after(self.current_turn);
        self.set_turn(next);
    }

    fn set_turn(&mut self, seat: Seat) {
        self.current_turn = seat;
        self.turn_seq += 1;
    }

    fn end_hand(&mut self) -> HandResult {
        let result = settle_hand(&self.finish_order, &self.hands, self.team_levels);
        self.team_levels = result.new_levels;
        self.lead = None;
        self.pass_count = 0;

        if result.match_over {
            self.phase = Phase::End;
            self.tributes.clear();
        } else {
            self.phase = Phase::Deal;
            self.tributes = tributes_for(&result.placement);
            self.tribute_leader = result.placement[0];
        }

        result
    }

    // =========================================================================
    // TRIBUTE
    // =========================================================================

    /// Unpaid obligation of `seat`, if any.
    pub fn owed_tribute(&self, seat: Seat) -> Option<&Tribute> {
        self.tributes.iter().find(|t| t.from_seat == seat && !t.done)
    }

    /// Unpaid obligations.
    pub fn pending_tributes(&self) -> impl Iterator<Item = &Tribute> {
        self.tributes.iter().filter(|t| !t.done)
    }

    /// Pay tribute with one non-wild card.
    pub fn give_tribute(&mut self, seat: Seat, card_id: CardId) -> Result<TributeReport, GameError> {
        if self.phase != Phase::Tribute {
            return Err(GameError::WrongPhase);
        }

        let index = self.tributes.iter()
            .position(|t| t.from_seat == seat && !t.done)
            .ok_or(GameError::NoTributeOwed)?;

        let card = *self.hands[seat].iter()
            .find(|c| c.id == card_id)
            .ok_or(GameError::InvalidCard)?;
        if card.is_wild(self.level) {
            return Err(GameError::WildTribute);
        }
        let highest = self.hands[seat].iter()
            .filter(|c| !c.is_wild(self.level))
            .map(|c| c.value(self.level))
            .max()
            .unwrap_or(0);
        if card.value(self.level) < highest {
            return Err(GameError::TributeNotHighest);
        }

        let to_seat = self.tributes[index].to_seat;
        self.remove_cards(seat, &[card_id]);
        self.hands[to_seat].push(card);
        self.tributes[index].done = true;

        let tributes_complete = self.pending_tributes().next().is_none();
        if tributes_complete {
            self.phase = Phase::Play;
            self.set_turn(self.tribute_leader);
        }

        Ok(TributeReport { from_seat: seat, to_seat, card, tributes_complete })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::card::Suit;
    use crate::core::deck::HAND_SIZE;
    use crate::game::combination::ComboType;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn spade(rank: Rank, id: CardId) -> Card {
        Card::new(Suit::Spades, rank, id)
    }

    fn playing(hands: [Vec<Card>; SEAT_COUNT]) -> GameState {
        let mut state = GameState::new();
        state.hands = hands;
        state.phase = Phase::Play;
        state
    }

    #[test]
    fn test_start_match() {
        let mut state = GameState::new();
        state.start_match(&mut StdRng::seed_from_u64(1));

        assert_eq!(state.phase, Phase::Play);
        assert_eq!(state.level, Rank::Two);
        assert_eq!(state.current_turn, 0);
        assert_eq!(state.hand_number, 1);
        for hand in &state.hands {
            assert_eq!(hand.len(), HAND_SIZE);
        }
    }

    #[test]
    fn test_cards_by_ids_strict() {
        let state = playing([
            vec![spade(Rank::Five, 0), spade(Rank::Five, 1)],
            vec![], vec![], vec![],
        ]);
        assert_eq!(state.cards_by_ids(0, &[0, 1]).unwrap().len(), 2);
        assert_eq!(state.cards_by_ids(0, &[0, 0]), Err(GameError::InvalidCards));
        assert_eq!(state.cards_by_ids(0, &[0, 7]), Err(GameError::InvalidCards));
        assert_eq!(state.cards_by_ids(0, &[]), Err(GameError::InvalidCards));
    }

    #[test]
    fn test_rejections_leave_state_untouched() {
        let mut state = playing([
            vec![spade(Rank::Nine, 0), spade(Rank::Four, 1), spade(Rank::Jack, 2)],
            vec![spade(Rank::Five, 10), spade(Rank::Six, 11)],
            vec![spade(Rank::Seven, 20)],
            vec![spade(Rank::Eight, 30)],
        ]);

        assert_eq!(state.play_cards(1, &[10]).unwrap_err(), GameError::NotYourTurn);
        assert_eq!(state.pass(0).unwrap_err(), GameError::CannotPassWhenLeading);
        assert_eq!(state.play_cards(0, &[0, 1]).unwrap_err(), GameError::InvalidCombination);

        state.play_cards(0, &[0]).unwrap();
        let before = state.hands.clone();
        assert_eq!(state.play_cards(1, &[10]).unwrap_err(), GameError::CannotBeat);
        assert_eq!(state.hands, before);
        assert_eq!(state.current_turn, 1);
    }

    #[test]
    fn test_all_pass_returns_lead() {
        let mut state = playing([
            vec![spade(Rank::Nine, 0), spade(Rank::Four, 1)],
            vec![spade(Rank::Five, 10), spade(Rank::Six, 11)],
            vec![spade(Rank::Seven, 20), spade(Rank::Three, 21)],
            vec![spade(Rank::Eight, 30), spade(Rank::Three, 31)],
        ]);

        let report = state.play_cards(0, &[0]).unwrap();
        assert_eq!(report.combo.combo_type, ComboType::Single);
        assert!(!report.seat_finished);

        assert!(!state.pass(1).unwrap().lead_cleared);
        assert!(!state.pass(2).unwrap().lead_cleared);
        assert!(state.pass(3).unwrap().lead_cleared);

        assert_eq!(state.current_turn, 0);
        assert_eq!(state.pass_count, 0);
        assert!(state.lead.is_none());
    }

    #[test]
    fn test_lead_passes_to_partner_after_finishing() {
        let mut state = playing([
            vec![spade(Rank::Nine, 0)],
            vec![spade(Rank::Five, 10), spade(Rank::Six, 11)],
            vec![spade(Rank::Seven, 20), spade(Rank::Three, 21)],
            vec![spade(Rank::Eight, 30), spade(Rank::Three, 31)],
        ]);

        let report = state.play_cards(0, &[0]).unwrap();
        assert!(report.seat_finished);
        assert!(report.hand_result.is_none());
        assert_eq!(state.finish_order, vec![0]);
        assert_eq!(state.current_turn, 1);

        state.pass(1).unwrap();
        state.pass(2).unwrap();
        assert!(state.pass(3).unwrap().lead_cleared);
        assert_eq!(state.current_turn, 2);
    }

    #[test]
    fn test_turn_skips_finished_seats() {
        let mut state = playing([
            vec![spade(Rank::Four, 0), spade(Rank::Three, 1)],
            vec![spade(Rank::Five, 10)],
            vec![spade(Rank::Seven, 20), spade(Rank::Three, 21)],
            vec![spade(Rank::Eight, 30), spade(Rank::Three, 31)],
        ]);

        state.play_cards(0, &[0]).unwrap();
        state.play_cards(1, &[10]).unwrap();
        assert_eq!(state.finish_order, vec![1]);
        state.play_cards(2, &[20]).unwrap();
        state.play_cards(3, &[30]).unwrap();
        // Seat 1 is out and gets skipped.
        assert_eq!(state.current_turn, 0);
        state.pass(0).unwrap();
        assert_eq!(state.current_turn, 2);
    }

    #[test]
    fn test_partners_out_first_ends_hand() {
        let mut state = playing([
            vec![spade(Rank::Five, 0)],
            vec![spade(Rank::Three, 10), spade(Rank::Four, 11)],
            vec![spade(Rank::Six, 20)],
            vec![spade(Rank::Three, 30), spade(Rank::Four, 31), spade(Rank::Nine, 32)],
        ]);

        state.play_cards(0, &[0]).unwrap();
        state.pass(1).unwrap();
        let report = state.play_cards(2, &[20]).unwrap();

        let result = report.hand_result.expect("hand should be over");
        assert_eq!(result.finish_order, vec![0, 2]);
        assert_eq!(result.level_advance, 4);
        assert_eq!(result.new_levels, [4, 0]);
        assert_eq!(state.phase, Phase::Deal);
        assert_eq!(state.tribute_leader, 0);
        // Seat 3 holds the most cards and places last.
        assert_eq!(state.tributes, vec![Tribute::new(3, 0), Tribute::new(1, 2)]);

        state.start_next_hand(&mut StdRng::seed_from_u64(9)).unwrap();
        assert_eq!(state.phase, Phase::Tribute);
        assert_eq!(state.level, Rank::Six);
        assert_eq!(state.hand_number, 1);
        assert!(state.finish_order.is_empty());
        assert_eq!(state.play_cards(0, &[0]).unwrap_err(), GameError::WrongPhase);
    }

    #[test]
    fn test_tribute_flow() {
        let level = Rank::Two;
        let mut state = playing([
            vec![spade(Rank::Four, 0)],
            vec![spade(Rank::Five, 10)],
            vec![spade(Rank::Six, 20)],
            vec![Card::new(Suit::Hearts, level, 30), spade(Rank::King, 31), spade(Rank::Four, 32)],
        ]);
        state.phase = Phase::Tribute;
        state.tributes = vec![Tribute::new(3, 0)];
        state.tribute_leader = 0;

        assert_eq!(state.give_tribute(1, 10).unwrap_err(), GameError::NoTributeOwed);
        assert_eq!(state.give_tribute(3, 99).unwrap_err(), GameError::InvalidCard);
        assert_eq!(state.give_tribute(3, 30).unwrap_err(), GameError::WildTribute);
        assert_eq!(state.give_tribute(3, 32).unwrap_err(), GameError::TributeNotHighest);
        assert_eq!(state.hands[3].len(), 3);

        let report = state.give_tribute(3, 31).unwrap();
        assert_eq!(report.to_seat, 0);
        assert!(report.tributes_complete);
        assert_eq!(state.hands[0].len(), 2);
        assert_eq!(state.hands[3].len(), 2);
        assert_eq!(state.phase, Phase::Play);
        assert_eq!(state.current_turn, 0);
        assert_eq!(state.give_tribute(3, 30).unwrap_err(), GameError::WrongPhase);
    }

    #[test]
    fn test_match_ends_from_ace() {
        let mut state = playing([
            vec![spade(Rank::Five, 0)],
            vec![spade(Rank::Three, 10), spade(Rank::Four, 11)],
            vec![spade(Rank::Six, 20)],
            vec![spade(Rank::Three, 30), spade(Rank::Four, 31)],
        ]);
        state.team_levels = [12, 3];
        state.level = Rank::Ace;

        state.play_cards(0, &[0]).unwrap();
        state.pass(1).unwrap();
        let result = state.play_cards(2, &[20]).unwrap().hand_result.unwrap();

        assert!(result.match_over);
        assert!(state.is_over());
        assert_eq!(state.start_next_hand(&mut StdRng::seed_from_u64(0)), Err(GameError::WrongPhase));
    }

    #[test]
    fn test_turn_seq_moves_with_turn() {
        let mut state = playing([
            vec![spade(Rank::Five, 0), spade(Rank::Three, 1)],
            vec![spade(Rank::Six, 10), spade(Rank::Three, 11)],
            vec![], vec![],
        ]);
        state.finish_order = vec![2, 3];
        let before = state.turn_seq;
        state.play_cards(0, &[0]).unwrap();
        assert_eq!(state.turn_seq, before + 1);
        assert_eq!(state.current_turn, 1);
    }
}

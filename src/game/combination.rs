//! Combination Detection
//!
//! Classifies a set of cards into a play type with a comparable strength.
//! Pure and total: anything unrecognized comes back as [`ComboType::Invalid`].
//!
//! ## Detection Order
//!
//! 1. Bombs (four jokers, straight flush, n-of-a-kind), see [`super::bomb`]
//! 2. By card count: 1 single, 2 pair, 3 triple,
//!    5 full house then straight, 6 tube then plate
//!
//! Heart cards of the level rank are wild and fill any shortfall
//! in non-bomb groupings.

use serde::{Serialize, Deserialize};

use crate::core::card::{count_ranks, Card, Rank, LEVEL_RANK_VALUE, RANK_COUNT};
use super::bomb::detect_bomb;

// =============================================================================
// TYPES
// =============================================================================

/// Play type of a combination.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComboType {
    /// Not a legal play
    Invalid,
    /// One card
    Single,
    /// Two cards of a rank
    Pair,
    /// Three cards of a rank
    Triple,
    /// Triple plus pair
    FullHouse,
    /// Five consecutive ranks
    Straight,
    /// Three consecutive pairs
    Tube,
    /// Two consecutive triples
    Plate,
    /// Any bomb
    Bomb,
}

impl ComboType {
    /// Wire name of the type.
    pub fn name(self) -> &'static str {
        match self {
            ComboType::Invalid => "invalid",
            ComboType::Single => "single",
            ComboType::Pair => "pair",
            ComboType::Triple => "triple",
            ComboType::FullHouse => "full_house",
            ComboType::Straight => "straight",
            ComboType::Tube => "tube",
            ComboType::Plate => "plate",
            ComboType::Bomb => "bomb",
        }
    }
}

/// A classified, ranked set of cards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combination {
    /// Play type
    pub combo_type: ComboType,
    /// Cards making up the play
    pub cards: Vec<Card>,
    /// Strength against the same type and size
    pub rank_value: u32,
    /// Strength against other bombs (0 for non-bombs)
    pub bomb_power: u32,
}

impl Combination {
    /// The invalid combination.
    pub fn invalid() -> Self {
        Self {
            combo_type: ComboType::Invalid,
            cards: Vec::new(),
            rank_value: 0,
            bomb_power: 0,
        }
    }

    fn ranked(combo_type: ComboType, cards: &[Card], rank_value: u32) -> Self {
        Self {
            combo_type,
            cards: cards.to_vec(),
            rank_value,
            bomb_power: 0,
        }
    }

    /// A bomb with the given power.
    pub fn bomb(cards: &[Card], bomb_power: u32) -> Self {
        Self {
            combo_type: ComboType::Bomb,
            cards: cards.to_vec(),
            rank_value: 0,
            bomb_power,
        }
    }

    /// Is this a legal play?
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.combo_type != ComboType::Invalid
    }

    /// Is this a bomb?
    #[inline]
    pub fn is_bomb(&self) -> bool {
        self.combo_type == ComboType::Bomb
    }

    /// Number of cards.
    #[inline]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Empty (only the invalid combination).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

// =============================================================================
// GROUPING
// =============================================================================

/// Per-rank view of a card set with wilds set aside.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Grouping {
    /// Counts of non-wild cards per rank.
    pub counts: [u8; RANK_COUNT],
    /// Number of non-wild cards.
    pub natural: usize,
    /// Number of wild cards.
    pub wilds: usize,
}

impl Grouping {
    pub fn of(cards: &[Card], level: Rank) -> Self {
        let natural: Vec<Card> = cards.iter()
            .copied()
            .filter(|c| !c.is_wild(level))
            .collect();

        Self {
            counts: count_ranks(&natural),
            natural: natural.len(),
            wilds: cards.len() - natural.len(),
        }
    }

    #[inline]
    pub fn count(&self, rank: Rank) -> u8 {
        self.counts[rank.index()]
    }

    pub fn has_joker(&self) -> bool {
        self.count(Rank::BlackJoker) > 0 || self.count(Rank::RedJoker) > 0
    }

    /// Ranks present among non-wild cards, highest value first.
    pub fn ranks_by_value(&self, level: Rank) -> Vec<Rank> {
        let mut ranks: Vec<Rank> = (0..RANK_COUNT as u8)
            .filter_map(Rank::from_index)
            .filter(|r| self.count(*r) > 0)
            .collect();
        ranks.sort_by(|a, b| b.value(level).cmp(&a.value(level)));
        ranks
    }

    /// Lowest run of `width` consecutive ranks, `copies` cards each,
    /// that every non-wild card fits into with wilds filling the gaps.
    ///
    /// Returns the top rank of that window.
    pub fn lowest_run(&self, width: usize, copies: u8) -> Option<Rank> {
        if self.has_joker() || width == 0 || width > Rank::RUN_ORDER.len() {
            return None;
        }

        Rank::RUN_ORDER
            .windows(width)
            .find(|window| self.fits_window(window, copies))
            .and_then(|window| window.last().copied())
    }

    fn fits_window(&self, window: &[Rank], copies: u8) -> bool {
        let mut seen = [false; RANK_COUNT];
        let mut covered = 0usize;
        let mut shortfall = 0usize;

        for rank in window {
            // Ace can open and close the same 14-wide window; the second
            // slot has to come from wilds.
            if seen[rank.index()] {
                shortfall += copies as usize;
                continue;
            }
            seen[rank.index()] = true;

            let count = self.count(*rank);
            if count > copies {
                return false;
            }
            covered += count as usize;
            shortfall += (copies - count) as usize;
        }

        covered == self.natural && shortfall <= self.wilds
    }
}

// =============================================================================
// CLASSIFICATION
// =============================================================================

/// Classify `cards` under the wild `level`.
pub fn classify(cards: &[Card], level: Rank) -> Combination {
    if cards.is_empty() {
        return Combination::invalid();
    }

    if let Some(bomb) = detect_bomb(cards, level) {
        return bomb;
    }

    let groups = Grouping::of(cards, level);

    let detected = match cards.len() {
        1 => same_rank(&groups, level, 1).map(|v| (ComboType::Single, v)),
        2 => same_rank(&groups, level, 2).map(|v| (ComboType::Pair, v)),
        3 => same_rank(&groups, level, 3).map(|v| (ComboType::Triple, v)),
        5 => full_house(&groups, level)
            .map(|v| (ComboType::FullHouse, v))
            .or_else(|| run_value(&groups, 5, 1).map(|v| (ComboType::Straight, v))),
        6 => run_value(&groups, 3, 2)
            .map(|v| (ComboType::Tube, v))
            .or_else(|| run_value(&groups, 2, 3).map(|v| (ComboType::Plate, v))),
        _ => None,
    };

    match detected {
        Some((combo_type, rank_value)) => Combination::ranked(combo_type, cards, rank_value),
        None => Combination::invalid(),
    }
}

/// Singles, pairs and triples: every non-wild card shares one rank.
///
/// Jokers only stand alone or as a natural pair; wilds never join them.
fn same_rank(groups: &Grouping, level: Rank, size: usize) -> Option<u32> {
    if groups.natural + groups.wilds != size {
        return None;
    }
    if groups.natural == 0 {
        return Some(LEVEL_RANK_VALUE);
    }

    let ranks = groups.ranks_by_value(level);
    let [rank] = ranks.as_slice() else {
        return None;
    };

    if rank.is_joker() && (groups.wilds > 0 || size > 2) {
        return None;
    }

    Some(rank.value(level))
}

/// Triple plus pair. Triple candidates are tried highest value first,
/// and wilds complete the triple before the pair.
fn full_house(groups: &Grouping, level: Rank) -> Option<u32> {
    if groups.has_joker() || groups.natural + groups.wilds != 5 {
        return None;
    }

    let ranks = groups.ranks_by_value(level);
    for &triple in &ranks {
        let have = groups.count(triple) as usize;
        if have > 3 || 3 - have > groups.wilds {
            continue;
        }
        let remaining = groups.wilds - (3 - have);

        let others: Vec<Rank> = ranks.iter().copied().filter(|r| *r != triple).collect();
        let fits = match others.as_slice() {
            [] => remaining >= 2,
            [pair] => {
                let have_pair = groups.count(*pair) as usize;
                have_pair <= 2 && 2 - have_pair <= remaining
            }
            _ => false,
        };

        if fits {
            return Some(triple.value(level));
        }
    }

    None
}

/// Straights, tubes and plates rank by the natural value of their top rank.
fn run_value(groups: &Grouping, width: usize, copies: u8) -> Option<u32> {
    if groups.natural + groups.wilds != width * copies as usize {
        return None;
    }
    groups.lowest_run(width, copies).and_then(Rank::natural_value)
}

// =============================================================================
// COMPARISON
// =============================================================================

/// Does `candidate` beat `lead`?
///
/// Bombs beat everything that is not a bomb and compare among themselves by
/// power. Everything else needs the same type, the same size and a strictly
/// higher rank value.
pub fn can_beat(candidate: &Combination, lead: &Combination) -> bool {
    if !candidate.is_valid() {
        return false;
    }

    match (candidate.is_bomb(), lead.is_bomb()) {
        (true, false) => true,
        (true, true) => candidate.bomb_power > lead.bomb_power,
        (false, true) => false,
        (false, false) => {
            candidate.combo_type == lead.combo_type
                && candidate.len() == lead.len()
                && candidate.rank_value > lead.rank_value
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

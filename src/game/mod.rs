//! Game Logic Module
//!
//! Rules of play. Everything here is synchronous and free of I/O;
//! the room actor in `network::room` drives it.
//!
//! ## Module Structure
//!
//! - `combination`: Classifying and comparing plays
//! - `bomb`: Bomb detection and power
//! - `state`: Match state and its validated mutators
//! - `settle`: Hand end, level advance, tribute setup
//! - `bot`: Greedy bot policy

pub mod combination;
pub mod bomb;
pub mod state;
pub mod settle;
pub mod bot;

// Re-export key types
pub use combination::{classify, can_beat, Combination, ComboType};
pub use state::{GameError, GameState, Phase, Seat, Tribute, team_of, partner_of};
pub use settle::HandResult;
pub use bot::BotMove;

//! # Guandan Game Server
//!
//! Authoritative rules server for four-player Guandan, played as two
//! fixed partnerships with two decks.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      GUANDAN SERVER                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/            - Card primitives                          │
//! │  ├── card.rs      - Suits, ranks, level-relative values      │
//! │  └── deck.rs      - 108-card double deck, shuffle and deal   │
//! │                                                              │
//! │  game/            - Rules (synchronous, no I/O)              │
//! │  ├── combination.rs - Play classification and comparison     │
//! │  ├── bomb.rs      - Bomb detection and power                 │
//! │  ├── state.rs     - Turn order, passes, tribute              │
//! │  ├── settle.rs    - Hand end and level advance               │
//! │  └── bot.rs       - Greedy bot policy                        │
//! │                                                              │
//! │  network/         - Networking                               │
//! │  ├── protocol.rs  - JSON message envelopes                   │
//! │  ├── client.rs    - Per-client outbound queue                │
//! │  ├── room.rs      - Room actor (one task per table)          │
//! │  ├── directory.rs - Room code registry                       │
//! │  └── server.rs    - WebSocket server                         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//!
//! Each room's state is owned by a single task that applies commands from
//! its mailbox in arrival order. Connections never touch game state
//! directly; they post commands and receive messages on their own bounded
//! outbound queue.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod network;

// Re-export commonly used types
pub use core::card::{Card, CardId, Rank, Suit};
pub use core::deck::Deck;
pub use game::combination::{classify, can_beat, Combination, ComboType};
pub use game::state::{GameError, GameState, Phase};
pub use network::server::{GameServer, ServerConfig};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

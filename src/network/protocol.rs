//! Protocol Messages
//!
//! Wire format for client-server communication over WebSocket.
//! Every frame is a JSON envelope `{"type": ..., "payload": {...}}`.

use serde::{Serialize, Deserialize};

use crate::core::card::{Card, CardId, Rank};
use crate::game::combination::ComboType;
use crate::game::state::Seat;

/// Client identifier (uuid v4, simple form).
pub type ClientId = String;

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Open a new room and sit in it.
    CreateRoom {
        /// Display name
        player_name: String,
    },

    /// Sit in an existing room.
    JoinRoom {
        /// Room code
        room_id: String,
        /// Display name
        player_name: String,
    },

    /// Play cards from hand.
    PlayCards {
        /// Ids of the cards to play
        card_ids: Vec<CardId>,
    },

    /// Pass on the current lead.
    Pass {},

    /// Pay tribute.
    TributeGive {
        /// Id of the card to hand over
        card_id: CardId,
    },

    /// Fill empty seats with bots.
    FillBots {},
}

impl ClientMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from server to client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Room membership, sent to each member with their own id.
    RoomState(RoomStateInfo),

    /// Private hand at the start of a hand.
    DealCards(DealInfo),

    /// Whose turn it is.
    Turn(TurnInfo),

    /// A play or a pass.
    PlayMade(PlayMadeInfo),

    /// Hand settled.
    HandEnd(HandEndInfo),

    /// Tribute owed, sent to the paying seat.
    Tribute {
        /// Paying seat
        from_seat: Seat,
        /// Receiving seat
        to_seat: Seat,
    },

    /// Tribute received, sent to the receiving seat.
    TributeRecv {
        /// The card
        card: Card,
    },

    /// Match over.
    GameEnd {
        /// Winning team
        winning_team: usize,
        /// Team levels at the end
        final_levels: [u8; 2],
    },

    /// Someone left the room.
    PlayerLeft {
        /// Client id
        id: ClientId,
        /// Display name
        name: String,
        /// Seat they held
        seat: Seat,
    },

    /// Rejected action.
    Error {
        /// Human-readable reason
        message: String,
    },
}

impl ServerMessage {
    /// Error message from anything displayable.
    pub fn error(message: impl std::fmt::Display) -> Self {
        ServerMessage::Error { message: message.to_string() }
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

/// A seated player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    /// Client id (`bot-N` for bots)
    pub id: ClientId,
    /// Display name
    pub name: String,
    /// Seat index
    pub seat: Seat,
    /// Team (seat mod 2)
    pub team: usize,
    /// Seated and ready to play
    pub is_ready: bool,
    /// Driven by the server
    pub is_bot: bool,
}

/// Room membership snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomStateInfo {
    /// Room code
    pub room_id: String,
    /// Occupied seats
    pub players: Vec<PlayerInfo>,
    /// A match is running
    pub game_active: bool,
    /// The recipient's own id
    pub your_id: ClientId,
}

/// A dealt hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealInfo {
    /// Cards in hand
    pub cards: Vec<Card>,
    /// Wild level of the hand
    pub level: Rank,
}

/// Turn notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnInfo {
    /// Id of the player to act
    pub player_id: ClientId,
    /// Seat to act
    pub seat: Seat,
    /// A lead is on the table
    pub can_pass: bool,
}

/// A play broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayMadeInfo {
    /// Id of the acting player
    pub player_id: ClientId,
    /// Acting seat
    pub seat: Seat,
    /// Cards played (empty on a pass)
    pub cards: Vec<Card>,
    /// Play type (absent on a pass)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combo_type: Option<ComboType>,
    /// This was a pass
    pub is_pass: bool,
}

/// Hand settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandEndInfo {
    /// Ids of the finishers in order
    pub finish_order: Vec<ClientId>,
    /// Winning team
    pub winning_team: usize,
    /// Levels credited
    pub level_advance: u8,
    /// Team levels after the hand
    pub new_levels: [u8; 2],
}

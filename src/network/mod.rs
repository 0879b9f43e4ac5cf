//! Network Layer
//!
//! WebSocket transport, wire protocol, and the room actors that own each
//! table's game state. Rule logic lives in `game/`.

pub mod protocol;
pub mod client;
pub mod room;
pub mod directory;
pub mod server;

pub use protocol::{
    ClientId, ClientMessage, ServerMessage, PlayerInfo, RoomStateInfo, DealInfo,
    TurnInfo, PlayMadeInfo, HandEndInfo,
};
pub use client::{ClientHandle, new_client_id};
pub use room::{Room, RoomCommand, RoomConfig, RoomError, RoomHandle, RoomId};
pub use directory::{RoomDirectory, generate_room_code};
pub use server::{GameServer, ServerConfig, ServerError};

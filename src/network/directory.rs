//! Room Directory
//!
//! Maps room codes to running room actors. Rooms unregister themselves
//! when their actor stops.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use super::room::{Room, RoomConfig, RoomHandle, RoomId};

/// Length of a room code in random bytes (hex doubles it).
pub const ROOM_CODE_BYTES: usize = 3;

/// Generate a room code: 3 random bytes, lower-case hex.
pub fn generate_room_code() -> RoomId {
    hex::encode(rand::random::<[u8; ROOM_CODE_BYTES]>())
}

/// Registry of live rooms.
pub struct RoomDirectory {
    /// Live rooms by code.
    rooms: RwLock<BTreeMap<RoomId, RoomHandle>>,
    /// Settings for new rooms.
    config: RoomConfig,
}

impl RoomDirectory {
    /// Create an empty directory.
    pub fn new(config: RoomConfig) -> Self {
        Self {
            rooms: RwLock::new(BTreeMap::new()),
            config,
        }
    }

    /// Open a room under a fresh code and spawn its actor.
    pub async fn create_room(self: &Arc<Self>) -> RoomHandle {
        let handle = {
            let mut rooms = self.rooms.write().await;
            let id = loop {
                let code = generate_room_code();
                if !rooms.contains_key(&code) {
                    break code;
                }
            };

            let (room, handle) = Room::new(id.clone(), self.config.clone());
            rooms.insert(id.clone(), handle.clone());

            let directory = Arc::downgrade(self);
            tokio::spawn(async move {
                room.run().await;
                if let Some(directory) = directory.upgrade() {
                    directory.remove(&id).await;
                }
            });

            handle
        };

        info!(room = %handle.id(), "Room created");
        handle
    }

    /// Look up a room.
    pub async fn get(&self, id: &str) -> Option<RoomHandle> {
        let rooms = self.rooms.read().await;
        rooms.get(id).cloned()
    }

    /// Forget a room.
    pub async fn remove(&self, id: &str) {
        let mut rooms = self.rooms.write().await;
        if rooms.remove(id).is_some() {
            debug!(room = %id, "Room removed");
        }
    }

    /// Live room count.
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}

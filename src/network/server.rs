//! WebSocket Game Server
//!
//! Async WebSocket server for table connections.
//! Each connection gets a reader loop and a writer task; decoded messages
//! are routed to the room directory or to the connection's room actor.

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, instrument, warn};

use super::client::{new_client_id, ClientHandle};
use super::directory::RoomDirectory;
use super::protocol::{ClientMessage, ServerMessage};
use super::room::{RoomCommand, RoomConfig, RoomError, RoomHandle};

/// Default listening port.
pub const DEFAULT_PORT: u16 = 8080;

/// Reply to frames that are not a known client message.
pub const INVALID_MESSAGE: &str = "invalid message format";

// =============================================================================
// CONFIG
// =============================================================================

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Per-client outbound queue capacity.
    pub outbox_capacity: usize,
    /// Settings for new rooms.
    pub room: RoomConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            max_connections: 1000,
            outbox_capacity: 256,
            room: RoomConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Create config from environment variables.
    ///
    /// `GUANDAN_BIND` takes a full socket address and wins over `PORT`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let port = env_or("PORT", DEFAULT_PORT);

        Self {
            bind_addr: env_or("GUANDAN_BIND", SocketAddr::from(([0, 0, 0, 0], port))),
            max_connections: env_or("GUANDAN_MAX_CONNECTIONS", defaults.max_connections),
            outbox_capacity: env_or("GUANDAN_OUTBOX_CAPACITY", defaults.outbox_capacity),
            room: RoomConfig {
                bot_delay: std::env::var("GUANDAN_BOT_DELAY_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.room.bot_delay),
                ..defaults.room
            },
        }
    }
}

/// Parse an env var, falling back when unset or malformed.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// =============================================================================
// ERRORS
// =============================================================================

/// Game server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Connection limit reached.
    #[error("Connection limit reached")]
    ConnectionLimitReached,
}

// =============================================================================
// CONNECTIONS
// =============================================================================

/// One connection's routing state.
struct Connection {
    client: ClientHandle,
    room: Option<RoomHandle>,
}

impl Connection {
    fn reply(&self, message: ServerMessage) {
        self.client.send(message);
    }

    async fn route(&mut self, message: ClientMessage, rooms: &Arc<RoomDirectory>) {
        match message {
            ClientMessage::CreateRoom { player_name } => {
                if self.room.is_some() {
                    self.reply(ServerMessage::error(RoomError::AlreadySeated));
                    return;
                }
                self.client.name = player_name;
                let room = rooms.create_room().await;
                self.enter(room).await;
            }
            ClientMessage::JoinRoom { room_id, player_name } => {
                if self.room.is_some() {
                    self.reply(ServerMessage::error(RoomError::AlreadySeated));
                    return;
                }
                let Some(room) = rooms.get(&room_id).await else {
                    self.reply(ServerMessage::error(RoomError::NotFound));
                    return;
                };
                self.client.name = player_name;
                self.enter(room).await;
            }
            ClientMessage::PlayCards { card_ids } => {
                let command = RoomCommand::Play { client: self.client.clone(), card_ids };
                self.forward(command).await;
            }
            ClientMessage::Pass {} => {
                let command = RoomCommand::Pass { client: self.client.clone() };
                self.forward(command).await;
            }
            ClientMessage::TributeGive { card_id } => {
                let command = RoomCommand::Tribute { client: self.client.clone(), card_id };
                self.forward(command).await;
            }
            ClientMessage::FillBots {} => {
                let command = RoomCommand::FillBots { client: self.client.clone() };
                self.forward(command).await;
            }
        }
    }

    async fn enter(&mut self, room: RoomHandle) {
        match room.join(self.client.clone()).await {
            Ok(seat) => {
                debug!(client = %self.client.id, room = %room.id(), seat, "Seated");
                self.room = Some(room);
            }
            Err(e) => self.reply(ServerMessage::error(e)),
        }
    }

    async fn forward(&mut self, command: RoomCommand) {
        let Some(room) = &self.room else {
            self.reply(ServerMessage::error(RoomError::NotInRoom));
            return;
        };
        let result = room.send(command).await;
        if let Err(e) = result {
            self.room = None;
            self.reply(ServerMessage::error(e));
        }
    }

    async fn disconnect(&mut self) {
        if let Some(room) = self.room.take() {
            let _ = room.send(RoomCommand::Leave { client_id: self.client.id.clone() }).await;
        }
    }
}

// =============================================================================
// SERVER
// =============================================================================

/// The game server.
pub struct GameServer {
    /// Server configuration.
    config: ServerConfig,
    /// Live rooms.
    rooms: Arc<RoomDirectory>,
    /// Open connections.
    connections: Arc<AtomicUsize>,
    /// Shutdown signal.
    shutdown_tx: broadcast::Sender<()>,
}

impl GameServer {
    /// Create a new game server.
    pub fn new(config: ServerConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            rooms: Arc::new(RoomDirectory::new(config.room.clone())),
            config,
            connections: Arc::new(AtomicUsize::new(0)),
            shutdown_tx,
        }
    }

    /// Bind the configured address and run the server.
    pub async fn run(&self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        self.serve(listener).await
    }

    /// Accept connections on `listener` until shutdown.
    #[instrument(skip(self, listener))]
    pub async fn serve(&self, listener: TcpListener) -> Result<(), ServerError> {
        info!("Game server listening on {}", listener.local_addr()?);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            if self.connections.load(Ordering::SeqCst) >= self.config.max_connections {
                                warn!("{}, rejecting {}", ServerError::ConnectionLimitReached, addr);
                                continue;
                            }

                            info!("New connection from {}", addr);
                            self.handle_connection(stream, addr);
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Handle a new WebSocket connection.
    fn handle_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let rooms = self.rooms.clone();
        let connections = self.connections.clone();
        let outbox_capacity = self.config.outbox_capacity.max(1);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        connections.fetch_add(1, Ordering::SeqCst);

        tokio::spawn(async move {
            let ws_stream = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    error!("WebSocket handshake failed for {}: {}", addr, e);
                    connections.fetch_sub(1, Ordering::SeqCst);
                    return;
                }
            };

            let (mut ws_sender, mut ws_receiver) = ws_stream.split();
            let (msg_tx, mut msg_rx) = mpsc::channel::<ServerMessage>(outbox_capacity);

            let mut connection = Connection {
                client: ClientHandle::new(new_client_id(), String::new(), msg_tx),
                room: None,
            };
            debug!("Client {} connected as {}", addr, connection.client.id);

            // Spawn message sender task
            let sender_task = tokio::spawn(async move {
                while let Some(msg) = msg_rx.recv().await {
                    let text = match msg.to_json() {
                        Ok(t) => t,
                        Err(e) => {
                            error!("Failed to serialize message: {}", e);
                            continue;
                        }
                    };
                    if ws_sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
            });

            // Handle incoming messages
            loop {
                tokio::select! {
                    msg = ws_receiver.next() => {
                        match msg {
                            Some(Ok(Message::Text(text))) => {
                                match ClientMessage::from_json(&text) {
                                    Ok(client_msg) => connection.route(client_msg, &rooms).await,
                                    Err(e) => {
                                        debug!("Invalid message from {}: {}", addr, e);
                                        connection.reply(ServerMessage::error(INVALID_MESSAGE));
                                    }
                                }
                            }
                            Some(Ok(Message::Binary(_))) => {
                                connection.reply(ServerMessage::error(INVALID_MESSAGE));
                            }
                            Some(Ok(Message::Close(_))) | None => {
                                debug!("Client {} disconnected", addr);
                                break;
                            }
                            Some(Err(e)) => {
                                warn!("WebSocket error for {}: {}", addr, e);
                                break;
                            }
                            _ => {}
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }

            // Cleanup
            connection.disconnect().await;
            sender_task.abort();
            connections.fetch_sub(1, Ordering::SeqCst);

            info!("Client {} cleaned up", addr);
        });
    }

    /// Shutdown the server.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Get active connection count.
    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Get live room count.
    pub async fn room_count(&self) -> usize {
        self.rooms.room_count().await
    }
}

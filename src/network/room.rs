//! Room Actor
//!
//! One task per room. Commands arrive through a bounded mailbox and are
//! applied to the room's [`GameState`] strictly in arrival order; nothing
//! else ever touches it.
//!
//! Bots think on spawned timers that post a [`RoomCommand::BotTurn`] back
//! into the mailbox, so the room loop itself never sleeps.

use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::core::card::CardId;
use crate::core::deck::SEAT_COUNT;
use crate::game::bot::{self, BotMove};
use crate::game::settle::HandResult;
use crate::game::state::{team_of, GameError, GameState, Phase, PlayReport, Seat, Tribute};
use super::client::ClientHandle;
use super::protocol::{
    ClientId, ServerMessage, PlayerInfo, RoomStateInfo, DealInfo, TurnInfo,
    PlayMadeInfo, HandEndInfo,
};

/// Room code.
pub type RoomId = String;

// =============================================================================
// CONFIG
// =============================================================================

/// Per-room settings.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// Bot thinking time before each move.
    pub bot_delay: Duration,
    /// Mailbox capacity.
    pub mailbox_capacity: usize,
    /// Fixed shuffle seed (tests and replays). `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            bot_delay: Duration::from_millis(800),
            mailbox_capacity: 64,
            seed: None,
        }
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Room-level rejections. Display strings are sent to clients as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    /// Rule violation from the game state.
    #[error(transparent)]
    Game(#[from] GameError),

    /// Every seat is taken.
    #[error("room is full")]
    Full,

    /// Client already holds a seat here.
    #[error("already in this room")]
    AlreadySeated,

    /// Client holds no seat here.
    #[error("not in this room")]
    NotInRoom,

    /// Seats can no longer change.
    #[error("game already started")]
    AlreadyStarted,

    /// No match running.
    #[error("game not active")]
    NotActive,

    /// Unknown room code.
    #[error("room not found")]
    NotFound,

    /// The room's actor has stopped.
    #[error("room is closed")]
    Closed,
}

// =============================================================================
// COMMANDS
// =============================================================================

/// Mailbox commands.
#[derive(Debug)]
pub enum RoomCommand {
    /// Take the first empty seat.
    Join {
        /// Joining client
        client: ClientHandle,
        /// Seat taken, or why not
        reply: oneshot::Sender<Result<Seat, RoomError>>,
    },
    /// Give up a seat.
    Leave {
        /// Leaving client
        client_id: ClientId,
    },
    /// Play cards.
    Play {
        /// Acting client
        client: ClientHandle,
        /// Cards to play
        card_ids: Vec<CardId>,
    },
    /// Pass.
    Pass {
        /// Acting client
        client: ClientHandle,
    },
    /// Pay tribute.
    Tribute {
        /// Acting client
        client: ClientHandle,
        /// Card to hand over
        card_id: CardId,
    },
    /// Fill empty seats with bots.
    FillBots {
        /// Requesting client
        client: ClientHandle,
    },
    /// A bot's thinking time is up.
    BotTurn {
        /// Bot seat
        seat: Seat,
        /// Turn sequence when scheduled
        sequence: u64,
    },
}

/// Sending side of a room's mailbox.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// Room code.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Post a command.
    pub async fn send(&self, command: RoomCommand) -> Result<(), RoomError> {
        self.sender.send(command).await.map_err(|_| RoomError::Closed)
    }

    /// Join and wait for the seat assignment.
    pub async fn join(&self, client: ClientHandle) -> Result<Seat, RoomError> {
        let (reply, response) = oneshot::channel();
        self.send(RoomCommand::Join { client, reply }).await?;
        response.await.map_err(|_| RoomError::Closed)?
    }

    /// Has the actor stopped?
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

// =============================================================================
// ROOM
// =============================================================================

#[derive(Debug, Clone)]
enum Occupant {
    Human(ClientHandle),
    Bot { id: ClientId, name: String },
}

impl Occupant {
    fn bot(seat: Seat) -> Self {
        Occupant::Bot {
            id: format!("bot-{}", seat),
            name: format!("Bot {}", seat + 1),
        }
    }

    fn id(&self) -> &str {
        match self {
            Occupant::Human(client) => &client.id,
            Occupant::Bot { id, .. } => id,
        }
    }

    fn name(&self) -> &str {
        match self {
            Occupant::Human(client) => &client.name,
            Occupant::Bot { name, .. } => name,
        }
    }

    fn human(&self) -> Option<&ClientHandle> {
        match self {
            Occupant::Human(client) => Some(client),
            Occupant::Bot { .. } => None,
        }
    }
}

/// A room and its match.
pub struct Room {
    id: RoomId,
    config: RoomConfig,
    seats: [Option<Occupant>; SEAT_COUNT],
    game: Option<GameState>,
    inbox: mpsc::Receiver<RoomCommand>,
    mailbox: mpsc::WeakSender<RoomCommand>,
    rng: StdRng,
}

impl Room {
    /// Create a room and the handle that feeds it.
    pub fn new(id: RoomId, config: RoomConfig) -> (Self, RoomHandle) {
        let (sender, inbox) = mpsc::channel(config.mailbox_capacity.max(1));
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let room = Self {
            id: id.clone(),
            config,
            seats: Default::default(),
            game: None,
            inbox,
            mailbox: sender.downgrade(),
            rng,
        };

        (room, RoomHandle { id, sender })
    }

    /// Room code.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current match, if one was started.
    pub fn game(&self) -> Option<&GameState> {
        self.game.as_ref()
    }

    /// Process commands until no human is left.
    pub async fn run(mut self) {
        info!(room = %self.id, "Room opened");

        while let Some(command) = self.inbox.recv().await {
            self.handle(command);
            if self.human_count() == 0 {
                break;
            }
        }

        info!(room = %self.id, "Room closed");
    }

    /// Apply one command.
    pub fn handle(&mut self, command: RoomCommand) {
        match command {
            RoomCommand::Join { client, reply } => {
                let result = self.join(client);
                let _ = reply.send(result);
            }
            RoomCommand::Leave { client_id } => self.leave(&client_id),
            RoomCommand::Play { client, card_ids } => {
                let result = self.seat_of(&client.id).and_then(|seat| self.play(seat, &card_ids));
                self.reject(&client, result);
            }
            RoomCommand::Pass { client } => {
                let result = self.seat_of(&client.id).and_then(|seat| self.pass(seat));
                self.reject(&client, result);
            }
            RoomCommand::Tribute { client, card_id } => {
                let result = self.seat_of(&client.id).and_then(|seat| self.tribute(seat, card_id));
                self.reject(&client, result);
            }
            RoomCommand::FillBots { client } => {
                let result = self.fill_bots(&client);
                self.reject(&client, result);
            }
            RoomCommand::BotTurn { seat, sequence } => self.bot_turn(seat, sequence),
        }
    }

    fn reject(&self, client: &ClientHandle, result: Result<(), RoomError>) {
        if let Err(e) = result {
            debug!(room = %self.id, client = %client.id, error = %e, "Action rejected");
            client.send(ServerMessage::error(&e));
        }
    }

    // =========================================================================
    // SEATS
    // =========================================================================

    fn seat_of(&self, client_id: &str) -> Result<Seat, RoomError> {
        self.seats.iter()
            .position(|slot| matches!(slot, Some(Occupant::Human(c)) if c.id == client_id))
            .ok_or(RoomError::NotInRoom)
    }

    fn is_bot(&self, seat: Seat) -> bool {
        matches!(self.seats[seat], Some(Occupant::Bot { .. }))
    }

    fn human_count(&self) -> usize {
        self.seats.iter()
            .flatten()
            .filter(|o| o.human().is_some())
            .count()
    }

    fn player_id(&self, seat: Seat) -> ClientId {
        self.seats[seat].as_ref()
            .map(|o| o.id().to_string())
            .unwrap_or_default()
    }

    fn game_active(&self) -> bool {
        self.game.as_ref().is_some_and(|g| !g.is_over())
    }

    fn active_game_mut(&mut self) -> Result<&mut GameState, RoomError> {
        self.game.as_mut()
            .filter(|g| !g.is_over())
            .ok_or(RoomError::NotActive)
    }

    fn join(&mut self, client: ClientHandle) -> Result<Seat, RoomError> {
        if self.seat_of(&client.id).is_ok() {
            return Err(RoomError::AlreadySeated);
        }
        let seat = self.seats.iter()
            .position(Option::is_none)
            .ok_or(RoomError::Full)?;

        info!(room = %self.id, client = %client.id, name = %client.name, seat, "Player joined");
        self.seats[seat] = Some(Occupant::Human(client));

        self.broadcast_room_state();
        self.start_if_full();
        Ok(seat)
    }

    fn leave(&mut self, client_id: &str) {
        let Ok(seat) = self.seat_of(client_id) else {
            return;
        };
        let Some(occupant) = self.seats[seat].take() else {
            return;
        };

        let active = self.game_active();
        info!(room = %self.id, client = %client_id, seat, bot_takeover = active, "Player left");
        if active {
            self.seats[seat] = Some(Occupant::bot(seat));
        }

        self.broadcast(ServerMessage::PlayerLeft {
            id: occupant.id().to_string(),
            name: occupant.name().to_string(),
            seat,
        });
        self.broadcast_room_state();

        if active {
            self.schedule_bots();
        }
    }

    fn fill_bots(&mut self, client: &ClientHandle) -> Result<(), RoomError> {
        self.seat_of(&client.id)?;
        if self.game_active() {
            return Err(RoomError::AlreadyStarted);
        }

        for (seat, slot) in self.seats.iter_mut().enumerate() {
            if slot.is_none() {
                *slot = Some(Occupant::bot(seat));
            }
        }
        info!(room = %self.id, "Empty seats filled with bots");

        self.broadcast_room_state();
        self.start_if_full();
        Ok(())
    }

    // =========================================================================
    // MATCH FLOW
    // =========================================================================

    fn start_if_full(&mut self) {
        if self.seats.iter().all(Option::is_some) && !self.game_active() {
            self.start_game();
        }
    }

    fn start_game(&mut self) {
        let mut game = GameState::new();
        game.start_match(&mut self.rng);
        info!(room = %self.id, level = ?game.level, "Match started");
        self.game = Some(game);

        self.broadcast_room_state();
        self.deal_hands();
        self.announce_turn();
        self.schedule_bots();
    }

    fn play(&mut self, seat: Seat, card_ids: &[CardId]) -> Result<(), RoomError> {
        let report = self.active_game_mut()?.play_cards(seat, card_ids)?;
        self.after_play(report);
        Ok(())
    }

    fn after_play(&mut self, report: PlayReport) {
        let PlayReport { seat, combo, seat_finished, hand_result } = report;
        debug!(room = %self.id, seat, combo = combo.combo_type.name(), "Cards played");

        self.broadcast(ServerMessage::PlayMade(PlayMadeInfo {
            player_id: self.player_id(seat),
            seat,
            cards: combo.cards,
            combo_type: Some(combo.combo_type),
            is_pass: false,
        }));

        if seat_finished {
            debug!(room = %self.id, seat, "Seat finished");
        }

        match hand_result {
            Some(result) => self.finish_hand(result),
            None => self.announce_turn(),
        }
        self.schedule_bots();
    }

    fn pass(&mut self, seat: Seat) -> Result<(), RoomError> {
        let report = self.active_game_mut()?.pass(seat)?;
        if report.lead_cleared {
            debug!(room = %self.id, "Everyone passed, lead cleared");
        }

        self.broadcast(ServerMessage::PlayMade(PlayMadeInfo {
            player_id: self.player_id(seat),
            seat,
            cards: Vec::new(),
            combo_type: None,
            is_pass: true,
        }));

        self.announce_turn();
        self.schedule_bots();
        Ok(())
    }

    fn tribute(&mut self, seat: Seat, card_id: CardId) -> Result<(), RoomError> {
        let report = self.active_game_mut()?.give_tribute(seat, card_id)?;
        debug!(room = %self.id, from = report.from_seat, to = report.to_seat, "Tribute paid");

        self.send_to_seat(report.to_seat, ServerMessage::TributeRecv { card: report.card });

        if report.tributes_complete {
            self.announce_turn();
        }
        self.schedule_bots();
        Ok(())
    }

    fn finish_hand(&mut self, result: HandResult) {
        info!(
            room = %self.id,
            winning_team = result.winning_team,
            level_advance = result.level_advance,
            levels = ?result.new_levels,
            "Hand finished"
        );

        let finish_order = result.finish_order.iter().map(|&s| self.player_id(s)).collect();
        self.broadcast(ServerMessage::HandEnd(HandEndInfo {
            finish_order,
            winning_team: result.winning_team,
            level_advance: result.level_advance,
            new_levels: result.new_levels,
        }));

        if result.match_over {
            info!(room = %self.id, winning_team = result.winning_team, "Match finished");
            self.broadcast(ServerMessage::GameEnd {
                winning_team: result.winning_team,
                final_levels: result.new_levels,
            });
            self.broadcast_room_state();
            return;
        }

        let Some(game) = self.game.as_mut() else {
            return;
        };
        if let Err(e) = game.start_next_hand(&mut self.rng) {
            error!(room = %self.id, error = %e, "Failed to deal next hand");
            return;
        }
        info!(room = %self.id, hand = game.hand_number, level = ?game.level, "Hand dealt");

        let pending: Vec<Tribute> = game.pending_tributes().copied().collect();
        self.deal_hands();
        for tribute in pending {
            self.send_to_seat(tribute.from_seat, ServerMessage::Tribute {
                from_seat: tribute.from_seat,
                to_seat: tribute.to_seat,
            });
        }
        self.announce_turn();
    }

    // =========================================================================
    // BOTS
    // =========================================================================

    fn schedule_bots(&self) {
        let Some(game) = self.game.as_ref().filter(|g| !g.is_over()) else {
            return;
        };

        let seats: Vec<Seat> = match game.phase {
            Phase::Play => vec![game.current_turn],
            Phase::Tribute => game.pending_tributes().map(|t| t.from_seat).collect(),
            _ => Vec::new(),
        };

        for seat in seats {
            if self.is_bot(seat) {
                self.schedule_bot(seat, game.turn_seq);
            }
        }
    }

    fn schedule_bot(&self, seat: Seat, sequence: u64) {
        let mailbox = self.mailbox.clone();
        let delay = self.config.bot_delay;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(sender) = mailbox.upgrade() {
                let _ = sender.send(RoomCommand::BotTurn { seat, sequence }).await;
            }
        });
    }

    fn bot_turn(&mut self, seat: Seat, sequence: u64) {
        if !self.is_bot(seat) {
            return;
        }
        let Some(game) = self.game.as_ref().filter(|g| !g.is_over()) else {
            return;
        };
        if game.phase == Phase::Play && game.turn_seq != sequence {
            debug!(room = %self.id, seat, "Stale bot turn ignored");
            return;
        }
        let Some(decision) = bot::decide(game, seat) else {
            return;
        };

        let result = match decision {
            BotMove::Play(card_ids) => self.play(seat, &card_ids),
            BotMove::Pass => self.pass(seat),
            BotMove::Tribute(card_id) => self.tribute(seat, card_id),
        };
        if let Err(e) = result {
            warn!(room = %self.id, seat, error = %e, "Bot move rejected");
        }
    }

    // =========================================================================
    // OUTBOUND
    // =========================================================================

    fn broadcast(&self, message: ServerMessage) {
        for client in self.seats.iter().flatten().filter_map(Occupant::human) {
            client.send(message.clone());
        }
    }

    fn send_to_seat(&self, seat: Seat, message: ServerMessage) {
        if let Some(client) = self.seats[seat].as_ref().and_then(Occupant::human) {
            client.send(message);
        }
    }

    fn broadcast_room_state(&self) {
        let players: Vec<PlayerInfo> = self.seats.iter()
            .enumerate()
            .filter_map(|(seat, slot)| {
                slot.as_ref().map(|o| PlayerInfo {
                    id: o.id().to_string(),
                    name: o.name().to_string(),
                    seat,
                    team: team_of(seat),
                    is_ready: true,
                    is_bot: o.human().is_none(),
                })
            })
            .collect();
        let game_active = self.game_active();

        for client in self.seats.iter().flatten().filter_map(Occupant::human) {
            client.send(ServerMessage::RoomState(RoomStateInfo {
                room_id: self.id.clone(),
                players: players.clone(),
                game_active,
                your_id: client.id.clone(),
            }));
        }
    }

    fn deal_hands(&self) {
        let Some(game) = self.game.as_ref() else {
            return;
        };
        for seat in 0..SEAT_COUNT {
            self.send_to_seat(seat, ServerMessage::DealCards(DealInfo {
                cards: game.hands[seat].clone(),
                level: game.level,
            }));
        }
    }

    fn announce_turn(&self) {
        let Some(game) = self.game.as_ref() else {
            return;
        };
        if game.phase != Phase::Play {
            return;
        }

        let seat = game.current_turn;
        self.broadcast(ServerMessage::Turn(TurnInfo {
            player_id: self.player_id(seat),
            seat,
            can_pass: game.can_pass(),
        }));
    }
}

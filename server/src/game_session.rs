use std::sync::Arc;

use tokio::sync::Mutex;

use common::engine::{GameState, Point, Stone};
use common::protocol::WireMessage;
use common::{ClientId, SessionId, log, log_warn};

use crate::connection::Connection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Continue,
    /// The game ended with this action; the session should be released.
    Finished,
}

struct SessionState {
    game: GameState,
    active: bool,
}

/// One match between two connections. Every mutation and the broadcasts it
/// produces happen under `state`, so both peers observe the same order.
pub struct GoSession {
    id: SessionId,
    black: Arc<Connection>,
    white: Arc<Connection>,
    state: Mutex<SessionState>,
}

impl std::fmt::Debug for GoSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoSession")
            .field("id", &self.id)
            .field("black", self.black.id())
            .field("white", self.white.id())
            .finish()
    }
}

impl GoSession {
    pub fn new(
        id: SessionId,
        first: Arc<Connection>,
        second: Arc<Connection>,
        first_color: Stone,
        board_size: usize,
    ) -> Result<Self, String> {
        if first.id() == second.id() {
            return Err(format!("client {} cannot play against itself", first.id()));
        }
        let (black, white) = match first_color {
            Stone::Black => (first, second),
            Stone::White => (second, first),
            Stone::Empty => return Err("first player needs a stone color".to_string()),
        };
        let game = GameState::new(board_size)?;

        Ok(Self {
            id,
            black,
            white,
            state: Mutex::new(SessionState { game, active: true }),
        })
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn players(&self) -> [&Arc<Connection>; 2] {
        [&self.black, &self.white]
    }

    pub fn color_of(&self, client_id: &ClientId) -> Option<Stone> {
        if self.black.id() == client_id {
            Some(Stone::Black)
        } else if self.white.id() == client_id {
            Some(Stone::White)
        } else {
            None
        }
    }

    fn connection_for(&self, color: Stone) -> Option<&Arc<Connection>> {
        match color {
            Stone::Black => Some(&self.black),
            Stone::White => Some(&self.white),
            Stone::Empty => None,
        }
    }

    #[cfg(test)]
    pub async fn is_active(&self) -> bool {
        self.state.lock().await.active
    }

    #[cfg(test)]
    pub async fn game_snapshot(&self) -> GameState {
        self.state.lock().await.game.clone()
    }

    /// Sends roles and the initial position. Fails if either peer is
    /// already gone, in which case the session must be discarded.
    pub async fn start(&self) -> Result<(), String> {
        let state = self.state.lock().await;
        if !state.active {
            return Err(format!("session {} ended before it started", self.id));
        }
        for (connection, color) in [(&self.black, Stone::Black), (&self.white, Stone::White)] {
            connection.send(WireMessage::role(color)).await?;
        }
        for connection in [&self.black, &self.white] {
            connection.send(WireMessage::board_state(state.game.board())).await?;
        }
        for color in [Stone::Black, Stone::White] {
            if let Some(connection) = self.connection_for(color) {
                connection.send(score_message(&state.game, color)).await?;
            }
        }
        log!(
            "[session:{}] Started: {} is BLACK, {} is WHITE, {}x{}",
            self.id,
            self.black.id(),
            self.white.id(),
            state.game.board().size(),
            state.game.board().size()
        );
        Ok(())
    }

    pub async fn handle_move(&self, from: &ClientId, payload: &str) -> SessionOutcome {
        let mut state = self.state.lock().await;
        let Some(color) = self.check_turn(&state, from).await else {
            return SessionOutcome::Continue;
        };

        let point = match payload.parse::<Point>() {
            Ok(point) => point,
            Err(e) => {
                self.reply(color, WireMessage::error(e)).await;
                return SessionOutcome::Continue;
            }
        };

        if let Err(e) = state.game.play(point) {
            log!("[session:{}] {} move at {} rejected: {}", self.id, color, point, e);
            self.reply(color, WireMessage::error(e.to_string())).await;
            return SessionOutcome::Continue;
        }

        let captured = state.game.board().last_captured().len();
        if captured > 0 {
            log!("[session:{}] {} played {} capturing {}", self.id, color, point, captured);
        }
        self.broadcast_position(&state.game).await;
        self.finish_if_over(&mut state).await
    }

    pub async fn handle_pass(&self, from: &ClientId) -> SessionOutcome {
        let mut state = self.state.lock().await;
        let Some(color) = self.check_turn(&state, from).await else {
            return SessionOutcome::Continue;
        };

        if let Err(e) = state.game.pass() {
            self.reply(color, WireMessage::error(e.to_string())).await;
            return SessionOutcome::Continue;
        }

        log!("[session:{}] {} passed", self.id, color);
        self.broadcast_position(&state.game).await;
        self.finish_if_over(&mut state).await
    }

    pub async fn handle_resign(&self, from: &ClientId, payload: &str) -> SessionOutcome {
        let mut state = self.state.lock().await;
        let Some(color) = self.check_turn(&state, from).await else {
            return SessionOutcome::Continue;
        };

        if !payload.trim().is_empty() && payload.trim() != color.as_str() {
            log_warn!(
                "[session:{}] {} resigned with mismatched role '{}'",
                self.id,
                color,
                payload.trim()
            );
        }

        if let Err(e) = state.game.resign() {
            self.reply(color, WireMessage::error(e.to_string())).await;
            return SessionOutcome::Continue;
        }

        self.finish_if_over(&mut state).await
    }

    pub async fn handle_chat(&self, from: &ClientId, text: &str) {
        let state = self.state.lock().await;
        let Some(color) = self.color_of(from) else {
            log_warn!("[session:{}] Chat from non-member {}", self.id, from);
            return;
        };
        if !state.active {
            self.reply(color, WireMessage::error("game is not active")).await;
            return;
        }
        let message = WireMessage::chat(color, text);
        for connection in [&self.black, &self.white] {
            deliver(&self.id, connection, message.clone()).await;
        }
    }

    /// Treats the disconnect as a forfeit. Returns false when the session
    /// had already ended, making repeated calls harmless.
    pub async fn handle_disconnect(&self, who: &ClientId) -> bool {
        let mut state = self.state.lock().await;
        if !state.active {
            return false;
        }
        let Some(color) = self.color_of(who) else {
            return false;
        };

        let reason = format!("{} disconnected", color);
        if let Err(e) = state.game.forfeit(color, reason.clone()) {
            log_warn!("[session:{}] Forfeit for {} failed: {}", self.id, color, e);
        }
        log!("[session:{}] {}", self.id, reason);
        self.broadcast_game_over(&state.game, &reason).await;
        state.active = false;
        true
    }

    /// Deactivates the session without a result, used on server shutdown.
    pub async fn shut_down(&self) {
        let mut state = self.state.lock().await;
        if state.active {
            state.active = false;
            log!("[session:{}] Deactivated", self.id);
        }
    }

    /// Shared guard for move, pass and resign. Rejections go to the sender only.
    async fn check_turn(&self, state: &SessionState, from: &ClientId) -> Option<Stone> {
        let Some(color) = self.color_of(from) else {
            log_warn!("[session:{}] Action from non-member {}", self.id, from);
            return None;
        };
        if !state.active || state.game.is_over() {
            self.reply(color, WireMessage::error("game is over")).await;
            return None;
        }
        if state.game.turn() != color {
            self.reply(color, WireMessage::error(format!("not your turn: {} to play", state.game.turn())))
                .await;
            return None;
        }
        Some(color)
    }

    async fn finish_if_over(&self, state: &mut SessionState) -> SessionOutcome {
        let Some(reason) = state.game.over_reason().map(str::to_string) else {
            return SessionOutcome::Continue;
        };
        log!("[session:{}] Game over: {}", self.id, reason);
        self.broadcast_game_over(&state.game, &reason).await;
        state.active = false;
        SessionOutcome::Finished
    }

    async fn reply(&self, color: Stone, message: WireMessage) {
        if let Some(connection) = self.connection_for(color) {
            deliver(&self.id, connection, message).await;
        }
    }

    async fn broadcast_position(&self, game: &GameState) {
        let board = WireMessage::board_state(game.board());
        for connection in [&self.black, &self.white] {
            deliver(&self.id, connection, board.clone()).await;
        }
        for color in [Stone::Black, Stone::White] {
            self.reply(color, score_message(game, color)).await;
        }
    }

    async fn broadcast_game_over(&self, game: &GameState, reason: &str) {
        for color in [Stone::Black, Stone::White] {
            let (mine, theirs) = relative_scores(game, color);
            self.reply(color, WireMessage::game_over(mine, theirs, reason)).await;
        }
    }
}

fn relative_scores(game: &GameState, color: Stone) -> (u32, u32) {
    let opponent = color.opponent().unwrap_or(Stone::Empty);
    (game.score_for(color), game.score_for(opponent))
}

fn score_message(game: &GameState, color: Stone) -> WireMessage {
    let (mine, theirs) = relative_scores(game, color);
    WireMessage::score(mine, theirs, game.turn())
}

/// Send failures are logged and dropped; the failing connection closes
/// itself and its own task reports the disconnect.
async fn deliver(session_id: &SessionId, connection: &Connection, message: WireMessage) {
    if let Err(e) = connection.send(message).await {
        log_warn!("[session:{}] Dropped message for {}: {}", session_id, connection.id(), e);
    }
}

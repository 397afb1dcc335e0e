use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tokio::sync::Mutex;

use common::protocol::WireMessage;
use common::{ClientId, ConfigId, SessionId, log, log_warn};

use crate::connection::Connection;
use crate::connection_tracker::ConnectionTracker;
use crate::game_session::GoSession;
use crate::server_config::ServerConfig;
use crate::session_rng::SessionRng;

struct CoordinatorState {
    tracker: ConnectionTracker,
    queues: HashMap<ConfigId, VecDeque<ClientId>>,
    sessions: HashMap<SessionId, Arc<GoSession>>,
    client_sessions: HashMap<ClientId, SessionId>,
    rng: SessionRng,
    next_session_id: u64,
}

/// A freshly paired session plus its players in queue order, kept so a
/// failed start can put them back where they were.
struct Pairing {
    session: Arc<GoSession>,
    queued: [Arc<Connection>; 2],
    config_id: ConfigId,
}

impl CoordinatorState {
    fn take_pair(&mut self, config_id: ConfigId) -> Option<Pairing> {
        let queue = self.queues.entry(config_id).or_default();
        let mut picked: Vec<Arc<Connection>> = Vec::with_capacity(2);
        while picked.len() < 2 {
            let Some(client_id) = queue.pop_front() else {
                break;
            };
            match self.tracker.get(&client_id) {
                Some(connection) if connection.is_available() => picked.push(connection.clone()),
                _ => log!("[matchmaking] Dropping stale queue entry {} from {}", client_id, config_id),
            }
        }

        if picked.len() < 2 {
            for connection in picked.into_iter().rev() {
                queue.push_front(connection.id().clone());
            }
            return None;
        }

        let second = picked.pop()?;
        let first = picked.pop()?;
        let session_id = SessionId::new(format!("game-{}", self.next_session_id));
        self.next_session_id += 1;
        let first_color = self.rng.first_player_color();

        let session = match GoSession::new(
            session_id.clone(),
            first.clone(),
            second.clone(),
            first_color,
            config_id.board_size(),
        ) {
            Ok(session) => Arc::new(session),
            Err(e) => {
                log_warn!("[matchmaking] Could not create {} session: {}", config_id, e);
                queue.push_front(second.id().clone());
                queue.push_front(first.id().clone());
                return None;
            }
        };

        for connection in [&first, &second] {
            connection.set_in_game(true);
            self.client_sessions.insert(connection.id().clone(), session_id.clone());
            self.remove_from_queues(connection.id());
        }
        self.sessions.insert(session_id, session.clone());

        Some(Pairing {
            session,
            queued: [first, second],
            config_id,
        })
    }

    /// Drops every queue entry for the client. Returns the queues it left.
    fn remove_from_queues(&mut self, client_id: &ClientId) -> Vec<ConfigId> {
        let mut left = Vec::new();
        for (config_id, queue) in self.queues.iter_mut() {
            let before = queue.len();
            queue.retain(|queued| queued != client_id);
            if queue.len() != before {
                left.push(*config_id);
            }
        }
        left
    }

    fn detach_session(&mut self, session_id: &SessionId) -> Option<Arc<GoSession>> {
        let session = self.sessions.remove(session_id)?;
        for player in session.players() {
            if self.client_sessions.get(player.id()) == Some(session_id) {
                self.client_sessions.remove(player.id());
            }
        }
        Some(session)
    }
}

/// Owns every connection, queue and session. The lock is held only for
/// bookkeeping; session locks and network sends happen after it is released.
#[derive(Clone)]
pub struct MatchCoordinator {
    state: Arc<Mutex<CoordinatorState>>,
    config: Arc<ServerConfig>,
}

impl MatchCoordinator {
    pub fn new(config: ServerConfig, rng: SessionRng) -> Self {
        log!("[matchmaking] Session rng seed {}", rng.seed());
        Self {
            state: Arc::new(Mutex::new(CoordinatorState {
                tracker: ConnectionTracker::new(),
                queues: HashMap::new(),
                sessions: HashMap::new(),
                client_sessions: HashMap::new(),
                rng,
                next_session_id: 1,
            })),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub async fn register(&self, connection: Arc<Connection>) -> Result<(), String> {
        let total = {
            let mut state = self.state.lock().await;
            if !state.tracker.add(connection.clone()) {
                return Err(format!("client {} is already registered", connection.id()));
            }
            state.tracker.len()
        };
        log!("Client {} connected ({} online)", connection.id(), total);
        self.broadcast_roster().await;
        Ok(())
    }

    #[cfg(test)]
    pub async fn connection_count(&self) -> usize {
        self.state.lock().await.tracker.len()
    }

    pub async fn session_for(&self, client_id: &ClientId) -> Option<Arc<GoSession>> {
        let state = self.state.lock().await;
        let session_id = state.client_sessions.get(client_id)?;
        state.sessions.get(session_id).cloned()
    }

    #[cfg(test)]
    pub async fn session_count(&self) -> usize {
        self.state.lock().await.sessions.len()
    }

    #[cfg(test)]
    pub async fn queue_len(&self, config_id: ConfigId) -> usize {
        let state = self.state.lock().await;
        state.queues.get(&config_id).map(VecDeque::len).unwrap_or(0)
    }

    /// Puts a client in the queue for `board_size`. Rejected when the size is
    /// not offered, the client is busy, or it is already waiting there. A
    /// client waiting for another size moves to the new queue.
    pub async fn enqueue(&self, client_id: &ClientId, board_size: usize) -> Result<ConfigId, String> {
        if !self.config.is_allowed_board_size(board_size) {
            return Err(format!(
                "board size {} is not offered; choose one of {:?}",
                board_size, self.config.allowed_board_sizes
            ));
        }
        let config_id = ConfigId::for_board_size(board_size);

        let (connection, position, moved_from) = {
            let mut state = self.state.lock().await;
            let connection = state
                .tracker
                .get(client_id)
                .cloned()
                .ok_or_else(|| format!("client {} is not connected", client_id))?;
            if !connection.is_connected() {
                return Err(format!("client {} is not connected", client_id));
            }
            if connection.is_in_game() {
                return Err("already in a game".to_string());
            }
            if state
                .queues
                .get(&config_id)
                .is_some_and(|queue| queue.contains(client_id))
            {
                return Err(format!("already waiting for a {} game", config_id));
            }
            let moved_from = state.remove_from_queues(client_id);
            let queue = state.queues.entry(config_id).or_default();
            queue.push_back(client_id.clone());
            (connection, queue.len(), moved_from)
        };

        for previous in moved_from {
            log!("[matchmaking] {} left the {} queue", client_id, previous);
        }
        log!("[matchmaking] {} queued for {} (position {})", client_id, config_id, position);
        if let Err(e) = connection
            .send(WireMessage::system(&format!("waiting for an opponent on {}", config_id)))
            .await
        {
            log_warn!("[matchmaking] Queue notice to {} failed: {}", client_id, e);
        }
        Ok(config_id)
    }

    /// Pairs waiting clients two at a time until fewer than two usable
    /// entries remain.
    pub async fn try_match(&self, config_id: ConfigId) {
        loop {
            let pairing = {
                let mut state = self.state.lock().await;
                state.take_pair(config_id)
            };
            let Some(pairing) = pairing else {
                break;
            };

            match pairing.session.start().await {
                Ok(()) => log!(
                    "[matchmaking] {} paired {} with {} on {}",
                    pairing.session.id(),
                    pairing.queued[0].id(),
                    pairing.queued[1].id(),
                    pairing.config_id
                ),
                Err(e) => {
                    log_warn!("[matchmaking] {} failed to start: {}", pairing.session.id(), e);
                    self.abort_pairing(pairing).await;
                }
            }
        }
    }

    pub async fn try_match_all(&self) {
        let config_ids: Vec<ConfigId> = {
            let state = self.state.lock().await;
            state.queues.keys().copied().collect()
        };
        for config_id in config_ids {
            self.try_match(config_id).await;
        }
    }

    async fn abort_pairing(&self, pairing: Pairing) {
        pairing.session.shut_down().await;
        let mut state = self.state.lock().await;
        state.detach_session(pairing.session.id());
        let queue = state.queues.entry(pairing.config_id).or_default();
        for connection in pairing.queued.iter().rev() {
            connection.set_in_game(false);
            if connection.is_connected() {
                queue.push_front(connection.id().clone());
            }
        }
    }

    /// Releases both players after a game ends normally.
    pub async fn finish_session(&self, session_id: &SessionId) {
        let session = {
            let mut state = self.state.lock().await;
            state.detach_session(session_id)
        };
        if let Some(session) = session {
            for player in session.players() {
                player.set_in_game(false);
            }
            log!("[matchmaking] {} finished", session_id);
        }
    }

    /// Removes every trace of the client. An ongoing game is forfeited and
    /// the opponent becomes free to queue again.
    pub async fn handle_disconnect(&self, client_id: &ClientId) {
        let (removed, session, remaining) = {
            let mut state = self.state.lock().await;
            state.remove_from_queues(client_id);
            let removed = state.tracker.remove(client_id);
            let session = state
                .client_sessions
                .get(client_id)
                .cloned()
                .and_then(|session_id| state.detach_session(&session_id));
            (removed, session, state.tracker.len())
        };

        let Some(connection) = removed else {
            return;
        };
        connection.close();
        connection.set_in_game(false);
        log!("Client {} disconnected ({} online)", client_id, remaining);

        if let Some(session) = session {
            if session.handle_disconnect(client_id).await {
                log!("[matchmaking] {} forfeited by {}", session.id(), client_id);
            }
            for player in session.players() {
                player.set_in_game(false);
            }
        }

        self.broadcast_roster().await;
        self.try_match_all().await;
    }

    /// Warns everyone, ends sessions, waits out the grace period and closes
    /// every connection.
    pub async fn shutdown(&self) {
        let (connections, sessions) = {
            let state = self.state.lock().await;
            let sessions: Vec<Arc<GoSession>> = state.sessions.values().cloned().collect();
            (state.tracker.connections(), sessions)
        };
        log!(
            "Shutting down: {} clients, {} sessions",
            connections.len(),
            sessions.len()
        );

        let grace = self.config.shutdown_grace();
        let notice = WireMessage::system("server is shutting down");
        for connection in &connections {
            if let Ok(Err(e)) = tokio::time::timeout(grace, connection.send(notice.clone())).await {
                log_warn!("Shutdown notice to {} failed: {}", connection.id(), e);
            }
        }
        for session in &sessions {
            session.shut_down().await;
        }

        tokio::time::sleep(grace).await;
        for connection in &connections {
            connection.close();
        }
    }

    async fn broadcast_roster(&self) {
        let (ids, connections) = {
            let state = self.state.lock().await;
            (state.tracker.client_ids(), state.tracker.connections())
        };
        let roster = WireMessage::client_ids(&ids);
        for connection in connections {
            if let Err(e) = connection.send(roster.clone()).await {
                log_warn!("Roster update to {} failed: {}", connection.id(), e);
            }
        }
    }
}

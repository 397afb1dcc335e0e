use std::sync::Arc;

use common::protocol::{MessageType, WireMessage, parse_requested_board_size};
use common::{SessionId, log, log_warn};

use crate::connection::Connection;
use crate::game_session::SessionOutcome;
use crate::match_coordinator::MatchCoordinator;

pub enum HandleResult {
    Continue,
    Disconnect,
}

/// Routes decoded frames from one client to matchmaking or its session.
#[derive(Clone)]
pub struct MessageHandler {
    coordinator: MatchCoordinator,
}

impl MessageHandler {
    pub fn new(coordinator: MatchCoordinator) -> Self {
        Self { coordinator }
    }

    pub async fn handle_message(&self, message: WireMessage, connection: &Arc<Connection>) -> HandleResult {
        let client_id = connection.id();
        let kind = match MessageType::try_from(message.kind) {
            Ok(kind) => kind,
            Err(_) => {
                log_warn!("Unknown message kind {} from {}", message.kind, client_id);
                return reply(connection, format!("unknown message kind {}", message.kind)).await;
            }
        };

        if !kind.is_server_bound() {
            log_warn!("Client {} sent server-only message {:?}", client_id, kind);
            return reply(connection, format!("{:?} is not accepted from clients", kind)).await;
        }

        match kind {
            MessageType::ReadyForGame => self.handle_ready(connection, &message.payload).await,
            MessageType::Move => {
                let Some(session) = self.coordinator.session_for(client_id).await else {
                    return reply(connection, "not in a game").await;
                };
                let outcome = session.handle_move(client_id, &message.payload).await;
                self.after_action(session.id(), outcome).await;
                HandleResult::Continue
            }
            MessageType::Pass => {
                let Some(session) = self.coordinator.session_for(client_id).await else {
                    return reply(connection, "not in a game").await;
                };
                let outcome = session.handle_pass(client_id).await;
                self.after_action(session.id(), outcome).await;
                HandleResult::Continue
            }
            MessageType::Resign => {
                let Some(session) = self.coordinator.session_for(client_id).await else {
                    return reply(connection, "not in a game").await;
                };
                let outcome = session.handle_resign(client_id, &message.payload).await;
                self.after_action(session.id(), outcome).await;
                HandleResult::Continue
            }
            MessageType::MsgFromClient => {
                let Some(session) = self.coordinator.session_for(client_id).await else {
                    return reply(connection, "not in a game").await;
                };
                session.handle_chat(client_id, &message.payload).await;
                HandleResult::Continue
            }
            _ => reply(connection, format!("{:?} is not accepted from clients", kind)).await,
        }
    }

    async fn handle_ready(&self, connection: &Arc<Connection>, payload: &str) -> HandleResult {
        let board_size = match parse_requested_board_size(payload) {
            Ok(requested) => requested.unwrap_or(self.coordinator.config().default_board_size),
            Err(e) => return reply(connection, e).await,
        };

        match self.coordinator.enqueue(connection.id(), board_size).await {
            Ok(config_id) => {
                self.coordinator.try_match(config_id).await;
                HandleResult::Continue
            }
            Err(e) => {
                log!("Ready from {} rejected: {}", connection.id(), e);
                reply(connection, e).await
            }
        }
    }

    async fn after_action(&self, session_id: &SessionId, outcome: SessionOutcome) {
        if outcome == SessionOutcome::Finished {
            self.coordinator.finish_session(session_id).await;
        }
    }
}

async fn reply(connection: &Connection, text: impl Into<String>) -> HandleResult {
    match connection.send(WireMessage::error(text)).await {
        Ok(()) => HandleResult::Continue,
        Err(e) => {
            log_warn!("Error reply to {} failed: {}", connection.id(), e);
            HandleResult::Disconnect
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::OutboundReceiver;
    use crate::server_config::ServerConfig;
    use crate::session_rng::SessionRng;
    use common::ClientId;
    use common::engine::Stone;

    struct Client {
        connection: Arc<Connection>,
        receiver: OutboundReceiver,
    }

    impl Client {
        async fn join(coordinator: &MatchCoordinator, name: &str) -> Self {
            let (connection, receiver) = Connection::new(ClientId::from(name), 64);
            coordinator.register(connection.clone()).await.unwrap();
            Self { connection, receiver }
        }

        fn drain(&mut self) -> Vec<WireMessage> {
            let mut messages = Vec::new();
            while let Ok(message) = self.receiver.try_recv() {
                messages.push(message);
            }
            messages
        }

        fn last_error(&mut self) -> Option<String> {
            self.drain()
                .into_iter()
                .filter(|m| m.kind() == MessageType::Error)
                .map(|m| m.payload)
                .last()
        }
    }

    fn setup() -> (MatchCoordinator, MessageHandler) {
        let coordinator = MatchCoordinator::new(ServerConfig::default(), SessionRng::new(11));
        let handler = MessageHandler::new(coordinator.clone());
        (coordinator, handler)
    }

    async fn send(handler: &MessageHandler, client: &Client, message: WireMessage) {
        handler.handle_message(message, &client.connection).await;
    }

    #[tokio::test]
    async fn test_game_actions_outside_a_game_are_rejected() {
        let (coordinator, handler) = setup();
        let mut client = Client::join(&coordinator, "a").await;

        send(&handler, &client, WireMessage::pass()).await;
        assert_eq!(client.last_error().as_deref(), Some("not in a game"));
        send(&handler, &client, WireMessage::with_payload(MessageType::MsgFromClient, "hi")).await;
        assert_eq!(client.last_error().as_deref(), Some("not in a game"));
    }

    #[tokio::test]
    async fn test_server_only_and_unknown_kinds_are_rejected() {
        let (coordinator, handler) = setup();
        let mut client = Client::join(&coordinator, "a").await;

        send(&handler, &client, WireMessage::role(Stone::Black)).await;
        assert!(client.last_error().unwrap().contains("Role"));

        let unknown = WireMessage {
            kind: 99,
            payload: String::new(),
        };
        send(&handler, &client, unknown).await;
        assert_eq!(client.last_error().as_deref(), Some("unknown message kind 99"));
    }

    #[tokio::test]
    async fn test_ready_uses_default_size_and_rejects_bad_sizes() {
        let (coordinator, handler) = setup();
        let mut a = Client::join(&coordinator, "a").await;
        let b = Client::join(&coordinator, "b").await;

        send(&handler, &a, WireMessage::ready_for_game(Some(7))).await;
        assert!(a.last_error().unwrap().contains("not offered"));
        send(&handler, &a, WireMessage::with_payload(MessageType::ReadyForGame, "big")).await;
        assert!(a.last_error().is_some());

        send(&handler, &a, WireMessage::ready_for_game(None)).await;
        send(&handler, &b, WireMessage::ready_for_game(None)).await;
        let session = coordinator.session_for(a.connection.id()).await.unwrap();
        assert_eq!(session.game_snapshot().await.board().size(), 19);
    }

    #[tokio::test]
    async fn test_full_game_through_handler_releases_players() {
        let (coordinator, handler) = setup();
        let a = Client::join(&coordinator, "a").await;
        let b = Client::join(&coordinator, "b").await;
        send(&handler, &a, WireMessage::ready_for_game(Some(9))).await;
        send(&handler, &b, WireMessage::ready_for_game(Some(9))).await;

        let session = coordinator.session_for(a.connection.id()).await.unwrap();
        let (black, white) = if session.color_of(a.connection.id()) == Some(Stone::Black) {
            (&a, &b)
        } else {
            (&b, &a)
        };

        send(&handler, black, WireMessage::move_to(common::engine::Point::new(2, 2))).await;
        send(&handler, white, WireMessage::resign(Some(Stone::White))).await;

        assert_eq!(
            session.game_snapshot().await.over_reason(),
            Some("WHITE resigned")
        );
        assert!(coordinator.session_for(a.connection.id()).await.is_none());
        assert!(!a.connection.is_in_game());
        assert!(!b.connection.is_in_game());
    }

    #[tokio::test]
    async fn test_reply_to_closed_connection_requests_disconnect() {
        let (coordinator, handler) = setup();
        let client = Client::join(&coordinator, "a").await;
        client.connection.close();

        let result = handler.handle_message(WireMessage::pass(), &client.connection).await;
        assert!(matches!(result, HandleResult::Disconnect));
    }
}

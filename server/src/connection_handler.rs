use tokio::io::{AsyncRead, AsyncWrite};

use common::protocol::{read_frame, write_frame};
use common::{ClientId, log, log_warn};

use crate::connection::{Connection, OutboundReceiver};
use crate::match_coordinator::MatchCoordinator;
use crate::message_handler::{HandleResult, MessageHandler};

/// Drives one client from registration to disconnect. A writer task drains
/// the outbound queue while this task reads frames and dispatches them.
pub async fn serve_connection<S>(stream: S, client_id: ClientId, coordinator: MatchCoordinator)
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let config = coordinator.config().clone();
    let (mut reader, writer) = tokio::io::split(stream);
    let (connection, outbound) = Connection::new(client_id.clone(), config.outbound_queue_capacity);

    let writer_connection = connection.clone();
    let send_task = tokio::spawn(async move {
        write_loop(writer, outbound, &writer_connection).await;
    });

    if let Err(e) = coordinator.register(connection.clone()).await {
        log_warn!("Rejecting {}: {}", client_id, e);
        connection.close();
        send_task.abort();
        return;
    }

    let handler = MessageHandler::new(coordinator.clone());
    loop {
        let frame = tokio::select! {
            frame = read_frame(&mut reader, config.max_frame_len) => frame,
            _ = connection.closed() => break,
        };

        match frame {
            Ok(Some(message)) => {
                if let HandleResult::Disconnect = handler.handle_message(message, &connection).await {
                    break;
                }
            }
            Ok(None) => {
                log!("Client {} closed the connection", client_id);
                break;
            }
            Err(e) => {
                log_warn!("Read from {} failed: {}", client_id, e);
                break;
            }
        }
    }

    coordinator.handle_disconnect(&client_id).await;
    connection.close();
    send_task.abort();
}

async fn write_loop<W>(mut writer: W, mut outbound: OutboundReceiver, connection: &Connection)
where
    W: AsyncWrite + Unpin,
{
    loop {
        let message = tokio::select! {
            message = outbound.recv() => message,
            _ = connection.closed() => None,
        };
        let Some(message) = message else {
            break;
        };
        if let Err(e) = write_frame(&mut writer, &message).await {
            log_warn!("Write to {} failed: {}", connection.id(), e);
            break;
        }
    }
    connection.close();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server_config::ServerConfig;
    use crate::session_rng::SessionRng;
    use common::protocol::{MessageType, WireMessage};
    use std::time::Duration;
    use tokio::io::DuplexStream;

    const MAX_LEN: usize = 64 * 1024;

    fn coordinator() -> MatchCoordinator {
        MatchCoordinator::new(ServerConfig::default(), SessionRng::new(3))
    }

    fn connect(coordinator: &MatchCoordinator, name: &str) -> DuplexStream {
        let (client, server) = tokio::io::duplex(16 * 1024);
        tokio::spawn(serve_connection(server, ClientId::from(name), coordinator.clone()));
        client
    }

    async fn next_of_kind(stream: &mut DuplexStream, kind: MessageType) -> WireMessage {
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                let message = read_frame(stream, MAX_LEN).await.unwrap().unwrap();
                if message.kind() == kind {
                    return message;
                }
            }
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_client_receives_roster_on_connect() {
        let coordinator = coordinator();
        let mut client = connect(&coordinator, "hoshi-1");
        let roster = next_of_kind(&mut client, MessageType::ClientIds).await;
        assert_eq!(roster.payload, "hoshi-1");
    }

    #[tokio::test]
    async fn test_two_clients_play_over_the_wire() {
        let coordinator = coordinator();
        let mut a = connect(&coordinator, "a");
        let mut b = connect(&coordinator, "b");
        next_of_kind(&mut a, MessageType::ClientIds).await;
        next_of_kind(&mut b, MessageType::ClientIds).await;

        write_frame(&mut a, &WireMessage::ready_for_game(Some(9))).await.unwrap();
        write_frame(&mut b, &WireMessage::ready_for_game(Some(9))).await.unwrap();

        let a_role = next_of_kind(&mut a, MessageType::Role).await.payload;
        let b_role = next_of_kind(&mut b, MessageType::Role).await.payload;
        assert_ne!(a_role, b_role);

        let (black, white) = if a_role == "BLACK" { (&mut a, &mut b) } else { (&mut b, &mut a) };
        write_frame(black, &WireMessage::move_to(common::engine::Point::new(4, 4))).await.unwrap();
        let score = loop {
            let message = next_of_kind(white, MessageType::Score).await;
            if message.payload.ends_with("WHITE") {
                break message;
            }
        };
        assert_eq!(score.payload, "0,1,WHITE");
    }

    #[tokio::test]
    async fn test_dropping_socket_forfeits_the_game() {
        let coordinator = coordinator();
        let mut a = connect(&coordinator, "a");
        let mut b = connect(&coordinator, "b");
        write_frame(&mut a, &WireMessage::ready_for_game(Some(9))).await.unwrap();
        write_frame(&mut b, &WireMessage::ready_for_game(Some(9))).await.unwrap();
        next_of_kind(&mut a, MessageType::Role).await;
        let b_role = next_of_kind(&mut b, MessageType::Role).await.payload;

        drop(b);
        let over = next_of_kind(&mut a, MessageType::GameOver).await;
        assert!(over.payload.ends_with(&format!("{} disconnected", b_role)));
    }

    #[tokio::test]
    async fn test_oversized_frame_disconnects_client() {
        let coordinator = coordinator();
        let mut client = connect(&coordinator, "big");
        next_of_kind(&mut client, MessageType::ClientIds).await;

        use tokio::io::AsyncWriteExt;
        client.write_all(&(u32::MAX).to_be_bytes()).await.unwrap();

        let closed = tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                match read_frame(&mut client, MAX_LEN).await {
                    Ok(Some(_)) => continue,
                    _ => return,
                }
            }
        })
        .await;
        assert!(closed.is_ok());
        assert_eq!(coordinator.connection_count().await, 0);
    }
}

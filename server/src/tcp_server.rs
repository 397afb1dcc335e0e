use std::future::Future;

use tokio::net::TcpListener;

use common::id_generator::generate_client_id;
use common::{ClientId, log, log_error};

use crate::connection_handler::serve_connection;
use crate::match_coordinator::MatchCoordinator;

/// Accepts clients until `shutdown` resolves, then runs the coordinator's
/// shutdown sequence.
pub async fn run<F>(listener: TcpListener, coordinator: MatchCoordinator, shutdown: F)
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer_addr)) => {
                    if let Err(e) = stream.set_nodelay(true) {
                        log_error!("Failed to set TCP_NODELAY for {}: {}", peer_addr, e);
                    }
                    let client_id = ClientId::new(generate_client_id());
                    log!("Accepted {} as {}", peer_addr, client_id);
                    tokio::spawn(serve_connection(stream, client_id, coordinator.clone()));
                }
                Err(e) => log_error!("Accept failed: {}", e),
            },
            _ = &mut shutdown => break,
        }
    }

    log!("Shutdown signal received, notifying clients...");
    coordinator.shutdown().await;
}

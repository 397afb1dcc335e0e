use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{mpsc, watch};

use common::ClientId;
use common::protocol::WireMessage;

pub type OutboundSender = mpsc::Sender<WireMessage>;
pub type OutboundReceiver = mpsc::Receiver<WireMessage>;

/// Server-side handle for one peer. Messages queued here are written to the
/// socket in order by the connection's writer task.
pub struct Connection {
    id: ClientId,
    outbound: OutboundSender,
    connected: AtomicBool,
    in_game: AtomicBool,
    closed: watch::Sender<bool>,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("connected", &self.is_connected())
            .field("in_game", &self.is_in_game())
            .finish()
    }
}

impl Connection {
    pub fn new(id: ClientId, queue_capacity: usize) -> (Arc<Self>, OutboundReceiver) {
        let (outbound, receiver) = mpsc::channel(queue_capacity);
        let (closed, _) = watch::channel(false);
        let connection = Arc::new(Self {
            id,
            outbound,
            connected: AtomicBool::new(true),
            in_game: AtomicBool::new(false),
            closed,
        });
        (connection, receiver)
    }

    pub fn id(&self) -> &ClientId {
        &self.id
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn is_in_game(&self) -> bool {
        self.in_game.load(Ordering::SeqCst)
    }

    pub fn set_in_game(&self, in_game: bool) {
        self.in_game.store(in_game, Ordering::SeqCst);
    }

    /// Connected and free to be paired.
    pub fn is_available(&self) -> bool {
        self.is_connected() && !self.is_in_game()
    }

    /// Queues a message for the writer task. A failure means the peer is
    /// gone; the connection is closed so its reader runs disconnect handling.
    pub async fn send(&self, message: WireMessage) -> Result<(), String> {
        if !self.is_connected() {
            return Err(format!("client {} is no longer connected", self.id));
        }
        if self.outbound.send(message).await.is_err() {
            self.close();
            return Err(format!("outbound queue for client {} is closed", self.id));
        }
        Ok(())
    }

    pub fn close(&self) {
        self.connected.store(false, Ordering::SeqCst);
        self.closed.send_replace(true);
    }

    /// Resolves once `close` has been called.
    pub async fn closed(&self) {
        let mut receiver = self.closed.subscribe();
        let _ = receiver.wait_for(|closed| *closed).await;
    }
}

//! Connected-client registry and the seams between transport and game

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::protocol::{ClientMsg, PlayerId, ServerMsg};

/// Outbound queue depth per connection
const CLIENT_QUEUE_CAPACITY: usize = 256;

/// Pushes messages to connected clients without blocking
pub trait ClientSink: Send + Sync {
    fn send_to(&self, player_id: &PlayerId, msg: ServerMsg);
    fn broadcast(&self, msg: ServerMsg);
}

/// Receives connection lifecycle events and inbound intents
pub trait IntentHandler: Send + Sync {
    fn on_connect(&self, player_id: &PlayerId);
    fn on_intent(&self, player_id: &PlayerId, msg: ClientMsg);
    fn on_disconnect(&self, player_id: &PlayerId);
}

/// Routes outbound messages to each connection's writer task
#[derive(Default)]
pub struct ClientHub {
    clients: DashMap<PlayerId, mpsc::Sender<ServerMsg>>,
}

impl ClientHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection; the receiver feeds its socket writer
    pub fn register(&self, player_id: PlayerId) -> mpsc::Receiver<ServerMsg> {
        let (tx, rx) = mpsc::channel(CLIENT_QUEUE_CAPACITY);
        self.clients.insert(player_id, tx);
        rx
    }

    pub fn unregister(&self, player_id: &PlayerId) {
        self.clients.remove(player_id);
    }

    pub fn connected(&self) -> usize {
        self.clients.len()
    }

    fn deliver(player_id: &PlayerId, tx: &mpsc::Sender<ServerMsg>, msg: ServerMsg) {
        match tx.try_send(msg) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(player_id = %player_id, "Client lagged, dropping message");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!(player_id = %player_id, "Client channel closed");
            }
        }
    }
}

impl ClientSink for ClientHub {
    fn send_to(&self, player_id: &PlayerId, msg: ServerMsg) {
        match self.clients.get(player_id) {
            Some(tx) => Self::deliver(player_id, tx.value(), msg),
            None => debug!(player_id = %player_id, "No connection for message"),
        }
    }

    fn broadcast(&self, msg: ServerMsg) {
        for entry in self.clients.iter() {
            Self::deliver(entry.key(), entry.value(), msg.clone());
        }
    }
}

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::warn;
use parking_lot::Mutex;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::{ChatHistoryEntry, Database};

mod presence;
mod session;

pub use presence::PresenceRegistry;
pub use session::ChatSession;

/// Identifies a single realtime connection for its lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub(crate) u64);

/// An event pushed to a connected chat client
#[derive(Debug, Clone)]
pub enum ChatEvent {
    /// How many connections are in the room right now
    ActiveUsers { count: usize },
    /// The room's backlog, sent to a connection when it joins
    History { messages: Vec<ChatHistoryEntry> },
    /// A message said in the room
    Message {
        text: String,
        email: String,
        timestamp: DateTime<Utc>,
    },
}

/// The realtime chat service.
///
/// Owns the presence registry and the send half of every connection.
/// Sessions talk to their peers exclusively through [Chat::broadcast].
pub struct Chat<Db> {
    db: Arc<Db>,
    presence: PresenceRegistry,
    senders: Mutex<HashMap<ConnectionId, UnboundedSender<ChatEvent>>>,
    connection_counter: AtomicU64,
}

impl<Db> Chat<Db>
where
    Db: Database,
{
    pub fn new(db: &Arc<Db>) -> Self {
        Self {
            db: db.clone(),
            presence: PresenceRegistry::default(),
            senders: Mutex::new(HashMap::new()),
            connection_counter: AtomicU64::new(0),
        }
    }

    /// Registers a new connection, returning its session and the receiving
    /// end of its event stream. Dropping the session disconnects it.
    pub fn connect(self: &Arc<Self>) -> (ChatSession<Db>, UnboundedReceiver<ChatEvent>) {
        let id = ConnectionId(self.connection_counter.fetch_add(1, Ordering::Relaxed));
        let (sender, receiver) = unbounded_channel();

        self.senders.lock().insert(id, sender);

        (ChatSession::new(id, self.clone()), receiver)
    }

    /// Sends an event to every connection in a room
    fn broadcast(&self, room_id: &str, event: ChatEvent) {
        let senders = self.senders.lock();

        for member in self.presence.members(room_id) {
            let Some(sender) = senders.get(&member) else {
                continue;
            };

            if sender.send(event.clone()).is_err() {
                warn!("Dropped chat event for closed connection {:?}", member);
            }
        }
    }

    /// Sends an event to a single connection
    fn send_to(&self, connection_id: ConnectionId, event: ChatEvent) {
        let senders = self.senders.lock();

        if let Some(sender) = senders.get(&connection_id) {
            let _ = sender.send(event);
        }
    }

    fn disconnect(&self, connection_id: ConnectionId) {
        self.senders.lock().remove(&connection_id);
    }
}

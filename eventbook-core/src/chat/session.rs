use std::sync::Arc;

use log::warn;

use super::{Chat, ChatEvent, ConnectionId};
use crate::util::sanitize_text;
use crate::{ChatRoomData, ChatUserData, Database, NewChatMessage, Result};

/// One connection's view of the chat.
///
/// A session starts out anonymous and roomless. It has to identify itself
/// and join a room before anything it says goes anywhere. Dropping the
/// session leaves its room and disconnects it.
pub struct ChatSession<Db>
where
    Db: Database,
{
    id: ConnectionId,
    chat: Arc<Chat<Db>>,
    user: Option<ChatUserData>,
    room: Option<ChatRoomData>,
}

impl<Db> ChatSession<Db>
where
    Db: Database,
{
    pub(super) fn new(id: ConnectionId, chat: Arc<Chat<Db>>) -> Self {
        Self {
            id,
            chat,
            user: None,
            room: None,
        }
    }

    /// Binds an identity to this connection. Best-effort, a failed lookup
    /// leaves the session anonymous rather than closing it.
    pub async fn identify(&mut self, email: &str) {
        match self.chat.db.upsert_chat_user(email).await {
            Ok(user) => self.user = Some(user),
            Err(e) => warn!("Could not identify chat connection {:?}: {}", self.id, e),
        }
    }

    /// Joins a room by name, creating it if it doesn't exist yet. The room's
    /// backlog is sent to this connection, and everyone in the room gets the
    /// updated member count. Joining while in another room leaves it first,
    /// but only once the new room is known to exist, so a failed join leaves
    /// the current membership untouched.
    pub async fn join(&mut self, room_name: &str) -> Result<()> {
        let room = self.chat.db.upsert_chat_room(room_name).await?;
        let messages = self.chat.db.chat_messages_by_room(&room.id).await?;

        self.leave();

        let count = self.chat.presence.join(&room.id, self.id);
        self.chat.broadcast(&room.id, ChatEvent::ActiveUsers { count });
        self.chat.send_to(self.id, ChatEvent::History { messages });

        self.room = Some(room);
        Ok(())
    }

    /// Says something in the current room. Dropped silently unless the
    /// session has both an identity and a room. The message is persisted
    /// first and only broadcast once it is stored.
    pub async fn message(&self, text: &str) -> Result<()> {
        let (Some(user), Some(room)) = (&self.user, &self.room) else {
            return Ok(());
        };

        let stored = self
            .chat
            .db
            .create_chat_message(NewChatMessage {
                room_id: room.id.clone(),
                user_id: user.id.clone(),
                text: sanitize_text(text),
            })
            .await?;

        self.chat.broadcast(
            &room.id,
            ChatEvent::Message {
                text: stored.text,
                email: user.email.clone(),
                timestamp: stored.created_at,
            },
        );

        Ok(())
    }

    /// Leaves the current room, if any. The remaining members get the
    /// updated count.
    pub fn leave(&mut self) {
        let Some(room) = self.room.take() else {
            return;
        };

        let remaining = self.chat.presence.leave(&room.id, self.id);

        if let Some(remaining) = remaining.filter(|count| *count > 0) {
            self.chat
                .broadcast(&room.id, ChatEvent::ActiveUsers { count: remaining });
        }
    }
}

impl<Db> Drop for ChatSession<Db>
where
    Db: Database,
{
    fn drop(&mut self) {
        self.leave();
        self.chat.disconnect(self.id);
    }
}

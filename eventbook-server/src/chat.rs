use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
    routing::get,
};
use chrono::{DateTime, Utc};
use eventbook_core::{ChatEvent, ChatSession, PgDatabase};
use futures_util::{SinkExt, StreamExt};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::{Router, ServerContext};

/// A frame sent by a connected client
#[derive(Debug, Deserialize)]
#[serde(tag = "type", content = "data")]
enum ClientFrame {
    #[serde(rename = "user email")]
    UserEmail(String),
    #[serde(rename = "join room")]
    JoinRoom(String),
    #[serde(rename = "chat message")]
    ChatMessage { room: String, message: String },
    #[serde(rename = "leave room")]
    LeaveRoom(String),
}

/// A frame pushed to a connected client
#[derive(Debug, Serialize)]
#[serde(tag = "type", content = "data")]
enum ServerFrame {
    #[serde(rename = "active users")]
    ActiveUsers(usize),
    #[serde(rename = "previous messages")]
    PreviousMessages(Vec<OutgoingMessage>),
    #[serde(rename = "chat message")]
    ChatMessage(OutgoingMessage),
}

#[derive(Debug, Serialize)]
struct OutgoingMessage {
    text: String,
    email: String,
    timestamp: DateTime<Utc>,
}

impl From<ChatEvent> for ServerFrame {
    fn from(event: ChatEvent) -> Self {
        match event {
            ChatEvent::ActiveUsers { count } => Self::ActiveUsers(count),
            ChatEvent::History { messages } => Self::PreviousMessages(
                messages
                    .into_iter()
                    .map(|entry| OutgoingMessage {
                        text: entry.text,
                        email: entry.email,
                        timestamp: entry.created_at,
                    })
                    .collect(),
            ),
            ChatEvent::Message {
                text,
                email,
                timestamp,
            } => Self::ChatMessage(OutgoingMessage {
                text,
                email,
                timestamp,
            }),
        }
    }
}

async fn chat(State(context): State<ServerContext>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, context))
}

async fn handle_socket(socket: WebSocket, context: ServerContext) {
    let (mut session, mut events) = context.eventbook.chat.connect();
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };

                let Ok(text) = serde_json::to_string(&ServerFrame::from(event)) else {
                    continue;
                };

                if sink.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        // Malformed frames are ignored, the protocol has no
                        // error channel back to the client
                        let Ok(frame) = serde_json::from_str::<ClientFrame>(&text) else {
                            continue;
                        };

                        if let Err(e) = handle_frame(&mut session, frame).await {
                            warn!("Chat frame failed: {}", e);
                        }
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    // Dropping the session leaves its room and disconnects it
}

async fn handle_frame(
    session: &mut ChatSession<PgDatabase>,
    frame: ClientFrame,
) -> eventbook_core::Result<()> {
    match frame {
        ClientFrame::UserEmail(email) => {
            session.identify(&email).await;
            Ok(())
        }
        ClientFrame::JoinRoom(name) => session.join(&name).await,
        // The bound room is authoritative, the room in the payload is
        // carried for wire compatibility only
        ClientFrame::ChatMessage { room: _, message } => session.message(&message).await,
        ClientFrame::LeaveRoom(_) => {
            session.leave();
            Ok(())
        }
    }
}

pub fn router() -> Router {
    Router::new().route("/chat", get(chat))
}

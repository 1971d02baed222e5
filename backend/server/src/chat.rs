//! Real-time chat relay.
//!
//! One WebSocket endpoint, named rooms, no persistence. Each room is a
//! `tokio::sync::broadcast` channel created on first join; a room with no
//! members costs nothing. Join and leave are announced to the room as
//! "System" messages, and a connection that chats before joining falls back
//! to `Anonymous` in `General`.
//!
//! Wire events are JSON with a `type` tag:
//!
//! - client → server: `joinRoom { username, room }`, `chatMessage { text }`
//! - server → client: `chatMessage { username, text, time }`

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    response::IntoResponse,
};
use chrono::Local;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info};

const ROOM_BUFFER: usize = 64;
const FALLBACK_USERNAME: &str = "Anonymous";
const FALLBACK_ROOM: &str = "General";
const SYSTEM_USERNAME: &str = "System";

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum ClientEvent {
    JoinRoom { username: String, room: String },
    ChatMessage { text: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerEvent {
    ChatMessage {
        username: String,
        text: String,
        time: String,
    },
}

impl ServerEvent {
    fn chat(username: &str, text: String) -> Self {
        ServerEvent::ChatMessage {
            username: username.to_owned(),
            text,
            time: Local::now().format("%H:%M").to_string(),
        }
    }

    fn system(text: String) -> Self {
        Self::chat(SYSTEM_USERNAME, text)
    }
}

/// Room registry: room name → broadcast sender.
#[derive(Default)]
pub struct ChatRooms {
    rooms: RwLock<HashMap<String, broadcast::Sender<ServerEvent>>>,
}

impl ChatRooms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to a room, creating it on first join.
    pub async fn join(&self, room: &str) -> broadcast::Receiver<ServerEvent> {
        let mut rooms = self.rooms.write().await;
        rooms
            .entry(room.to_owned())
            .or_insert_with(|| broadcast::channel(ROOM_BUFFER).0)
            .subscribe()
    }

    /// Broadcast to a room. A room nobody has joined yet silently drops the
    /// event, which is exactly what "no members to notify" means.
    pub async fn send(&self, room: &str, event: ServerEvent) {
        if let Some(sender) = self.rooms.read().await.get(room) {
            let _ = sender.send(event);
        }
    }
}

struct Identity {
    username: String,
    room: String,
}

pub async fn chat_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<crate::state::AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| relay(socket, state))
}

/// Per-connection loop: reads client events, forwards room broadcasts back
/// through a writer task that owns the socket sink.
async fn relay(socket: WebSocket, state: Arc<crate::state::AppState>) {
    let (mut sink, mut stream) = socket.split();
    let (out_tx, mut out_rx) = mpsc::channel::<String>(ROOM_BUFFER);

    let writer: JoinHandle<()> = tokio::spawn(async move {
        while let Some(payload) = out_rx.recv().await {
            if sink.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    let mut identity: Option<Identity> = None;
    let mut forward: Option<JoinHandle<()>> = None;

    while let Some(Ok(message)) = stream.next().await {
        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };
        let event = match serde_json::from_str::<ClientEvent>(text.as_str()) {
            Ok(event) => event,
            Err(err) => {
                debug!("dropping malformed chat event: {err}");
                continue;
            }
        };
        match event {
            ClientEvent::JoinRoom { username, room } => {
                if let Some(task) = forward.take() {
                    task.abort();
                }
                // Announce before subscribing so the joiner does not see
                // their own join notice.
                state
                    .chat
                    .send(&room, ServerEvent::system(format!("{username} has joined the room.")))
                    .await;
                let mut room_rx = state.chat.join(&room).await;
                let tx = out_tx.clone();
                forward = Some(tokio::spawn(async move {
                    while let Ok(event) = room_rx.recv().await {
                        let Ok(payload) = serde_json::to_string(&event) else {
                            continue;
                        };
                        if tx.send(payload).await.is_err() {
                            break;
                        }
                    }
                }));
                info!("{username} joined {room}.");
                identity = Some(Identity { username, room });
            }
            ClientEvent::ChatMessage { text } => {
                let (username, room) = match &identity {
                    Some(id) => (id.username.as_str(), id.room.as_str()),
                    None => (FALLBACK_USERNAME, FALLBACK_ROOM),
                };
                state.chat.send(room, ServerEvent::chat(username, text)).await;
            }
        }
    }

    if let Some(Identity { username, room }) = &identity {
        state
            .chat
            .send(room, ServerEvent::system(format!("{username} has left the room.")))
            .await;
        info!("{username} disconnected.");
    }
    if let Some(task) = forward {
        task.abort();
    }
    writer.abort();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(event: &ServerEvent) -> &str {
        let ServerEvent::ChatMessage { text, .. } = event;
        text
    }

    #[tokio::test]
    async fn join_creates_room_and_receives_broadcasts() {
        let rooms = ChatRooms::new();
        let mut rx = rooms.join("garage-floor").await;
        rooms
            .send("garage-floor", ServerEvent::chat("ravi", "brake pads in?".to_owned()))
            .await;
        let event = rx.recv().await.expect("event");
        assert_eq!(text_of(&event), "brake pads in?");
    }

    #[tokio::test]
    async fn send_to_empty_room_is_a_noop() {
        let rooms = ChatRooms::new();
        rooms
            .send("nobody-here", ServerEvent::system("hello".to_owned()))
            .await;
    }

    #[tokio::test]
    async fn rooms_are_isolated() {
        let rooms = ChatRooms::new();
        let mut floor = rooms.join("floor").await;
        let mut office = rooms.join("office").await;
        rooms
            .send("floor", ServerEvent::chat("ravi", "lift 2 free".to_owned()))
            .await;
        assert_eq!(text_of(&floor.recv().await.expect("event")), "lift 2 free");
        assert!(office.try_recv().is_err());
    }

    #[test]
    fn client_events_parse_from_tagged_json() {
        let join: ClientEvent =
            serde_json::from_str(r#"{"type":"joinRoom","username":"ravi","room":"floor"}"#)
                .expect("join");
        assert!(matches!(join, ClientEvent::JoinRoom { .. }));
        let message: ClientEvent =
            serde_json::from_str(r#"{"type":"chatMessage","text":"hi"}"#).expect("message");
        assert!(matches!(message, ClientEvent::ChatMessage { .. }));
    }

    #[test]
    fn server_event_serializes_with_type_tag() {
        let event = ServerEvent::chat("ravi", "hi".to_owned());
        let json = serde_json::to_value(&event).expect("json");
        assert_eq!(json["type"], "chatMessage");
        assert_eq!(json["username"], "ravi");
    }
}

pub mod guards;

use std::{
    collections::{HashMap, HashSet},
    sync::atomic::{AtomicU64, Ordering},
};

use actix_web::{web, HttpRequest, HttpResponse};
use actix_ws::{Message as WsMessage, MessageStream, Session};
use bson::{doc, oid::ObjectId};
use chrono::{DateTime, Utc};
use futures::{lock::Mutex, StreamExt};
use serde::{Deserialize, Serialize};

use crate::{
    db::AppState,
    models::{conversation::Conversation, message::Message},
};

/// Events the app sends over the socket. Kebab-case tags and camelCase fields
/// keep the wire format the mobile client already speaks.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    Join {
        user_id: String,
        conversation_id: String,
    },
    Leave {
        user_id: String,
        conversation_id: String,
    },
    SendMessage {
        conversation_id: String,
        sender: String,
        text: String,
        #[serde(default)]
        images: Option<String>,
    },
    MarkAsRead {
        user_id: String,
        conversation_id: String,
    },
    Typing {
        user_id: String,
        conversation_id: String,
    },
    StopTyping {
        user_id: String,
        conversation_id: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    ReceiveMessage {
        id: String,
        conversation_id: String,
        text: String,
        sender: String,
        images: Option<String>,
        read: bool,
        created_at: DateTime<Utc>,
    },
    MessagesMarkedRead {
        conversation_id: String,
        user_id: String,
    },
    UserTyping {
        user_id: String,
        conversation_id: String,
    },
    UserStoppedTyping {
        user_id: String,
        conversation_id: String,
    },
    Error {
        message: String,
    },
}

/// Room registry: conversation id -> connected sessions.
pub struct ChatRooms {
    next_conn: AtomicU64,
    rooms: Mutex<HashMap<String, HashMap<u64, Session>>>,
}

impl Default for ChatRooms {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatRooms {
    pub fn new() -> Self {
        Self {
            next_conn: AtomicU64::new(1),
            rooms: Mutex::new(HashMap::new()),
        }
    }

    fn next_conn_id(&self) -> u64 {
        self.next_conn.fetch_add(1, Ordering::Relaxed)
    }

    async fn join(&self, room: &str, conn_id: u64, session: Session) {
        let mut rooms = self.rooms.lock().await;
        rooms
            .entry(room.to_string())
            .or_default()
            .insert(conn_id, session);
    }

    async fn leave(&self, room: &str, conn_id: u64) {
        let mut rooms = self.rooms.lock().await;
        if let Some(members) = rooms.get_mut(room) {
            members.remove(&conn_id);
            if members.is_empty() {
                rooms.remove(room);
            }
        }
    }

    /// Send to everyone in the room; `exclude` skips the sender for typing
    /// indicators. Sessions that fail to receive are dropped from the room.
    async fn broadcast(&self, room: &str, event: &ServerEvent, exclude: Option<u64>) {
        let Ok(payload) = serde_json::to_string(event) else {
            return;
        };

        let members: Vec<(u64, Session)> = {
            let rooms = self.rooms.lock().await;
            match rooms.get(room) {
                Some(members) => members
                    .iter()
                    .filter(|(id, _)| Some(**id) != exclude)
                    .map(|(id, s)| (*id, s.clone()))
                    .collect(),
                None => return,
            }
        };

        let mut dead: Vec<u64> = Vec::new();
        for (conn_id, mut session) in members {
            if session.text(payload.clone()).await.is_err() {
                dead.push(conn_id);
            }
        }

        if !dead.is_empty() {
            let mut rooms = self.rooms.lock().await;
            if let Some(members) = rooms.get_mut(room) {
                for conn_id in dead {
                    members.remove(&conn_id);
                }
            }
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/ws", web::get().to(ws_entry));
}

async fn ws_entry(
    req: HttpRequest,
    body: web::Payload,
    state: web::Data<AppState>,
    rooms: web::Data<ChatRooms>,
) -> Result<HttpResponse, actix_web::Error> {
    let (response, session, stream) = actix_ws::handle(&req, body)?;

    actix_web::rt::spawn(run_session(
        state.get_ref().clone(),
        rooms,
        session,
        stream,
    ));

    Ok(response)
}

async fn run_session(
    state: AppState,
    rooms: web::Data<ChatRooms>,
    mut session: Session,
    mut stream: MessageStream,
) {
    let conn_id = rooms.next_conn_id();
    let mut joined: HashSet<String> = HashSet::new();

    while let Some(Ok(msg)) = stream.next().await {
        match msg {
            WsMessage::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => {
                    handle_event(&state, &rooms, conn_id, &mut session, &mut joined, event).await;
                }
                Err(_) => {
                    send_error(&mut session, "Malformed event").await;
                }
            },
            WsMessage::Ping(bytes) => {
                if session.pong(&bytes).await.is_err() {
                    break;
                }
            }
            WsMessage::Close(_) => break,
            _ => {}
        }
    }

    for room in &joined {
        rooms.leave(room, conn_id).await;
    }
    let _ = session.close(None).await;
}

async fn handle_event(
    state: &AppState,
    rooms: &ChatRooms,
    conn_id: u64,
    session: &mut Session,
    joined: &mut HashSet<String>,
    event: ClientEvent,
) {
    match event {
        ClientEvent::Join {
            user_id,
            conversation_id,
        } => {
            log::info!("user {user_id} joined room chat-{conversation_id}");
            rooms.join(&conversation_id, conn_id, session.clone()).await;
            joined.insert(conversation_id);
        }

        ClientEvent::Leave {
            user_id,
            conversation_id,
        } => {
            log::info!("user {user_id} left room chat-{conversation_id}");
            rooms.leave(&conversation_id, conn_id).await;
            joined.remove(&conversation_id);
        }

        ClientEvent::SendMessage {
            conversation_id,
            sender,
            text,
            images,
        } => {
            match guards::chat_block_info(&state.db, &conversation_id).await {
                Ok(info) if info.blocked => {
                    let reason = info
                        .reason
                        .unwrap_or_else(|| "Conversation is disabled".to_string());
                    send_error(session, &reason).await;
                    return;
                }
                Err(_) => {
                    send_error(session, "Failed to send message").await;
                    return;
                }
                Ok(_) => {}
            }

            match persist_message(state, &conversation_id, &sender, &text, images).await {
                Ok(message) => {
                    let event = ServerEvent::ReceiveMessage {
                        id: message.id.to_hex(),
                        conversation_id: message.conversation_id,
                        text: message.text,
                        sender: message.sender,
                        images: message.images,
                        read: false,
                        created_at: message.created_at,
                    };
                    rooms.broadcast(&conversation_id, &event, None).await;
                }
                Err(e) => {
                    log::error!("failed to persist chat message: {:?}", e);
                    send_error(session, "Failed to send message").await;
                }
            }
        }

        ClientEvent::MarkAsRead {
            user_id,
            conversation_id,
        } => {
            let messages = state.db.collection::<Message>("messages");
            let res = messages
                .update_many(
                    doc! {
                        "conversation_id": &conversation_id,
                        "sender": { "$ne": &user_id },
                        "read": { "$ne": true },
                    },
                    doc! { "$set": { "read": true } },
                    None,
                )
                .await;

            match res {
                Ok(_) => {
                    let event = ServerEvent::MessagesMarkedRead {
                        conversation_id: conversation_id.clone(),
                        user_id,
                    };
                    rooms.broadcast(&conversation_id, &event, None).await;
                }
                Err(e) => {
                    log::error!("failed to mark messages read: {:?}", e);
                    send_error(session, "Failed to mark messages as read").await;
                }
            }
        }

        ClientEvent::Typing {
            user_id,
            conversation_id,
        } => {
            let event = ServerEvent::UserTyping {
                user_id,
                conversation_id: conversation_id.clone(),
            };
            rooms.broadcast(&conversation_id, &event, Some(conn_id)).await;
        }

        ClientEvent::StopTyping {
            user_id,
            conversation_id,
        } => {
            let event = ServerEvent::UserStoppedTyping {
                user_id,
                conversation_id: conversation_id.clone(),
            };
            rooms.broadcast(&conversation_id, &event, Some(conn_id)).await;
        }
    }
}

async fn persist_message(
    state: &AppState,
    conversation_id: &str,
    sender: &str,
    text: &str,
    images: Option<String>,
) -> Result<Message, mongodb::error::Error> {
    let message = Message {
        id: ObjectId::new(),
        conversation_id: conversation_id.to_string(),
        text: text.to_string(),
        sender: sender.to_string(),
        images,
        read: false,
        created_at: Utc::now(),
    };

    let messages = state.db.collection::<Message>("messages");
    messages.insert_one(&message, None).await?;

    if let Ok(conv_oid) = ObjectId::parse_str(conversation_id) {
        let conversations = state.db.collection::<Conversation>("conversations");
        conversations
            .update_one(
                doc! { "_id": conv_oid },
                doc! { "$set": {
                    "last_message": &message.text,
                    "last_message_id": message.id.to_hex(),
                    "updated_at": Utc::now(),
                } },
                None,
            )
            .await?;
    }

    Ok(message)
}

async fn send_error(session: &mut Session, message: &str) {
    let event = ServerEvent::Error {
        message: message.to_string(),
    };
    if let Ok(payload) = serde_json::to_string(&event) {
        let _ = session.text(payload).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_events_use_the_socket_wire_format() {
        let raw = r#"{"type":"send-message","conversationId":"c1","sender":"u1","text":"hola"}"#;
        let event: ClientEvent = serde_json::from_str(raw).unwrap();
        match event {
            ClientEvent::SendMessage {
                conversation_id,
                sender,
                text,
                images,
            } => {
                assert_eq!(conversation_id, "c1");
                assert_eq!(sender, "u1");
                assert_eq!(text, "hola");
                assert!(images.is_none());
            }
            other => panic!("unexpected event: {other:?}"),
        }

        let raw = r#"{"type":"mark-as-read","userId":"u1","conversationId":"c1"}"#;
        assert!(matches!(
            serde_json::from_str::<ClientEvent>(raw).unwrap(),
            ClientEvent::MarkAsRead { .. }
        ));
    }

    #[test]
    fn server_events_tag_and_case_match_the_client() {
        let event = ServerEvent::UserTyping {
            user_id: "u1".into(),
            conversation_id: "c1".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "user-typing");
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["conversationId"], "c1");
    }
}

use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Message {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    pub conversation_id: String,
    pub text: String,
    pub sender: String,
    #[serde(default)]
    pub images: Option<String>,
    #[serde(default)]
    pub read: bool,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateMessageDto {
    pub conversation_id: String,
    pub sender: String,
    pub text: String,
    pub images: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MarkReadDto {
    pub conversation_id: String,
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct MessageOut {
    pub id: String,
    pub conversation_id: String,
    pub text: String,
    pub sender: String,
    pub images: Option<String>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Message> for MessageOut {
    fn from(m: Message) -> Self {
        Self {
            id: m.id.to_hex(),
            conversation_id: m.conversation_id,
            text: m.text,
            sender: m.sender,
            images: m.images,
            read: m.read,
            created_at: m.created_at,
        }
    }
}

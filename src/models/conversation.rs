use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Conversation {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    #[serde(default)]
    pub group_title: Option<String>,
    pub members: Vec<String>,
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub last_message: Option<String>,
    #[serde(default)]
    pub last_message_id: Option<String>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateConversationDto {
    pub group_title: Option<String>,
    pub user_id: String,
    pub seller_id: String,
    pub product_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateLastMessageDto {
    pub last_message: String,
    pub last_message_id: String,
}

/// Summary of the other participant, attached to each conversation in a
/// user's inbox.
#[derive(Debug, Serialize)]
pub struct OtherMember {
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar: String,
    pub phone_number: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ConversationOut {
    pub id: String,
    pub group_title: Option<String>,
    pub members: Vec<String>,
    pub product_id: Option<String>,
    pub last_message: Option<String>,
    pub last_message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_user: Option<OtherMember>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Conversation> for ConversationOut {
    fn from(c: Conversation) -> Self {
        Self {
            id: c.id.to_hex(),
            group_title: c.group_title,
            members: c.members,
            product_id: c.product_id,
            last_message: c.last_message,
            last_message_id: c.last_message_id,
            other_user: None,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum MemberError {
    SelfConversation,
}

/// Dedupe the member list; a two-party conversation collapsing to a single
/// member means someone tried to chat with themselves.
pub fn normalize_members(members: Vec<String>) -> Result<Vec<String>, MemberError> {
    let mut unique: Vec<String> = Vec::new();
    for m in members {
        if !unique.contains(&m) {
            unique.push(m);
        }
    }

    if unique.len() == 1 {
        return Err(MemberError::SelfConversation);
    }

    Ok(unique)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn members_are_deduped() {
        let members = normalize_members(vec!["a".into(), "b".into(), "b".into()]).unwrap();
        assert_eq!(members, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn self_conversation_is_rejected() {
        let err = normalize_members(vec!["a".into(), "a".into()]).unwrap_err();
        assert_eq!(err, MemberError::SelfConversation);
    }
}

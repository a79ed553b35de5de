use actix_web::{get, post, put, web, HttpResponse};
use bson::{doc, oid::ObjectId};
use chrono::Utc;
use futures::StreamExt;
use mongodb::options::FindOptions;

use crate::{
    chat::guards,
    db::AppState,
    errors::ApiError,
    middleware::auth::AuthUser,
    models::{
        conversation::Conversation,
        message::{CreateMessageDto, MarkReadDto, Message, MessageOut},
    },
};

pub fn messages_collection(state: &AppState) -> mongodb::Collection<Message> {
    state.db.collection::<Message>("messages")
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(create_message)
        .service(mark_read)
        .service(conversation_messages);
}

#[post("")]
async fn create_message(
    _user: AuthUser,
    state: web::Data<AppState>,
    body: web::Json<CreateMessageDto>,
) -> Result<HttpResponse, ApiError> {
    let dto = body.into_inner();

    if dto.text.trim().is_empty() && dto.images.is_none() {
        return Err(ApiError::BadRequest("Message is empty".into()));
    }

    // listings that are sold or inactive close their conversations
    let block = guards::chat_block_info(&state.db, &dto.conversation_id).await?;
    if block.blocked {
        let reason = block
            .reason
            .unwrap_or_else(|| "Conversation is disabled".to_string());
        return Err(ApiError::Forbidden(reason));
    }

    let message = Message {
        id: ObjectId::new(),
        conversation_id: dto.conversation_id.clone(),
        text: dto.text,
        sender: dto.sender,
        images: dto.images,
        read: false,
        created_at: Utc::now(),
    };

    messages_collection(&state)
        .insert_one(&message, None)
        .await
        .map_err(|e| {
            log::error!("Mongo insert_one error (create_message): {:?}", e);
            ApiError::Internal
        })?;

    if let Ok(conv_oid) = ObjectId::parse_str(&dto.conversation_id) {
        state
            .db
            .collection::<Conversation>("conversations")
            .update_one(
                doc! { "_id": conv_oid },
                doc! { "$set": {
                    "last_message": &message.text,
                    "last_message_id": message.id.to_hex(),
                    "updated_at": Utc::now(),
                } },
                None,
            )
            .await
            .map_err(|e| {
                log::error!("Mongo update_one error (create_message conv): {:?}", e);
                ApiError::Internal
            })?;
    }

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "message": MessageOut::from(message),
    })))
}

#[put("/read")]
async fn mark_read(
    _user: AuthUser,
    state: web::Data<AppState>,
    body: web::Json<MarkReadDto>,
) -> Result<HttpResponse, ApiError> {
    let res = messages_collection(&state)
        .update_many(
            doc! {
                "conversation_id": &body.conversation_id,
                "sender": { "$ne": &body.user_id },
                "read": { "$ne": true },
            },
            doc! { "$set": { "read": true } },
            None,
        )
        .await
        .map_err(|e| {
            log::error!("Mongo update_many error (mark_read): {:?}", e);
            ApiError::Internal
        })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "marked": res.modified_count,
    })))
}

#[get("/{conversationId}")]
async fn conversation_messages(
    _user: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let conversation_id = path.into_inner();

    let options = FindOptions::builder()
        .sort(doc! { "created_at": 1 })
        .build();

    let mut cursor = messages_collection(&state)
        .find(doc! { "conversation_id": &conversation_id }, options)
        .await
        .map_err(|e| {
            log::error!("Mongo find error (conversation_messages): {:?}", e);
            ApiError::Internal
        })?;

    let mut out: Vec<MessageOut> = Vec::new();
    while let Some(item) = cursor.next().await {
        let m = item.map_err(|e| {
            log::error!("Mongo cursor error (conversation_messages): {:?}", e);
            ApiError::Internal
        })?;
        out.push(MessageOut::from(m));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "messages": out,
    })))
}

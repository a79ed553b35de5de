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
        conversation::{
            normalize_members, Conversation, ConversationOut, CreateConversationDto, OtherMember,
            UpdateLastMessageDto,
        },
        shop::Shop,
        user::User,
    },
};

pub fn conversations_collection(state: &AppState) -> mongodb::Collection<Conversation> {
    state.db.collection::<Conversation>("conversations")
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(create_conversation)
        .service(user_conversations)
        .service(conversation_status)
        .service(update_last_message);
}

#[post("")]
async fn create_conversation(
    _user: AuthUser,
    state: web::Data<AppState>,
    body: web::Json<CreateConversationDto>,
) -> Result<HttpResponse, ApiError> {
    let dto = body.into_inner();

    let members = normalize_members(vec![dto.user_id, dto.seller_id])
        .map_err(|_| ApiError::BadRequest("Cannot create conversation with yourself".into()))?;

    let col = conversations_collection(&state);

    // an existing conversation between the pair is returned as-is
    let existing = col
        .find_one(doc! { "members": { "$all": &members } }, None)
        .await
        .map_err(|e| {
            log::error!("Mongo find_one error (create_conversation): {:?}", e);
            ApiError::Internal
        })?;

    if let Some(conversation) = existing {
        return Ok(HttpResponse::Created().json(serde_json::json!({
            "success": true,
            "conversation": ConversationOut::from(conversation),
        })));
    }

    let now = Utc::now();
    let conversation = Conversation {
        id: ObjectId::new(),
        group_title: dto.group_title,
        members,
        product_id: dto.product_id,
        last_message: None,
        last_message_id: None,
        created_at: now,
        updated_at: now,
    };

    col.insert_one(&conversation, None).await.map_err(|e| {
        log::error!("Mongo insert_one error (create_conversation): {:?}", e);
        ApiError::Internal
    })?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "conversation": ConversationOut::from(conversation),
    })))
}

/// Summary of the member that is not `me`: shops win over users, matching the
/// inbox the mobile app renders.
async fn other_member(state: &AppState, member_id: &str) -> Result<Option<OtherMember>, ApiError> {
    let Ok(oid) = ObjectId::parse_str(member_id) else {
        return Ok(None);
    };

    let shop = state
        .db
        .collection::<Shop>("shops")
        .find_one(doc! { "_id": oid }, None)
        .await
        .map_err(|e| {
            log::error!("Mongo find_one error (other_member shop): {:?}", e);
            ApiError::Internal
        })?;

    if let Some(shop) = shop {
        return Ok(Some(OtherMember {
            id: shop.id.to_hex(),
            name: shop.name,
            email: shop.email,
            avatar: shop.avatar,
            phone_number: Some(shop.phone_number),
            address: Some(shop.address),
        }));
    }

    let user = state
        .db
        .collection::<User>("users")
        .find_one(doc! { "_id": oid }, None)
        .await
        .map_err(|e| {
            log::error!("Mongo find_one error (other_member user): {:?}", e);
            ApiError::Internal
        })?;

    Ok(user.map(|u| {
        let phone = if u.hide_phone_number {
            None
        } else {
            Some(u.phone_number.clone())
        };
        OtherMember {
            id: u.id.to_hex(),
            name: u.name,
            email: u.email,
            avatar: u.avatar,
            phone_number: phone,
            address: None,
        }
    }))
}

#[get("/user/{id}")]
async fn user_conversations(
    _user: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();

    let options = FindOptions::builder()
        .sort(doc! { "updated_at": -1, "created_at": -1 })
        .build();

    let mut cursor = conversations_collection(&state)
        .find(doc! { "members": { "$in": [&id] } }, options)
        .await
        .map_err(|e| {
            log::error!("Mongo find error (user_conversations): {:?}", e);
            ApiError::Internal
        })?;

    let mut out: Vec<ConversationOut> = Vec::new();
    while let Some(item) = cursor.next().await {
        let conversation = item.map_err(|e| {
            log::error!("Mongo cursor error (user_conversations): {:?}", e);
            ApiError::Internal
        })?;

        let other_id = conversation
            .members
            .iter()
            .find(|m| **m != id)
            .cloned();

        let mut conv_out = ConversationOut::from(conversation);
        if let Some(other_id) = other_id {
            conv_out.other_user = other_member(&state, &other_id).await?;
        }
        out.push(conv_out);
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "conversations": out,
    })))
}

#[get("/{id}/status")]
async fn conversation_status(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let info = guards::chat_block_info(&state.db, &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(info))
}

#[put("/{id}/last-message")]
async fn update_last_message(
    _user: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UpdateLastMessageDto>,
) -> Result<HttpResponse, ApiError> {
    let id = ObjectId::parse_str(path.into_inner())
        .map_err(|_| ApiError::BadRequest("Invalid conversation id".into()))?;

    let res = conversations_collection(&state)
        .update_one(
            doc! { "_id": id },
            doc! { "$set": {
                "last_message": &body.last_message,
                "last_message_id": &body.last_message_id,
                "updated_at": Utc::now(),
            } },
            None,
        )
        .await
        .map_err(|e| {
            log::error!("Mongo update_one error (update_last_message): {:?}", e);
            ApiError::Internal
        })?;

    if res.matched_count == 0 {
        return Err(ApiError::NotFound("Conversation not found".into()));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}

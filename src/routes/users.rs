use actix_web::{get, put, web, HttpResponse};
use bson::{doc, oid::ObjectId};
use chrono::Utc;
use validator::Validate;

use crate::{
    db::AppState,
    errors::ApiError,
    middleware::auth::AuthUser,
    models::user::{
        HidePhoneDto, PublicUser, PushTokenDto, UpdateLocationDto, UpdateProfileDto, User,
    },
    routes::auth::users_collection,
};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(update_profile)
        .service(update_location)
        .service(update_push_token)
        .service(update_hide_phone)
        .service(get_user);
}

#[get("/{id}")]
async fn get_user(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = ObjectId::parse_str(path.into_inner())
        .map_err(|_| ApiError::BadRequest("Invalid user id".into()))?;

    let col = users_collection(&state);
    let user = col
        .find_one(doc! { "_id": id }, None)
        .await
        .map_err(|e| {
            log::error!("Mongo find_one error (get_user): {:?}", e);
            ApiError::Internal
        })?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    Ok(HttpResponse::Ok().json(PublicUser::from(user)))
}

#[put("/profile")]
async fn update_profile(
    user: AuthUser,
    state: web::Data<AppState>,
    body: web::Json<UpdateProfileDto>,
) -> Result<HttpResponse, ApiError> {
    let dto = body.into_inner();
    dto.validate()
        .map_err(|e: validator::ValidationErrors| ApiError::BadRequest(e.to_string()))?;

    let id = ObjectId::parse_str(&user.user_id)
        .map_err(|_| ApiError::Unauthorized("Invalid token subject".into()))?;

    let mut set = doc! {};
    if let Some(name) = dto.name {
        set.insert("name", name.trim());
    }
    if let Some(avatar) = dto.avatar {
        set.insert("avatar", avatar);
    }

    if set.is_empty() {
        return Err(ApiError::BadRequest("Nothing to update".into()));
    }

    let col = users_collection(&state);
    let res = col
        .update_one(doc! { "_id": id }, doc! { "$set": set }, None)
        .await
        .map_err(|e| {
            log::error!("Mongo update_one error (update_profile): {:?}", e);
            ApiError::Internal
        })?;

    if res.matched_count == 0 {
        return Err(ApiError::NotFound("User not found".into()));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}

#[put("/update-location")]
async fn update_location(
    user: AuthUser,
    state: web::Data<AppState>,
    body: web::Json<UpdateLocationDto>,
) -> Result<HttpResponse, ApiError> {
    let id = ObjectId::parse_str(&user.user_id)
        .map_err(|_| ApiError::Unauthorized("Invalid token subject".into()))?;

    let col = users_collection(&state);
    let res = col
        .update_one(
            doc! { "_id": id },
            doc! { "$set": { "last_known_location": {
                "latitude": body.latitude,
                "longitude": body.longitude,
                "address": body.address.as_deref(),
                "updated_at": Utc::now(),
            } } },
            None,
        )
        .await
        .map_err(|e| {
            log::error!("Mongo update_one error (update_location): {:?}", e);
            ApiError::Internal
        })?;

    if res.matched_count == 0 {
        return Err(ApiError::NotFound("User not found".into()));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}

#[put("/push-token")]
async fn update_push_token(
    user: AuthUser,
    state: web::Data<AppState>,
    body: web::Json<PushTokenDto>,
) -> Result<HttpResponse, ApiError> {
    let id = ObjectId::parse_str(&user.user_id)
        .map_err(|_| ApiError::Unauthorized("Invalid token subject".into()))?;

    let col: mongodb::Collection<User> = users_collection(&state);
    let update = match &body.push_token {
        Some(token) => doc! { "$set": { "push_token": token } },
        None => doc! { "$unset": { "push_token": "" } },
    };

    let res = col
        .update_one(doc! { "_id": id }, update, None)
        .await
        .map_err(|e| {
            log::error!("Mongo update_one error (update_push_token): {:?}", e);
            ApiError::Internal
        })?;

    if res.matched_count == 0 {
        return Err(ApiError::NotFound("User not found".into()));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}

#[put("/hide-phone")]
async fn update_hide_phone(
    user: AuthUser,
    state: web::Data<AppState>,
    body: web::Json<HidePhoneDto>,
) -> Result<HttpResponse, ApiError> {
    let id = ObjectId::parse_str(&user.user_id)
        .map_err(|_| ApiError::Unauthorized("Invalid token subject".into()))?;

    let col = users_collection(&state);
    let res = col
        .update_one(
            doc! { "_id": id },
            doc! { "$set": { "hide_phone_number": body.hide_phone_number } },
            None,
        )
        .await
        .map_err(|e| {
            log::error!("Mongo update_one error (update_hide_phone): {:?}", e);
            ApiError::Internal
        })?;

    if res.matched_count == 0 {
        return Err(ApiError::NotFound("User not found".into()));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "hide_phone_number": body.hide_phone_number,
    })))
}

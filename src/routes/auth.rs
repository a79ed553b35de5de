use actix_web::{get, post, put, web, HttpResponse};
use bson::{doc, oid::ObjectId};
use chrono::{Duration, Utc};
use mongodb::{options::FindOneOptions, options::IndexOptions, IndexModel};
use validator::Validate;

use crate::{
    config::AppConfig,
    db::AppState,
    errors::ApiError,
    middleware::auth::AuthUser,
    models::user::{
        check_otp, AuthResponse, LoginDto, Otp, OtpOutcome, PublicUser, RegisterDto,
        UpdatePasswordDto, User, VerifyOtpDto,
    },
    utils::{jwt, otp, password},
};

pub fn users_collection(state: &AppState) -> mongodb::Collection<User> {
    state.db.collection::<User>("users")
}

// Índices únicos; si fallan se loggea pero NO rompe el arranque.
async fn ensure_user_indexes(state: &AppState) {
    let col = users_collection(state);

    let specs = [
        (doc! { "email": 1 }, "unique_email", false),
        (doc! { "phone_number": 1 }, "unique_phone", false),
        (doc! { "user_id": 1 }, "unique_user_id", true),
    ];

    for (keys, name, sparse) in specs {
        let options = IndexOptions::builder()
            .unique(true)
            .sparse(sparse)
            .name(Some(name.to_string()))
            .build();

        let model = IndexModel::builder().keys(keys).options(options).build();

        if let Err(e) = col.create_index(model, None).await {
            log::error!("Mongo create_index error ({name}): {:?}", e);
        }
    }
}

/// Highest numeric user id + 1, starting at 1. Matches the legacy incremental
/// ids; a race surfaces as a duplicate-key error on the sparse unique index.
async fn next_user_id(col: &mongodb::Collection<User>) -> Result<i64, ApiError> {
    let options = FindOneOptions::builder()
        .sort(doc! { "user_id": -1 })
        .build();

    let last = col
        .find_one(doc! { "user_id": { "$exists": true } }, options)
        .await
        .map_err(|e| {
            log::error!("Mongo find_one error (next_user_id): {:?}", e);
            ApiError::Internal
        })?;

    Ok(last.and_then(|u| u.user_id).unwrap_or(0) + 1)
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(register)
        .service(login)
        .service(me)
        .service(send_otp)
        .service(verify_otp)
        .service(update_password);
}

#[post("/register")]
async fn register(
    cfg: web::Data<AppConfig>,
    state: web::Data<AppState>,
    body: web::Json<RegisterDto>,
) -> Result<HttpResponse, ApiError> {
    ensure_user_indexes(&state).await;

    let mut dto = body.into_inner();

    dto.email = dto.email.trim().to_lowercase();
    dto.name = dto.name.trim().to_string();
    dto.phone_number = dto.phone_number.trim().to_string();

    dto.validate()
        .map_err(|e: validator::ValidationErrors| ApiError::BadRequest(e.to_string()))?;

    if !dto.phone_number.chars().all(|c| c.is_ascii_digit()) {
        return Err(ApiError::BadRequest(format!(
            "{} is not a valid phone number",
            dto.phone_number
        )));
    }

    let col = users_collection(&state);

    let existing = col
        .find_one(
            doc! { "$or": [
                { "email": &dto.email },
                { "phone_number": &dto.phone_number },
            ] },
            None,
        )
        .await
        .map_err(|e| {
            log::error!("Mongo find_one error (register): {:?}", e);
            ApiError::Internal
        })?;

    if existing.is_some() {
        return Err(ApiError::BadRequest(
            "Email or phone number already registered".into(),
        ));
    }

    let hash = password::hash_password(&dto.password).map_err(ApiError::BadRequest)?;
    let user_id = next_user_id(&col).await?;

    let user = User {
        id: ObjectId::new(),
        user_id: Some(user_id),
        name: dto.name,
        email: dto.email,
        phone_number: dto.phone_number,
        role: "user".to_string(),
        avatar: dto.avatar,
        password_hash: Some(hash),
        addresses: Vec::new(),
        last_known_location: None,
        push_token: None,
        otp: None,
        is_phone_verified: false,
        hide_phone_number: false,
        contact_views: 0,
        viewed_contacts: Vec::new(),
        has_unlimited_contacts: false,
        subscription_expiry: None,
        contact_credits: cfg.free_contact_credits,
        created_at: Utc::now(),
    };

    col.insert_one(&user, None).await.map_err(|e| {
        log::error!("Mongo insert_one error (register): {:?}", e);
        // the unique index may have caught a concurrent registration
        ApiError::Conflict("Email or phone number already registered".into())
    })?;

    let token = jwt::sign_jwt(
        &user.id.to_hex(),
        &user.role,
        user.is_phone_verified,
        &cfg.jwt_secret,
        cfg.jwt_exp_minutes,
    )
    .map_err(ApiError::BadRequest)?;

    Ok(HttpResponse::Created().json(AuthResponse {
        token,
        user: user.into(),
    }))
}

#[post("/login")]
async fn login(
    cfg: web::Data<AppConfig>,
    state: web::Data<AppState>,
    body: web::Json<LoginDto>,
) -> Result<HttpResponse, ApiError> {
    let mut dto = body.into_inner();
    dto.email = dto.email.trim().to_lowercase();

    dto.validate()
        .map_err(|e: validator::ValidationErrors| ApiError::BadRequest(e.to_string()))?;

    let col = users_collection(&state);

    let user = col
        .find_one(doc! { "email": &dto.email }, None)
        .await
        .map_err(|e| {
            log::error!("Mongo find_one error (login): {:?}", e);
            ApiError::Internal
        })?
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".into()))?;

    let hash = user
        .password_hash
        .as_deref()
        .ok_or_else(|| ApiError::Unauthorized("User has no password set".into()))?;

    let ok = password::verify_password(&dto.password, hash).map_err(ApiError::BadRequest)?;

    if !ok {
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    }

    let token = jwt::sign_jwt(
        &user.id.to_hex(),
        &user.role,
        user.is_phone_verified,
        &cfg.jwt_secret,
        cfg.jwt_exp_minutes,
    )
    .map_err(ApiError::BadRequest)?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        token,
        user: user.into(),
    }))
}

#[get("/me")]
async fn me(user: AuthUser, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let id = ObjectId::parse_str(&user.user_id)
        .map_err(|_| ApiError::Unauthorized("Invalid token subject".into()))?;

    let col = users_collection(&state);
    let doc = col
        .find_one(doc! { "_id": id }, None)
        .await
        .map_err(|e| {
            log::error!("Mongo find_one error (me): {:?}", e);
            ApiError::Internal
        })?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    Ok(HttpResponse::Ok().json(PublicUser::from(doc)))
}

#[post("/send-otp")]
async fn send_otp(user: AuthUser, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let id = ObjectId::parse_str(&user.user_id)
        .map_err(|_| ApiError::Unauthorized("Invalid token subject".into()))?;

    let code = otp::generate_code();
    let entry = Otp {
        code: code.clone(),
        expires_at: Utc::now() + Duration::minutes(otp::OTP_TTL_MINUTES),
    };

    let col = users_collection(&state);
    let res = col
        .update_one(
            doc! { "_id": id },
            doc! { "$set": { "otp": bson::to_bson(&entry).map_err(|_| ApiError::Internal)? } },
            None,
        )
        .await
        .map_err(|e| {
            log::error!("Mongo update_one error (send_otp): {:?}", e);
            ApiError::Internal
        })?;

    if res.matched_count == 0 {
        return Err(ApiError::NotFound("User not found".into()));
    }

    // No SMS gateway: the code goes back in the response for the client to
    // forward (dev behavior inherited from the mobile app).
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "otp": code,
        "expires_in_minutes": otp::OTP_TTL_MINUTES,
    })))
}

#[post("/verify-otp")]
async fn verify_otp(
    user: AuthUser,
    state: web::Data<AppState>,
    body: web::Json<VerifyOtpDto>,
) -> Result<HttpResponse, ApiError> {
    let id = ObjectId::parse_str(&user.user_id)
        .map_err(|_| ApiError::Unauthorized("Invalid token subject".into()))?;

    let col = users_collection(&state);
    let doc = col
        .find_one(doc! { "_id": id }, None)
        .await
        .map_err(|e| {
            log::error!("Mongo find_one error (verify_otp): {:?}", e);
            ApiError::Internal
        })?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    match check_otp(&doc.otp, body.code.trim(), Utc::now()) {
        OtpOutcome::Verified => {
            col.update_one(
                doc! { "_id": id },
                doc! {
                    "$set": { "is_phone_verified": true },
                    "$unset": { "otp": "" },
                },
                None,
            )
            .await
            .map_err(|e| {
                log::error!("Mongo update_one error (verify_otp): {:?}", e);
                ApiError::Internal
            })?;

            Ok(HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "is_phone_verified": true,
            })))
        }
        OtpOutcome::Expired => {
            // clear the stale code so the client gets a clean retry
            col.update_one(doc! { "_id": id }, doc! { "$unset": { "otp": "" } }, None)
                .await
                .map_err(|e| {
                    log::error!("Mongo update_one error (verify_otp clear): {:?}", e);
                    ApiError::Internal
                })?;

            Err(ApiError::BadRequest("OTP expired".into()))
        }
        OtpOutcome::Invalid => Err(ApiError::BadRequest("Invalid OTP".into())),
        OtpOutcome::Missing => Err(ApiError::BadRequest("No OTP requested".into())),
    }
}

#[put("/password")]
async fn update_password(
    user: AuthUser,
    state: web::Data<AppState>,
    body: web::Json<UpdatePasswordDto>,
) -> Result<HttpResponse, ApiError> {
    let dto = body.into_inner();
    dto.validate()
        .map_err(|e: validator::ValidationErrors| ApiError::BadRequest(e.to_string()))?;

    let id = ObjectId::parse_str(&user.user_id)
        .map_err(|_| ApiError::Unauthorized("Invalid token subject".into()))?;

    let col = users_collection(&state);
    let doc = col
        .find_one(doc! { "_id": id }, None)
        .await
        .map_err(|e| {
            log::error!("Mongo find_one error (update_password): {:?}", e);
            ApiError::Internal
        })?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let hash = doc
        .password_hash
        .as_deref()
        .ok_or_else(|| ApiError::Unauthorized("User has no password set".into()))?;

    let ok = password::verify_password(&dto.old_password, hash).map_err(ApiError::BadRequest)?;
    if !ok {
        return Err(ApiError::Unauthorized("Old password is incorrect".into()));
    }

    let new_hash = password::hash_password(&dto.new_password).map_err(ApiError::BadRequest)?;

    col.update_one(
        doc! { "_id": id },
        doc! { "$set": { "password_hash": new_hash } },
        None,
    )
    .await
    .map_err(|e| {
        log::error!("Mongo update_one error (update_password): {:?}", e);
        ApiError::Internal
    })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}

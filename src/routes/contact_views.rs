use actix_web::{get, post, put, web, HttpResponse};
use bson::{doc, oid::ObjectId};
use chrono::{Months, Utc};
use serde::Deserialize;

use crate::{
    db::AppState,
    errors::ApiError,
    models::user::{
        charge_credits, days_remaining, merge_viewed_contacts, subscription_active, User,
    },
    routes::auth::users_collection,
};

#[derive(Debug, Deserialize)]
pub struct UpdateContactViewsDto {
    #[serde(default)]
    pub viewed_contacts: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct ResetContactViewsDto {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct AddCreditsDto {
    pub user_id: String,
    pub credits: i64,
    pub amount: i64,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ActivateSubscriptionDto {
    pub user_id: String,
    pub plan: String,
    pub duration: String, // "monthly" | "yearly"
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(reset_contact_views)
        .service(get_contact_views)
        .service(update_contact_views)
        .service(add_contact_credits)
        .service(activate_subscription)
        .service(subscription_status);
}

async fn load_user(state: &AppState, user_id: &str) -> Result<(ObjectId, User), ApiError> {
    let oid = ObjectId::parse_str(user_id)
        .map_err(|_| ApiError::BadRequest("Invalid user id".into()))?;

    let user = users_collection(state)
        .find_one(doc! { "_id": oid }, None)
        .await
        .map_err(|e| {
            log::error!("Mongo find_one error (contact views): {:?}", e);
            ApiError::Internal
        })?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    Ok((oid, user))
}

/// Expired subscriptions are downgraded lazily on read; returns whether the
/// user still has unlimited contacts.
async fn lazy_expiry_check(
    state: &AppState,
    oid: ObjectId,
    user: &User,
) -> Result<bool, ApiError> {
    let active = subscription_active(
        user.has_unlimited_contacts,
        user.subscription_expiry,
        Utc::now(),
    );

    if user.has_unlimited_contacts && !active {
        users_collection(state)
            .update_one(
                doc! { "_id": oid },
                doc! { "$set": {
                    "has_unlimited_contacts": false,
                    "subscription_expiry": null,
                } },
                None,
            )
            .await
            .map_err(|e| {
                log::error!("Mongo update_one error (lazy expiry): {:?}", e);
                ApiError::Internal
            })?;
    }

    Ok(active)
}

#[get("/contact-views/{userId}")]
async fn get_contact_views(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let (oid, user) = load_user(&state, &path.into_inner()).await?;
    let has_unlimited = lazy_expiry_check(&state, oid, &user).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "contact_views": user.contact_views,
        "viewed_contacts": user.viewed_contacts,
        "has_unlimited_contacts": has_unlimited,
        "subscription_expiry": if has_unlimited { user.subscription_expiry } else { None },
        "contact_credits": user.contact_credits,
    })))
}

/// Called every time the client reveals a contact. Stored ids stay a set,
/// `contact_views` tracks its size, and credits are charged only for ids the
/// user has never revealed before (and only without an unlimited plan).
#[put("/contact-views/{userId}")]
async fn update_contact_views(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UpdateContactViewsDto>,
) -> Result<HttpResponse, ApiError> {
    let (oid, user) = load_user(&state, &path.into_inner()).await?;

    let incoming = body
        .into_inner()
        .viewed_contacts
        .unwrap_or_else(|| user.viewed_contacts.clone());

    let merge = merge_viewed_contacts(&user.viewed_contacts, &incoming);

    let mut set = doc! {
        "contact_views": merge.final_viewed.len() as i64,
        "viewed_contacts": &merge.final_viewed,
    };

    let mut credits = user.contact_credits;
    if !user.has_unlimited_contacts && merge.newly_added > 0 {
        credits = charge_credits(user.contact_credits, merge.newly_added);
        set.insert("contact_credits", credits);
    }

    users_collection(&state)
        .update_one(doc! { "_id": oid }, doc! { "$set": set }, None)
        .await
        .map_err(|e| {
            log::error!("Mongo update_one error (update_contact_views): {:?}", e);
            ApiError::Internal
        })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "contact_views": merge.final_viewed.len() as i64,
        "viewed_contacts": merge.final_viewed,
        "contact_credits": credits,
    })))
}

#[post("/contact-views/reset")]
async fn reset_contact_views(
    state: web::Data<AppState>,
    body: web::Json<ResetContactViewsDto>,
) -> Result<HttpResponse, ApiError> {
    let (oid, _) = load_user(&state, &body.user_id).await?;

    users_collection(&state)
        .update_one(
            doc! { "_id": oid },
            doc! { "$set": {
                "contact_views": 0i64,
                "viewed_contacts": [],
                "contact_credits": 0i64,
            } },
            None,
        )
        .await
        .map_err(|e| {
            log::error!("Mongo update_one error (reset_contact_views): {:?}", e);
            ApiError::Internal
        })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Contact views and credits reset successfully",
        "contact_views": 0,
        "viewed_contacts": [],
        "contact_credits": 0,
    })))
}

#[post("/contact-credits/add")]
async fn add_contact_credits(
    state: web::Data<AppState>,
    body: web::Json<AddCreditsDto>,
) -> Result<HttpResponse, ApiError> {
    let dto = body.into_inner();

    if dto.credits <= 0 || dto.amount <= 0 {
        return Err(ApiError::BadRequest(
            "credits and amount must be positive".into(),
        ));
    }

    let (oid, user) = load_user(&state, &dto.user_id).await?;
    let updated = user.contact_credits + dto.credits;

    users_collection(&state)
        .update_one(
            doc! { "_id": oid },
            doc! { "$set": { "contact_credits": updated } },
            None,
        )
        .await
        .map_err(|e| {
            log::error!("Mongo update_one error (add_contact_credits): {:?}", e);
            ApiError::Internal
        })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "contact_credits": updated,
        "contact_views": user.contact_views,
        "message": format!("{} credits added successfully", dto.credits),
    })))
}

#[post("/subscription/activate")]
async fn activate_subscription(
    state: web::Data<AppState>,
    body: web::Json<ActivateSubscriptionDto>,
) -> Result<HttpResponse, ApiError> {
    let dto = body.into_inner();
    let (oid, _) = load_user(&state, &dto.user_id).await?;

    let months = match dto.duration.as_str() {
        "monthly" => Months::new(1),
        "yearly" => Months::new(12),
        _ => {
            return Err(ApiError::BadRequest(
                "Invalid duration. Use 'monthly' or 'yearly'".into(),
            ))
        }
    };

    let expiry = Utc::now()
        .checked_add_months(months)
        .ok_or(ApiError::Internal)?;

    users_collection(&state)
        .update_one(
            doc! { "_id": oid },
            doc! { "$set": {
                "has_unlimited_contacts": true,
                "subscription_expiry": expiry,
            } },
            None,
        )
        .await
        .map_err(|e| {
            log::error!("Mongo update_one error (activate_subscription): {:?}", e);
            ApiError::Internal
        })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "has_unlimited_contacts": true,
        "subscription_expiry": expiry,
        "plan": dto.plan,
        "message": "Unlimited contacts subscription activated successfully",
    })))
}

#[get("/subscription/{userId}")]
async fn subscription_status(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let (oid, user) = load_user(&state, &path.into_inner()).await?;
    let has_unlimited = lazy_expiry_check(&state, oid, &user).await?;

    let (expiry, days) = if has_unlimited {
        match user.subscription_expiry {
            Some(expiry) => (Some(expiry), days_remaining(expiry, Utc::now())),
            None => (None, 0),
        }
    } else {
        (None, 0)
    };

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "has_unlimited_contacts": has_unlimited,
        "subscription_expiry": expiry,
        "days_remaining": days,
        "contact_credits": user.contact_credits,
        "contact_views": user.contact_views,
    })))
}

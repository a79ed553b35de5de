use actix_web::{get, post, web, HttpResponse};
use bson::{doc, oid::ObjectId};
use chrono::Utc;
use serde::Deserialize;

use crate::{
    catalog,
    db::AppState,
    errors::ApiError,
    middleware::auth::AuthUser,
    models::{
        category::Category,
        user_post::{self, UserPost},
    },
};

#[derive(Debug, Deserialize)]
pub struct CheckPostCostDto {
    pub category_name: String,
}

pub fn user_posts_collection(state: &AppState) -> mongodb::Collection<UserPost> {
    state.db.collection::<UserPost>("user_posts")
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(check_post_cost).service(posting_stats);
}

/// Live free listings of a user in a category. Deleted listings give their
/// free slot back, which is why this count, not the ledger, decides whether
/// the next post is free.
pub async fn live_free_post_count(
    state: &AppState,
    user_oid: ObjectId,
    category_oid: ObjectId,
) -> Result<i64, ApiError> {
    let count = state
        .db
        .collection::<bson::Document>("products")
        .count_documents(
            doc! {
                "user_id": user_oid,
                "category": category_oid,
                "is_paid": false,
                "status": { "$ne": "deleted" },
            },
            None,
        )
        .await
        .map_err(|e| {
            log::error!("Mongo count_documents error (live_free_post_count): {:?}", e);
            ApiError::Internal
        })?;

    Ok(count as i64)
}

/// Counts the caller's live free listings in the category instead of trusting
/// the ledger alone, so deleting a listing gives the free slot back.
#[post("/check-post-cost")]
async fn check_post_cost(
    user: AuthUser,
    state: web::Data<AppState>,
    body: web::Json<CheckPostCostDto>,
) -> Result<HttpResponse, ApiError> {
    let dto = body.into_inner();

    let form = catalog::category_form(&dto.category_name)
        .ok_or_else(|| ApiError::BadRequest("Unknown category".into()))?;

    let user_oid = ObjectId::parse_str(&user.user_id)
        .map_err(|_| ApiError::Unauthorized("Invalid token subject".into()))?;

    let category = state
        .db
        .collection::<Category>("categories")
        .find_one(doc! { "name": form.name }, None)
        .await
        .map_err(|e| {
            log::error!("Mongo find_one error (check_post_cost): {:?}", e);
            ApiError::Internal
        })?;

    let free_used = match category {
        Some(category) => live_free_post_count(&state, user_oid, category.id).await?,
        // category not seeded yet, nobody has posted in it
        None => 0,
    };

    let can_post_free = free_used < form.free_posts;
    let cost = if can_post_free { 0 } else { form.price };

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "category": form.name,
        "can_post_free": can_post_free,
        "cost": cost,
        "free_posts_allowed": form.free_posts,
        "free_posts_used": free_used,
        "currency": "INR",
    })))
}

#[get("/stats")]
async fn posting_stats(
    user: AuthUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let user_oid = ObjectId::parse_str(&user.user_id)
        .map_err(|_| ApiError::Unauthorized("Invalid token subject".into()))?;

    let ledger = user_post::find_or_create(&user_posts_collection(&state), user_oid, Utc::now())
        .await
        .map_err(|e| {
            log::error!("Mongo error (posting_stats): {:?}", e);
            ApiError::Internal
        })?;

    let mut category_posts: Vec<serde_json::Value> = Vec::new();
    for (key, stats) in &ledger.category_posts {
        category_posts.push(serde_json::json!({
            "key": key,
            "total_posts": stats.total_posts,
            "free_posts_used": stats.free_posts_used,
            "paid_posts": stats.paid_posts,
            "last_posted_at": stats.last_posted_at,
        }));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "total_free_posts_used": ledger.total_free_posts_used,
        "total_paid_posts": ledger.total_paid_posts,
        "total_amount_paid": ledger.total_amount_paid,
        "category_posts": category_posts,
    })))
}

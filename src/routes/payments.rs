use actix_web::{get, post, web, HttpResponse};
use bson::{doc, oid::ObjectId, Document};
use chrono::Utc;
use futures::StreamExt;
use mongodb::options::FindOptions;

use crate::{
    catalog,
    db::AppState,
    errors::ApiError,
    middleware::auth::AuthUser,
    models::{
        payment::{CreateIntentDto, Payment, PaymentOut, PaymentStatus, VerifyPaymentDto},
        user_post::{self, UserPost},
    },
};

pub fn payments_collection(state: &AppState) -> mongodb::Collection<Payment> {
    state.db.collection::<Payment>("payments")
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(create_intent)
        .service(verify_payment)
        .service(payment_history)
        .service(posting_cost);
}

async fn caller_ledger(state: &AppState, user: &AuthUser) -> Result<(ObjectId, UserPost), ApiError> {
    let user_oid = ObjectId::parse_str(&user.user_id)
        .map_err(|_| ApiError::Unauthorized("Invalid token subject".into()))?;

    let col = state.db.collection::<UserPost>("user_posts");
    let ledger = user_post::find_or_create(&col, user_oid, Utc::now())
        .await
        .map_err(|e| {
            log::error!("Mongo error (caller_ledger): {:?}", e);
            ApiError::Internal
        })?;

    Ok((user_oid, ledger))
}

/// Opens a pending payment for a paid listing. Users still inside their free
/// allowance (and zero-price categories) short-circuit without a payment row.
/// The gateway call itself happens client-side against the mock order data.
#[post("/create-intent")]
async fn create_intent(
    user: AuthUser,
    state: web::Data<AppState>,
    body: web::Json<CreateIntentDto>,
) -> Result<HttpResponse, ApiError> {
    let dto = body.into_inner();

    let form = catalog::category_form(&dto.category_name)
        .ok_or_else(|| ApiError::BadRequest("Unknown category".into()))?;

    let (user_oid, ledger) = caller_ledger(&state, &user).await?;
    let cost = ledger.post_cost(form.name);

    if cost == 0 {
        return Ok(HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "requires_payment": false,
            "category": form.name,
            "cost": 0,
        })));
    }

    let payment = Payment::new(user_oid, form.name, cost, dto.payment_method, Utc::now());

    payments_collection(&state)
        .insert_one(&payment, None)
        .await
        .map_err(|e| {
            log::error!("Mongo insert_one error (create_intent): {:?}", e);
            ApiError::Internal
        })?;

    // mock order data in place of a real gateway handshake
    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "requires_payment": true,
        "payment": PaymentOut::from(payment.clone()),
        "order": {
            "order_id": format!("order_{}", payment.id.to_hex()),
            "amount": payment.amount,
            "currency": payment.currency,
        },
    })))
}

#[post("/verify")]
async fn verify_payment(
    user: AuthUser,
    state: web::Data<AppState>,
    body: web::Json<VerifyPaymentDto>,
) -> Result<HttpResponse, ApiError> {
    let dto = body.into_inner();

    let payment_oid = ObjectId::parse_str(&dto.payment_id)
        .map_err(|_| ApiError::BadRequest("Invalid payment id".into()))?;

    let col = payments_collection(&state);
    let mut payment = col
        .find_one(doc! { "_id": payment_oid }, None)
        .await
        .map_err(|e| {
            log::error!("Mongo find_one error (verify_payment): {:?}", e);
            ApiError::Internal
        })?
        .ok_or_else(|| ApiError::NotFound("Payment not found".into()))?;

    if payment.user.to_hex() != user.user_id {
        return Err(ApiError::Forbidden("Not your payment".into()));
    }

    if payment.status != PaymentStatus::Pending {
        return Err(ApiError::Conflict("Payment already processed".into()));
    }

    if dto.transaction_id.trim().is_empty() {
        payment.mark_failed(dto.gateway_response.unwrap_or_else(Document::new));
    } else {
        payment.mark_completed(
            dto.transaction_id,
            dto.gateway_response.unwrap_or_else(Document::new),
            Utc::now(),
        );
    }

    col.replace_one(doc! { "_id": payment_oid }, &payment, None)
        .await
        .map_err(|e| {
            log::error!("Mongo replace_one error (verify_payment): {:?}", e);
            ApiError::Internal
        })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "payment": PaymentOut::from(payment),
    })))
}

/// Quota totals, the per-category breakdown enriched with the posting config,
/// and the caller's payments newest first.
#[get("/history")]
async fn payment_history(
    user: AuthUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let (user_oid, ledger) = caller_ledger(&state, &user).await?;

    let mut categories: Vec<serde_json::Value> = Vec::new();
    for (key, stats) in &ledger.category_posts {
        let form = catalog::category_form_by_key(key);
        categories.push(serde_json::json!({
            "key": key,
            "name": form.map(|f| f.name),
            "total_posts": stats.total_posts,
            "free_posts_used": stats.free_posts_used,
            "paid_posts": stats.paid_posts,
            "free_posts_allowed": form.map(|f| f.free_posts),
            "price": form.map(|f| f.price),
            "can_post_free": form.map(|f| ledger.can_post_free(f.name)).unwrap_or(false),
            "last_posted_at": stats.last_posted_at,
        }));
    }

    let options = FindOptions::builder()
        .sort(doc! { "created_at": -1 })
        .build();

    let mut cursor = payments_collection(&state)
        .find(doc! { "user": user_oid }, options)
        .await
        .map_err(|e| {
            log::error!("Mongo find error (payment_history): {:?}", e);
            ApiError::Internal
        })?;

    let mut payments: Vec<PaymentOut> = Vec::new();
    while let Some(item) = cursor.next().await {
        let p = item.map_err(|e| {
            log::error!("Mongo cursor error (payment_history): {:?}", e);
            ApiError::Internal
        })?;
        payments.push(PaymentOut::from(p));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "total_free_posts_used": ledger.total_free_posts_used,
        "total_paid_posts": ledger.total_paid_posts,
        "total_amount_paid": ledger.total_amount_paid,
        "categories": categories,
        "payments": payments,
    })))
}

#[get("/cost/{categoryName}")]
async fn posting_cost(
    user: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let name = path.into_inner();

    let form = catalog::category_form(&name)
        .ok_or_else(|| ApiError::NotFound("Unknown category".into()))?;

    let (_, ledger) = caller_ledger(&state, &user).await?;

    let used = ledger
        .category_posts
        .get(form.key)
        .map(|s| s.free_posts_used)
        .unwrap_or(0);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "category": form.name,
        "base_price": form.price,
        "free_posts_allowed": form.free_posts,
        "free_posts_used": used,
        "cost": ledger.post_cost(form.name),
        "currency": "INR",
    })))
}

use actix_web::{delete, get, post, put, web, HttpResponse};
use bson::{doc, oid::ObjectId};
use chrono::{Duration, Utc};
use futures::StreamExt;
use mongodb::options::FindOptions;
use validator::Validate;

use crate::{
    catalog,
    config::AppConfig,
    db::AppState,
    errors::ApiError,
    middleware::auth::AuthUser,
    models::{
        category::Category,
        payment::{Payment, PaymentStatus},
        product::{
            average_rating, CreateProductDto, CreateReviewDto, Product, ProductOut, ProductStatus,
            Review, UpdateProductDto, UNITS,
        },
        shop::Shop,
        subcategory::Subcategory,
        user::User,
        user_post::{self, UserPost},
    },
    routes::posting,
};

pub fn products_collection(state: &AppState) -> mongodb::Collection<Product> {
    state.db.collection::<Product>("products")
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(create_product)
        .service(get_all_products)
        .service(admin_all_products)
        .service(get_user_products)
        .service(create_review)
        .service(get_product)
        .service(update_product)
        .service(mark_sold)
        .service(delete_product);
}

/// Owner check used by update/delete: the shop owner, the posting user, or an
/// Admin.
fn is_owner(product: &Product, user: &AuthUser, shop: Option<&Shop>) -> bool {
    if user.role == "Admin" {
        return true;
    }

    if let Some(owner_id) = &product.user_id {
        if owner_id.to_hex() == user.user_id {
            return true;
        }
    }

    match (&product.shop_id, shop) {
        (Some(shop_id), Some(shop)) => shop.id.to_hex() == *shop_id && shop.owner_id == user.user_id,
        _ => false,
    }
}

async fn load_product(
    state: &AppState,
    id: &str,
) -> Result<(ObjectId, Product), ApiError> {
    let oid = ObjectId::parse_str(id)
        .map_err(|_| ApiError::BadRequest("Invalid product id".into()))?;

    let product = products_collection(state)
        .find_one(doc! { "_id": oid }, None)
        .await
        .map_err(|e| {
            log::error!("Mongo find_one error (load_product): {:?}", e);
            ApiError::Internal
        })?
        .ok_or_else(|| ApiError::NotFound("Product not found".into()))?;

    Ok((oid, product))
}

async fn caller_shop(state: &AppState, user: &AuthUser) -> Result<Option<Shop>, ApiError> {
    state
        .db
        .collection::<Shop>("shops")
        .find_one(doc! { "owner_id": &user.user_id }, None)
        .await
        .map_err(|e| {
            log::error!("Mongo find_one error (caller_shop): {:?}", e);
            ApiError::Internal
        })
}

#[post("")]
async fn create_product(
    user: AuthUser,
    cfg: web::Data<AppConfig>,
    state: web::Data<AppState>,
    body: web::Json<CreateProductDto>,
) -> Result<HttpResponse, ApiError> {
    let dto = body.into_inner();
    dto.validate()
        .map_err(|e: validator::ValidationErrors| ApiError::BadRequest(e.to_string()))?;

    if !UNITS.contains(&dto.unit.as_str()) {
        return Err(ApiError::BadRequest(format!(
            "unit must be one of {}",
            UNITS.join("|")
        )));
    }

    let category_oid = ObjectId::parse_str(&dto.category)
        .map_err(|_| ApiError::BadRequest("Invalid category id".into()))?;
    let subcategory_oid = ObjectId::parse_str(&dto.subcategory)
        .map_err(|_| ApiError::BadRequest("Invalid subcategory id".into()))?;

    let category = state
        .db
        .collection::<Category>("categories")
        .find_one(doc! { "_id": category_oid }, None)
        .await
        .map_err(|e| {
            log::error!("Mongo find_one error (create_product category): {:?}", e);
            ApiError::Internal
        })?
        .ok_or_else(|| ApiError::BadRequest("Category not found".into()))?;

    let subcategory = state
        .db
        .collection::<Subcategory>("subcategories")
        .find_one(doc! { "_id": subcategory_oid, "category": category_oid }, None)
        .await
        .map_err(|e| {
            log::error!("Mongo find_one error (create_product subcategory): {:?}", e);
            ApiError::Internal
        })?;

    if subcategory.is_none() {
        return Err(ApiError::BadRequest(
            "Subcategory not found in this category".into(),
        ));
    }

    let caller_oid = ObjectId::parse_str(&user.user_id)
        .map_err(|_| ApiError::Unauthorized("Invalid token subject".into()))?;

    if dto.shop_id.is_none() && !user.phone_verified {
        return Err(ApiError::Forbidden(
            "Phone verification required to post".into(),
        ));
    }

    // seller listing under a shop, or a regular user posting an ad
    let (shop_id, owner_user_id) = match &dto.shop_id {
        Some(shop_id) => {
            let shop_oid = ObjectId::parse_str(shop_id)
                .map_err(|_| ApiError::BadRequest("Invalid shop id".into()))?;
            let shop = state
                .db
                .collection::<Shop>("shops")
                .find_one(doc! { "_id": shop_oid }, None)
                .await
                .map_err(|e| {
                    log::error!("Mongo find_one error (create_product shop): {:?}", e);
                    ApiError::Internal
                })?
                .ok_or_else(|| ApiError::BadRequest("Shop not found".into()))?;

            if shop.owner_id != user.user_id {
                return Err(ApiError::Forbidden("Not your shop".into()));
            }

            (Some(shop_id.clone()), None)
        }
        None => (None, Some(caller_oid)),
    };

    // quota only applies to user listings; shops post outside the free-post
    // allowance
    let mut is_paid = false;
    let mut backing_payment: Option<ObjectId> = None;
    if owner_user_id.is_some() {
        let posts_col = state.db.collection::<UserPost>("user_posts");
        let mut ledger = user_post::find_or_create(&posts_col, caller_oid, Utc::now())
            .await
            .map_err(|e| {
                log::error!("Mongo error (create_product ledger): {:?}", e);
                ApiError::Internal
            })?;

        match &dto.payment_id {
            Some(payment_id) => {
                let payment_oid = ObjectId::parse_str(payment_id)
                    .map_err(|_| ApiError::BadRequest("Invalid payment id".into()))?;

                let payment = state
                    .db
                    .collection::<Payment>("payments")
                    .find_one(doc! { "_id": payment_oid }, None)
                    .await
                    .map_err(|e| {
                        log::error!("Mongo find_one error (create_product payment): {:?}", e);
                        ApiError::Internal
                    })?
                    .ok_or_else(|| ApiError::BadRequest("Payment not found".into()))?;

                if payment.user != caller_oid {
                    return Err(ApiError::Forbidden("Not your payment".into()));
                }
                if payment.status != PaymentStatus::Completed {
                    return Err(ApiError::BadRequest("Payment not completed".into()));
                }

                is_paid = true;
                backing_payment = Some(payment_oid);
            }
            None => {
                // deleted listings free their slot, so count live posts
                // instead of trusting the ledger
                if let Some(form) = catalog::category_form(&category.name) {
                    let used =
                        posting::live_free_post_count(&state, caller_oid, category_oid).await?;
                    if used >= form.free_posts && form.price > 0 {
                        return Err(ApiError::BadRequest(
                            "Free-post allowance exhausted, payment required".into(),
                        ));
                    }
                }
            }
        }

        if ledger.record_post(&category.name, is_paid, Utc::now()) {
            posts_col
                .replace_one(doc! { "_id": ledger.id }, &ledger, None)
                .await
                .map_err(|e| {
                    log::error!("Mongo replace_one error (create_product ledger): {:?}", e);
                    ApiError::Internal
                })?;
        }
    }

    let now = Utc::now();
    let product = Product {
        id: ObjectId::new(),
        name: dto.name.trim().to_string(),
        description: dto.description,
        category: category_oid,
        subcategory: subcategory_oid,
        tags: dto.tags,
        original_price: dto.original_price,
        discount_price: dto.discount_price,
        stock: dto.stock,
        unit: dto.unit,
        unit_count: dto.unit_count,
        max_purchase_quantity: dto.max_purchase_quantity,
        images: dto.images,
        reviews: Vec::new(),
        ratings: None,
        shop_id,
        user_id: owner_user_id,
        status: ProductStatus::Active,
        is_paid,
        sold_out: 0,
        created_at: now,
        expires_at: now + Duration::days(cfg.product_expiry_days),
    };

    products_collection(&state)
        .insert_one(&product, None)
        .await
        .map_err(|e| {
            log::error!("Mongo insert_one error (create_product): {:?}", e);
            ApiError::Internal
        })?;

    if let Some(payment_oid) = backing_payment {
        state
            .db
            .collection::<Payment>("payments")
            .update_one(
                doc! { "_id": payment_oid },
                doc! { "$set": { "post_id": product.id } },
                None,
            )
            .await
            .map_err(|e| {
                log::error!("Mongo update_one error (create_product payment): {:?}", e);
                ApiError::Internal
            })?;
    }

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "product": ProductOut::from(product),
    })))
}

#[get("")]
async fn get_all_products(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let options = FindOptions::builder()
        .sort(doc! { "created_at": -1 })
        .build();

    let mut cursor = products_collection(&state)
        .find(doc! { "status": "active" }, options)
        .await
        .map_err(|e| {
            log::error!("Mongo find error (get_all_products): {:?}", e);
            ApiError::Internal
        })?;

    let mut out: Vec<ProductOut> = Vec::new();
    while let Some(item) = cursor.next().await {
        let p = item.map_err(|e| {
            log::error!("Mongo cursor error (get_all_products): {:?}", e);
            ApiError::Internal
        })?;
        out.push(ProductOut::from(p));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "products": out,
    })))
}

#[get("/admin/all")]
async fn admin_all_products(
    user: AuthUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    user.require_role("Admin")?;

    let options = FindOptions::builder()
        .sort(doc! { "created_at": -1 })
        .build();

    let mut cursor = products_collection(&state)
        .find(doc! {}, options)
        .await
        .map_err(|e| {
            log::error!("Mongo find error (admin_all_products): {:?}", e);
            ApiError::Internal
        })?;

    let mut out: Vec<ProductOut> = Vec::new();
    while let Some(item) = cursor.next().await {
        let p = item.map_err(|e| {
            log::error!("Mongo cursor error (admin_all_products): {:?}", e);
            ApiError::Internal
        })?;
        out.push(ProductOut::from(p));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "products": out,
    })))
}

#[get("/user/{userId}")]
async fn get_user_products(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let user_oid = ObjectId::parse_str(path.into_inner())
        .map_err(|_| ApiError::BadRequest("Invalid user id".into()))?;

    let options = FindOptions::builder()
        .sort(doc! { "created_at": -1 })
        .build();

    let mut cursor = products_collection(&state)
        .find(doc! { "user_id": user_oid, "status": { "$ne": "deleted" } }, options)
        .await
        .map_err(|e| {
            log::error!("Mongo find error (get_user_products): {:?}", e);
            ApiError::Internal
        })?;

    let mut out: Vec<ProductOut> = Vec::new();
    while let Some(item) = cursor.next().await {
        let p = item.map_err(|e| {
            log::error!("Mongo cursor error (get_user_products): {:?}", e);
            ApiError::Internal
        })?;
        out.push(ProductOut::from(p));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "products": out,
    })))
}

#[get("/{id}")]
async fn get_product(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let (_, product) = load_product(&state, &path.into_inner()).await?;

    let category_name = state
        .db
        .collection::<Category>("categories")
        .find_one(doc! { "_id": product.category }, None)
        .await
        .map_err(|e| {
            log::error!("Mongo find_one error (get_product category): {:?}", e);
            ApiError::Internal
        })?
        .map(|c| c.name);

    let subcategory_name = state
        .db
        .collection::<Subcategory>("subcategories")
        .find_one(doc! { "_id": product.subcategory }, None)
        .await
        .map_err(|e| {
            log::error!("Mongo find_one error (get_product subcategory): {:?}", e);
            ApiError::Internal
        })?
        .map(|s| s.name);

    // seller summary: the shop when present, otherwise the posting user
    let seller = if let Some(shop_id) = &product.shop_id {
        let shop_oid = ObjectId::parse_str(shop_id).ok();
        match shop_oid {
            Some(oid) => state
                .db
                .collection::<Shop>("shops")
                .find_one(doc! { "_id": oid }, None)
                .await
                .map_err(|e| {
                    log::error!("Mongo find_one error (get_product shop): {:?}", e);
                    ApiError::Internal
                })?
                .map(|s| {
                    serde_json::json!({
                        "id": s.id.to_hex(),
                        "name": s.name,
                        "email": s.email,
                        "avatar": s.avatar,
                        "phone_number": s.phone_number,
                        "address": s.address,
                    })
                }),
            None => None,
        }
    } else if let Some(user_oid) = product.user_id {
        state
            .db
            .collection::<User>("users")
            .find_one(doc! { "_id": user_oid }, None)
            .await
            .map_err(|e| {
                log::error!("Mongo find_one error (get_product user): {:?}", e);
                ApiError::Internal
            })?
            .map(|u| {
                let phone = if u.hide_phone_number {
                    None
                } else {
                    Some(u.phone_number.clone())
                };
                serde_json::json!({
                    "id": u.id.to_hex(),
                    "name": u.name,
                    "email": u.email,
                    "avatar": u.avatar,
                    "phone_number": phone,
                })
            })
    } else {
        None
    };

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "product": ProductOut::from(product),
        "category_name": category_name,
        "subcategory_name": subcategory_name,
        "seller": seller,
    })))
}

#[put("/{id}")]
async fn update_product(
    user: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UpdateProductDto>,
) -> Result<HttpResponse, ApiError> {
    let (oid, product) = load_product(&state, &path.into_inner()).await?;
    let shop = caller_shop(&state, &user).await?;

    if !is_owner(&product, &user, shop.as_ref()) {
        return Err(ApiError::Forbidden(
            "You don't have permission to update this product".into(),
        ));
    }

    let dto = body.into_inner();

    if let Some(unit) = &dto.unit {
        if !UNITS.contains(&unit.as_str()) {
            return Err(ApiError::BadRequest(format!(
                "unit must be one of {}",
                UNITS.join("|")
            )));
        }
    }

    let mut set = doc! {};
    if let Some(name) = dto.name {
        set.insert("name", name.trim());
    }
    if let Some(description) = dto.description {
        set.insert("description", description);
    }
    if let Some(tags) = dto.tags {
        set.insert("tags", tags);
    }
    if let Some(price) = dto.original_price {
        set.insert("original_price", price);
    }
    if let Some(price) = dto.discount_price {
        set.insert("discount_price", price);
    }
    if let Some(stock) = dto.stock {
        set.insert("stock", stock);
    }
    if let Some(unit) = dto.unit {
        set.insert("unit", unit);
    }
    if let Some(unit_count) = dto.unit_count {
        set.insert("unit_count", unit_count);
    }
    if let Some(max) = dto.max_purchase_quantity {
        set.insert("max_purchase_quantity", max);
    }
    if let Some(images) = dto.images {
        if images.is_empty() {
            return Err(ApiError::BadRequest("at least one image required".into()));
        }
        set.insert("images", images);
    }

    if set.is_empty() {
        return Err(ApiError::BadRequest("Nothing to update".into()));
    }

    products_collection(&state)
        .update_one(doc! { "_id": oid }, doc! { "$set": set }, None)
        .await
        .map_err(|e| {
            log::error!("Mongo update_one error (update_product): {:?}", e);
            ApiError::Internal
        })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}

#[put("/{id}/sold")]
async fn mark_sold(
    user: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let (oid, product) = load_product(&state, &path.into_inner()).await?;
    let shop = caller_shop(&state, &user).await?;

    if !is_owner(&product, &user, shop.as_ref()) {
        return Err(ApiError::Forbidden(
            "You don't have permission to update this product".into(),
        ));
    }

    products_collection(&state)
        .update_one(
            doc! { "_id": oid },
            doc! { "$set": { "status": "sold" } },
            None,
        )
        .await
        .map_err(|e| {
            log::error!("Mongo update_one error (mark_sold): {:?}", e);
            ApiError::Internal
        })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "status": "sold",
    })))
}

#[delete("/{id}")]
async fn delete_product(
    user: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let (oid, product) = load_product(&state, &path.into_inner()).await?;
    let shop = caller_shop(&state, &user).await?;

    if !is_owner(&product, &user, shop.as_ref()) {
        return Err(ApiError::Forbidden(
            "You don't have permission to delete this product".into(),
        ));
    }

    // soft delete so the free-post accounting can still see the listing
    products_collection(&state)
        .update_one(
            doc! { "_id": oid },
            doc! { "$set": { "status": "deleted" } },
            None,
        )
        .await
        .map_err(|e| {
            log::error!("Mongo update_one error (delete_product): {:?}", e);
            ApiError::Internal
        })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Product deleted successfully",
    })))
}

#[put("/review")]
async fn create_review(
    user: AuthUser,
    state: web::Data<AppState>,
    body: web::Json<CreateReviewDto>,
) -> Result<HttpResponse, ApiError> {
    let dto = body.into_inner();
    dto.validate()
        .map_err(|e: validator::ValidationErrors| ApiError::BadRequest(e.to_string()))?;

    let (oid, mut product) = load_product(&state, &dto.product_id).await?;

    // one review per user; a second submit edits the existing one
    match product
        .reviews
        .iter_mut()
        .find(|r| r.user_id == user.user_id)
    {
        Some(review) => {
            review.rating = dto.rating;
            review.comment = dto.comment;
            review.user_name = dto.user_name;
            review.avatar = dto.avatar;
        }
        None => product.reviews.push(Review {
            user_id: user.user_id.clone(),
            user_name: dto.user_name,
            avatar: dto.avatar,
            rating: dto.rating,
            comment: dto.comment,
            created_at: Utc::now(),
        }),
    }

    let ratings = average_rating(&product.reviews);
    let reviews = bson::to_bson(&product.reviews).map_err(|_| ApiError::Internal)?;

    products_collection(&state)
        .update_one(
            doc! { "_id": oid },
            doc! { "$set": { "reviews": reviews, "ratings": ratings } },
            None,
        )
        .await
        .map_err(|e| {
            log::error!("Mongo update_one error (create_review): {:?}", e);
            ApiError::Internal
        })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Reviewed successfully",
        "ratings": ratings,
    })))
}

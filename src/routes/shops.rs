use actix_web::{get, post, put, web, HttpResponse};
use bson::{doc, oid::ObjectId};
use chrono::Utc;
use futures::StreamExt;
use validator::Validate;

use crate::{
    db::AppState,
    errors::ApiError,
    middleware::auth::AuthUser,
    models::{
        product::{Product, ProductOut},
        shop::{CreateShopDto, PublicShop, Shop, UpdateShopDto},
    },
};

pub fn shops_collection(state: &AppState) -> mongodb::Collection<Shop> {
    state.db.collection::<Shop>("shops")
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(create_shop)
        .service(get_shop)
        .service(update_shop)
        .service(shop_products);
}

#[post("")]
async fn create_shop(
    user: AuthUser,
    state: web::Data<AppState>,
    body: web::Json<CreateShopDto>,
) -> Result<HttpResponse, ApiError> {
    let dto = body.into_inner();
    dto.validate()
        .map_err(|e: validator::ValidationErrors| ApiError::BadRequest(e.to_string()))?;

    let col = shops_collection(&state);

    // una tienda por usuario
    let existing = col
        .find_one(doc! { "owner_id": &user.user_id }, None)
        .await
        .map_err(|e| {
            log::error!("Mongo find_one error (create_shop): {:?}", e);
            ApiError::Internal
        })?;

    if existing.is_some() {
        return Err(ApiError::Conflict("User already owns a shop".into()));
    }

    let shop = Shop {
        id: ObjectId::new(),
        name: dto.name.trim().to_string(),
        email: dto.email.trim().to_lowercase(),
        phone_number: dto.phone_number,
        avatar: dto.avatar,
        address: dto.address,
        owner_id: user.user_id.clone(),
        created_at: Utc::now(),
    };

    col.insert_one(&shop, None).await.map_err(|e| {
        log::error!("Mongo insert_one error (create_shop): {:?}", e);
        ApiError::Internal
    })?;

    Ok(HttpResponse::Created().json(PublicShop::from(shop)))
}

#[get("/{id}")]
async fn get_shop(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = ObjectId::parse_str(path.into_inner())
        .map_err(|_| ApiError::BadRequest("Invalid shop id".into()))?;

    let col = shops_collection(&state);
    let shop = col
        .find_one(doc! { "_id": id }, None)
        .await
        .map_err(|e| {
            log::error!("Mongo find_one error (get_shop): {:?}", e);
            ApiError::Internal
        })?
        .ok_or_else(|| ApiError::NotFound("Shop not found".into()))?;

    Ok(HttpResponse::Ok().json(PublicShop::from(shop)))
}

#[put("/{id}")]
async fn update_shop(
    user: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UpdateShopDto>,
) -> Result<HttpResponse, ApiError> {
    let id = ObjectId::parse_str(path.into_inner())
        .map_err(|_| ApiError::BadRequest("Invalid shop id".into()))?;

    let dto = body.into_inner();
    let mut set = doc! {};
    if let Some(name) = dto.name {
        set.insert("name", name.trim());
    }
    if let Some(phone) = dto.phone_number {
        set.insert("phone_number", phone);
    }
    if let Some(avatar) = dto.avatar {
        set.insert("avatar", avatar);
    }
    if let Some(address) = dto.address {
        set.insert("address", address);
    }

    if set.is_empty() {
        return Err(ApiError::BadRequest("Nothing to update".into()));
    }

    let col = shops_collection(&state);
    let res = col
        .update_one(
            doc! { "_id": id, "owner_id": &user.user_id },
            doc! { "$set": set },
            None,
        )
        .await
        .map_err(|e| {
            log::error!("Mongo update_one error (update_shop): {:?}", e);
            ApiError::Internal
        })?;

    if res.matched_count == 0 {
        return Err(ApiError::NotFound("Shop not found".into()));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}

#[get("/{id}/products")]
async fn shop_products(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    // stored as hex string on the product
    ObjectId::parse_str(&id).map_err(|_| ApiError::BadRequest("Invalid shop id".into()))?;

    let col = state.db.collection::<Product>("products");
    let mut cursor = col
        .find(doc! { "shop_id": &id }, None)
        .await
        .map_err(|e| {
            log::error!("Mongo find error (shop_products): {:?}", e);
            ApiError::Internal
        })?;

    let mut out: Vec<ProductOut> = Vec::new();
    while let Some(item) = cursor.next().await {
        let p = item.map_err(|e| {
            log::error!("Mongo cursor error (shop_products): {:?}", e);
            ApiError::Internal
        })?;
        out.push(ProductOut::from(p));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "products": out,
    })))
}

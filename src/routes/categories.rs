use actix_web::{delete, get, post, put, web, HttpResponse};
use bson::{doc, oid::ObjectId};
use chrono::Utc;
use futures::StreamExt;
use mongodb::options::{FindOneOptions, FindOptions};
use validator::Validate;

use crate::{
    db::AppState,
    errors::ApiError,
    middleware::auth::AuthUser,
    models::category::{Category, CategoryOut, CreateCategoryDto, UpdateCategoryDto},
};

pub fn categories_collection(state: &AppState) -> mongodb::Collection<Category> {
    state.db.collection::<Category>("categories")
}

async fn next_category_id(col: &mongodb::Collection<Category>) -> Result<i64, ApiError> {
    let options = FindOneOptions::builder()
        .sort(doc! { "category_id": -1 })
        .build();

    let last = col.find_one(doc! {}, options).await.map_err(|e| {
        log::error!("Mongo find_one error (next_category_id): {:?}", e);
        ApiError::Internal
    })?;

    Ok(last.map(|c| c.category_id).unwrap_or(0) + 1)
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(create_category)
        .service(list_categories)
        .service(get_category)
        .service(update_category)
        .service(delete_category);
}

#[post("")]
async fn create_category(
    user: AuthUser,
    state: web::Data<AppState>,
    body: web::Json<CreateCategoryDto>,
) -> Result<HttpResponse, ApiError> {
    user.require_role("Admin")?;

    let dto = body.into_inner();
    dto.validate()
        .map_err(|e: validator::ValidationErrors| ApiError::BadRequest(e.to_string()))?;

    let col = categories_collection(&state);

    let existing = col
        .find_one(doc! { "name": dto.name.trim() }, None)
        .await
        .map_err(|e| {
            log::error!("Mongo find_one error (create_category): {:?}", e);
            ApiError::Internal
        })?;

    if existing.is_some() {
        return Err(ApiError::Conflict("Category already exists".into()));
    }

    let now = Utc::now();
    let category = Category {
        id: ObjectId::new(),
        category_id: next_category_id(&col).await?,
        name: dto.name.trim().to_string(),
        image: dto.image,
        description: dto.description,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    col.insert_one(&category, None).await.map_err(|e| {
        log::error!("Mongo insert_one error (create_category): {:?}", e);
        ApiError::Internal
    })?;

    Ok(HttpResponse::Created().json(CategoryOut::from(category)))
}

#[get("")]
async fn list_categories(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let options = FindOptions::builder()
        .sort(doc! { "category_id": 1 })
        .build();

    let mut cursor = categories_collection(&state)
        .find(doc! {}, options)
        .await
        .map_err(|e| {
            log::error!("Mongo find error (list_categories): {:?}", e);
            ApiError::Internal
        })?;

    let mut out: Vec<CategoryOut> = Vec::new();
    while let Some(item) = cursor.next().await {
        let c = item.map_err(|e| {
            log::error!("Mongo cursor error (list_categories): {:?}", e);
            ApiError::Internal
        })?;
        out.push(CategoryOut::from(c));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "categories": out,
    })))
}

#[get("/{id}")]
async fn get_category(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = ObjectId::parse_str(path.into_inner())
        .map_err(|_| ApiError::BadRequest("Invalid category id".into()))?;

    let category = categories_collection(&state)
        .find_one(doc! { "_id": id }, None)
        .await
        .map_err(|e| {
            log::error!("Mongo find_one error (get_category): {:?}", e);
            ApiError::Internal
        })?
        .ok_or_else(|| ApiError::NotFound("Category not found".into()))?;

    Ok(HttpResponse::Ok().json(CategoryOut::from(category)))
}

#[put("/{id}")]
async fn update_category(
    user: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UpdateCategoryDto>,
) -> Result<HttpResponse, ApiError> {
    user.require_role("Admin")?;

    let id = ObjectId::parse_str(path.into_inner())
        .map_err(|_| ApiError::BadRequest("Invalid category id".into()))?;

    let dto = body.into_inner();
    let mut set = doc! { "updated_at": Utc::now() };
    if let Some(name) = dto.name {
        set.insert("name", name.trim());
    }
    if let Some(image) = dto.image {
        set.insert("image", image);
    }
    if let Some(description) = dto.description {
        set.insert("description", description);
    }
    if let Some(is_active) = dto.is_active {
        set.insert("is_active", is_active);
    }

    let res = categories_collection(&state)
        .update_one(doc! { "_id": id }, doc! { "$set": set }, None)
        .await
        .map_err(|e| {
            log::error!("Mongo update_one error (update_category): {:?}", e);
            ApiError::Internal
        })?;

    if res.matched_count == 0 {
        return Err(ApiError::NotFound("Category not found".into()));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}

#[delete("/{id}")]
async fn delete_category(
    user: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    user.require_role("Admin")?;

    let id = ObjectId::parse_str(path.into_inner())
        .map_err(|_| ApiError::BadRequest("Invalid category id".into()))?;

    let res = categories_collection(&state)
        .delete_one(doc! { "_id": id }, None)
        .await
        .map_err(|e| {
            log::error!("Mongo delete_one error (delete_category): {:?}", e);
            ApiError::Internal
        })?;

    if res.deleted_count == 0 {
        return Err(ApiError::NotFound("Category not found".into()));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}

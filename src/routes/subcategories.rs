use actix_web::{delete, get, post, put, web, HttpResponse};
use bson::{doc, oid::ObjectId};
use chrono::Utc;
use futures::StreamExt;
use mongodb::options::{FindOneOptions, FindOptions};
use serde::Deserialize;
use validator::Validate;

use crate::{
    db::AppState,
    errors::ApiError,
    middleware::auth::AuthUser,
    models::{
        category::Category,
        subcategory::{CreateSubcategoryDto, Subcategory, SubcategoryOut, UpdateSubcategoryDto},
    },
};

pub fn subcategories_collection(state: &AppState) -> mongodb::Collection<Subcategory> {
    state.db.collection::<Subcategory>("subcategories")
}

async fn next_subcategory_id(col: &mongodb::Collection<Subcategory>) -> Result<i64, ApiError> {
    let options = FindOneOptions::builder()
        .sort(doc! { "subcategory_id": -1 })
        .build();

    let last = col.find_one(doc! {}, options).await.map_err(|e| {
        log::error!("Mongo find_one error (next_subcategory_id): {:?}", e);
        ApiError::Internal
    })?;

    Ok(last.map(|s| s.subcategory_id).unwrap_or(0) + 1)
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    category: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(create_subcategory)
        .service(list_subcategories)
        .service(get_subcategory)
        .service(update_subcategory)
        .service(delete_subcategory);
}

#[post("")]
async fn create_subcategory(
    user: AuthUser,
    state: web::Data<AppState>,
    body: web::Json<CreateSubcategoryDto>,
) -> Result<HttpResponse, ApiError> {
    user.require_role("Admin")?;

    let dto = body.into_inner();
    dto.validate()
        .map_err(|e: validator::ValidationErrors| ApiError::BadRequest(e.to_string()))?;

    let category_oid = ObjectId::parse_str(&dto.category)
        .map_err(|_| ApiError::BadRequest("Invalid category id".into()))?;

    let parent = state
        .db
        .collection::<Category>("categories")
        .find_one(doc! { "_id": category_oid }, None)
        .await
        .map_err(|e| {
            log::error!("Mongo find_one error (create_subcategory): {:?}", e);
            ApiError::Internal
        })?;

    if parent.is_none() {
        return Err(ApiError::BadRequest("Parent category not found".into()));
    }

    let col = subcategories_collection(&state);
    let now = Utc::now();
    let subcategory = Subcategory {
        id: ObjectId::new(),
        subcategory_id: next_subcategory_id(&col).await?,
        name: dto.name.trim().to_string(),
        category: category_oid,
        image: dto.image,
        description: dto.description,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    col.insert_one(&subcategory, None).await.map_err(|e| {
        log::error!("Mongo insert_one error (create_subcategory): {:?}", e);
        ApiError::Internal
    })?;

    Ok(HttpResponse::Created().json(SubcategoryOut::from(subcategory)))
}

#[get("")]
async fn list_subcategories(
    state: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, ApiError> {
    let filter = match &query.category {
        Some(category) => {
            let oid = ObjectId::parse_str(category)
                .map_err(|_| ApiError::BadRequest("Invalid category id".into()))?;
            doc! { "category": oid }
        }
        None => doc! {},
    };

    let options = FindOptions::builder()
        .sort(doc! { "subcategory_id": 1 })
        .build();

    let mut cursor = subcategories_collection(&state)
        .find(filter, options)
        .await
        .map_err(|e| {
            log::error!("Mongo find error (list_subcategories): {:?}", e);
            ApiError::Internal
        })?;

    let mut out: Vec<SubcategoryOut> = Vec::new();
    while let Some(item) = cursor.next().await {
        let s = item.map_err(|e| {
            log::error!("Mongo cursor error (list_subcategories): {:?}", e);
            ApiError::Internal
        })?;
        out.push(SubcategoryOut::from(s));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "subcategories": out,
    })))
}

#[get("/{id}")]
async fn get_subcategory(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = ObjectId::parse_str(path.into_inner())
        .map_err(|_| ApiError::BadRequest("Invalid subcategory id".into()))?;

    let subcategory = subcategories_collection(&state)
        .find_one(doc! { "_id": id }, None)
        .await
        .map_err(|e| {
            log::error!("Mongo find_one error (get_subcategory): {:?}", e);
            ApiError::Internal
        })?
        .ok_or_else(|| ApiError::NotFound("Subcategory not found".into()))?;

    Ok(HttpResponse::Ok().json(SubcategoryOut::from(subcategory)))
}

#[put("/{id}")]
async fn update_subcategory(
    user: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UpdateSubcategoryDto>,
) -> Result<HttpResponse, ApiError> {
    user.require_role("Admin")?;

    let id = ObjectId::parse_str(path.into_inner())
        .map_err(|_| ApiError::BadRequest("Invalid subcategory id".into()))?;

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

    let res = subcategories_collection(&state)
        .update_one(doc! { "_id": id }, doc! { "$set": set }, None)
        .await
        .map_err(|e| {
            log::error!("Mongo update_one error (update_subcategory): {:?}", e);
            ApiError::Internal
        })?;

    if res.matched_count == 0 {
        return Err(ApiError::NotFound("Subcategory not found".into()));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}

#[delete("/{id}")]
async fn delete_subcategory(
    user: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    user.require_role("Admin")?;

    let id = ObjectId::parse_str(path.into_inner())
        .map_err(|_| ApiError::BadRequest("Invalid subcategory id".into()))?;

    let res = subcategories_collection(&state)
        .delete_one(doc! { "_id": id }, None)
        .await
        .map_err(|e| {
            log::error!("Mongo delete_one error (delete_subcategory): {:?}", e);
            ApiError::Internal
        })?;

    if res.deleted_count == 0 {
        return Err(ApiError::NotFound("Subcategory not found".into()));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}

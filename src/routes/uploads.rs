use actix_multipart::Multipart;
use actix_web::{get, post, web, HttpResponse};
use bson::oid::ObjectId;
use futures::StreamExt;
use sanitize_filename::sanitize;
use std::{fs, io::Write, path::Path};

use crate::{errors::ApiError, middleware::auth::AuthUser};

const UPLOAD_DIR: &str = "uploads";
const MAX_IMAGE_BYTES: i64 = 5 * 1024 * 1024;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(upload_images).service(serve_image);
}

fn ensure_upload_dir() -> Result<(), ApiError> {
    if !Path::new(UPLOAD_DIR).exists() {
        fs::create_dir_all(UPLOAD_DIR).map_err(|_| ApiError::Internal)?;
    }
    Ok(())
}

/// Listing and avatar images. Accepts several files per request and answers
/// with the paths the client stores on the product or profile.
#[post("")]
pub async fn upload_images(
    _user: AuthUser,
    mut payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    ensure_upload_dir()?;

    let mut urls: Vec<String> = Vec::new();

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|_| ApiError::BadRequest("Invalid multipart".into()))?;

        let mime = field
            .content_type()
            .map(|m| m.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        if !mime.starts_with("image/") {
            return Err(ApiError::BadRequest("Only image uploads allowed".into()));
        }

        let filename = field
            .content_disposition()
            .get_filename()
            .map(sanitize)
            .unwrap_or_else(|| "image.bin".to_string());

        let stored_name = format!("{}_{}", ObjectId::new().to_hex(), filename);
        let filepath = format!("{}/{}", UPLOAD_DIR, stored_name);

        let mut f = fs::File::create(&filepath).map_err(|_| ApiError::Internal)?;
        let mut size: i64 = 0;

        while let Some(chunk) = field.next().await {
            let data = chunk.map_err(|_| ApiError::Internal)?;
            size += data.len() as i64;
            if size > MAX_IMAGE_BYTES {
                drop(f);
                let _ = fs::remove_file(&filepath);
                return Err(ApiError::BadRequest("Image larger than 5MB".into()));
            }
            f.write_all(&data).map_err(|_| ApiError::Internal)?;
        }

        urls.push(format!("/v2/upload/{}", stored_name));
    }

    if urls.is_empty() {
        return Err(ApiError::BadRequest("No file uploaded".into()));
    }

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "urls": urls,
    })))
}

#[get("/{filename}")]
pub async fn serve_image(path: web::Path<String>) -> Result<HttpResponse, ApiError> {
    // sanitize again on the way out so the path cannot escape uploads/
    let filename = sanitize(path.into_inner());
    let filepath = format!("{}/{}", UPLOAD_DIR, filename);

    let bytes = fs::read(&filepath).map_err(|_| ApiError::NotFound("Image not found".into()))?;

    let content_type = match filepath.rsplit('.').next() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    };

    Ok(HttpResponse::Ok()
        .insert_header(("Content-Type", content_type))
        .body(bytes))
}

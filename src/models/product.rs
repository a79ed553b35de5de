use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

pub const UNITS: &[&str] = &["kg", "pcs", "g", "ml", "ltr", "pack"];

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Active,
    Sold,
    Expired,
    Deleted,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Active => "active",
            ProductStatus::Sold => "sold",
            ProductStatus::Expired => "expired",
            ProductStatus::Deleted => "deleted",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Review {
    pub user_id: String,
    pub user_name: String,
    pub avatar: Option<String>,
    pub rating: f64,
    pub comment: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    pub name: String,
    pub description: String,
    pub category: ObjectId,
    pub subcategory: ObjectId,
    #[serde(default)]
    pub tags: Option<String>,

    #[serde(default)]
    pub original_price: Option<f64>,
    pub discount_price: f64,
    pub stock: i64,
    pub unit: String,
    pub unit_count: i64,
    #[serde(default)]
    pub max_purchase_quantity: Option<i64>,

    pub images: Vec<String>,
    #[serde(default)]
    pub reviews: Vec<Review>,
    #[serde(default)]
    pub ratings: Option<f64>,

    // Listing owner: sellers post under a shop, regular users under their id.
    #[serde(default)]
    pub shop_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<ObjectId>,

    pub status: ProductStatus,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default)]
    pub sold_out: i64,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductDto {
    #[validate(length(min = 2, message = "name too short"))]
    pub name: String,

    #[validate(length(min = 2, message = "description too short"))]
    pub description: String,

    pub category: String,
    pub subcategory: String,
    pub tags: Option<String>,

    pub original_price: Option<f64>,
    pub discount_price: f64,
    pub stock: i64,
    pub unit: String,
    pub unit_count: i64,
    pub max_purchase_quantity: Option<i64>,

    #[validate(length(min = 1, message = "at least one image required"))]
    pub images: Vec<String>,

    pub shop_id: Option<String>,
    // completed payment backing a paid listing
    pub payment_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductDto {
    pub name: Option<String>,
    pub description: Option<String>,
    pub tags: Option<String>,
    pub original_price: Option<f64>,
    pub discount_price: Option<f64>,
    pub stock: Option<i64>,
    pub unit: Option<String>,
    pub unit_count: Option<i64>,
    pub max_purchase_quantity: Option<i64>,
    pub images: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReviewDto {
    pub product_id: String,

    #[validate(range(min = 1.0, max = 5.0, message = "rating must be 1-5"))]
    pub rating: f64,

    #[validate(length(min = 1, message = "comment required"))]
    pub comment: String,

    pub user_name: String,
    pub avatar: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProductOut {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub subcategory: String,
    pub tags: Option<String>,
    pub original_price: Option<f64>,
    pub discount_price: f64,
    pub stock: i64,
    pub unit: String,
    pub unit_count: i64,
    pub max_purchase_quantity: Option<i64>,
    pub images: Vec<String>,
    pub reviews: Vec<Review>,
    pub ratings: Option<f64>,
    pub shop_id: Option<String>,
    pub user_id: Option<String>,
    pub status: ProductStatus,
    pub is_paid: bool,
    pub sold_out: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<Product> for ProductOut {
    fn from(p: Product) -> Self {
        Self {
            id: p.id.to_hex(),
            name: p.name,
            description: p.description,
            category: p.category.to_hex(),
            subcategory: p.subcategory.to_hex(),
            tags: p.tags,
            original_price: p.original_price,
            discount_price: p.discount_price,
            stock: p.stock,
            unit: p.unit,
            unit_count: p.unit_count,
            max_purchase_quantity: p.max_purchase_quantity,
            images: p.images,
            reviews: p.reviews,
            ratings: p.ratings,
            shop_id: p.shop_id,
            user_id: p.user_id.map(|id| id.to_hex()),
            status: p.status,
            is_paid: p.is_paid,
            sold_out: p.sold_out,
            created_at: p.created_at,
            expires_at: p.expires_at,
        }
    }
}

pub fn average_rating(reviews: &[Review]) -> Option<f64> {
    if reviews.is_empty() {
        return None;
    }
    let sum: f64 = reviews.iter().map(|r| r.rating).sum();
    Some(sum / reviews.len() as f64)
}

/// Only active listings expire; sold/deleted ones keep their status.
pub fn is_expired(status: ProductStatus, expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    status == ProductStatus::Active && expires_at < now
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn review(rating: f64) -> Review {
        Review {
            user_id: "u1".into(),
            user_name: "Ana".into(),
            avatar: None,
            rating,
            comment: "ok".into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn average_rating_over_reviews() {
        assert_eq!(average_rating(&[]), None);
        assert_eq!(average_rating(&[review(4.0), review(2.0)]), Some(3.0));
    }

    #[test]
    fn only_active_listings_expire() {
        let now = Utc::now();
        let past = now - Duration::days(1);
        let future = now + Duration::days(1);

        assert!(is_expired(ProductStatus::Active, past, now));
        assert!(!is_expired(ProductStatus::Active, future, now));
        assert!(!is_expired(ProductStatus::Sold, past, now));
        assert!(!is_expired(ProductStatus::Deleted, past, now));
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&ProductStatus::Active).unwrap();
        assert_eq!(json, "\"active\"");
        assert_eq!(ProductStatus::Sold.as_str(), "sold");
    }
}

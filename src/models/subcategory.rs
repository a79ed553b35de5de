use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Subcategory {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    pub subcategory_id: i64,
    pub name: String,
    pub category: ObjectId,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSubcategoryDto {
    #[validate(length(min = 2, message = "name too short"))]
    pub name: String,

    pub category: String, // parent category ObjectId hex
    pub image: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSubcategoryDto {
    pub name: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct SubcategoryOut {
    pub id: String,
    pub subcategory_id: i64,
    pub name: String,
    pub category: String,
    pub image: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Subcategory> for SubcategoryOut {
    fn from(s: Subcategory) -> Self {
        Self {
            id: s.id.to_hex(),
            subcategory_id: s.subcategory_id,
            name: s.name,
            category: s.category.to_hex(),
            image: s.image,
            description: s.description,
            is_active: s.is_active,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Shop {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub avatar: String,
    pub address: String,
    pub owner_id: String, // AuthUser.user_id (hex)

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateShopDto {
    #[validate(length(min = 2, message = "name too short"))]
    pub name: String,

    #[validate(email(message = "invalid email"))]
    pub email: String,

    #[validate(length(equal = 10, message = "phone number must be 10 digits"))]
    pub phone_number: String,

    #[validate(url(message = "avatar must be a URL"))]
    pub avatar: String,

    #[validate(length(min = 2, message = "address too short"))]
    pub address: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateShopDto {
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub avatar: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PublicShop {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub avatar: String,
    pub address: String,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
}

impl From<Shop> for PublicShop {
    fn from(s: Shop) -> Self {
        Self {
            id: s.id.to_hex(),
            name: s.name,
            email: s.email,
            phone_number: s.phone_number,
            avatar: s.avatar,
            address: s.address,
            owner_id: s.owner_id,
            created_at: s.created_at,
        }
    }
}

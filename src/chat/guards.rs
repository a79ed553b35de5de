use bson::{doc, oid::ObjectId};
use mongodb::Database;
use serde::Serialize;

use crate::{
    errors::ApiError,
    models::{conversation::Conversation, product::Product, product::ProductStatus},
};

pub const PRODUCT_INACTIVE_MESSAGE: &str =
    "This conversation is disabled because the listing is no longer active.";

pub const PRODUCT_SOLD_MESSAGE: &str =
    "This conversation is disabled because the seller marked the item as sold.";

pub const CONVERSATION_NOT_FOUND_MESSAGE: &str = "Conversation not found.";

#[derive(Debug, Serialize, PartialEq)]
pub struct ChatBlockInfo {
    pub blocked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
}

impl ChatBlockInfo {
    pub fn open() -> Self {
        Self {
            blocked: false,
            reason: None,
            product_status: None,
            product_name: None,
        }
    }

    pub fn not_found() -> Self {
        Self {
            blocked: true,
            reason: Some(CONVERSATION_NOT_FOUND_MESSAGE.to_string()),
            product_status: None,
            product_name: None,
        }
    }
}

/// Block decision from the listing's status alone. A conversation without an
/// attached listing, or whose listing disappeared, stays open.
pub fn block_for_status(status: ProductStatus, product_name: &str) -> Option<ChatBlockInfo> {
    if status == ProductStatus::Active {
        return None;
    }

    let reason = if status == ProductStatus::Sold {
        PRODUCT_SOLD_MESSAGE
    } else {
        PRODUCT_INACTIVE_MESSAGE
    };

    Some(ChatBlockInfo {
        blocked: true,
        reason: Some(reason.to_string()),
        product_status: Some(status.as_str().to_string()),
        product_name: Some(product_name.to_string()),
    })
}

pub async fn chat_block_info(
    db: &Database,
    conversation_id: &str,
) -> Result<ChatBlockInfo, ApiError> {
    let Ok(conv_oid) = ObjectId::parse_str(conversation_id) else {
        return Ok(ChatBlockInfo::not_found());
    };

    let conversations = db.collection::<Conversation>("conversations");
    let conversation = conversations
        .find_one(doc! { "_id": conv_oid }, None)
        .await
        .map_err(|e| {
            log::error!("Mongo find_one error (chat guard): {:?}", e);
            ApiError::Internal
        })?;

    let Some(conversation) = conversation else {
        return Ok(ChatBlockInfo::not_found());
    };

    let Some(product_id) = conversation.product_id else {
        return Ok(ChatBlockInfo::open());
    };

    let Ok(product_oid) = ObjectId::parse_str(&product_id) else {
        return Ok(ChatBlockInfo::open());
    };

    let products = db.collection::<Product>("products");
    let product = products
        .find_one(doc! { "_id": product_oid }, None)
        .await
        .map_err(|e| {
            log::error!("Mongo find_one error (chat guard product): {:?}", e);
            ApiError::Internal
        })?;

    let Some(product) = product else {
        return Ok(ChatBlockInfo::open());
    };

    Ok(block_for_status(product.status, &product.name).unwrap_or_else(ChatBlockInfo::open))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_listing_does_not_block() {
        assert!(block_for_status(ProductStatus::Active, "bici").is_none());
    }

    #[test]
    fn sold_listing_blocks_with_sold_reason() {
        let info = block_for_status(ProductStatus::Sold, "bici").unwrap();
        assert!(info.blocked);
        assert_eq!(info.reason.as_deref(), Some(PRODUCT_SOLD_MESSAGE));
        assert_eq!(info.product_status.as_deref(), Some("sold"));
        assert_eq!(info.product_name.as_deref(), Some("bici"));
    }

    #[test]
    fn expired_and_deleted_block_with_inactive_reason() {
        for status in [ProductStatus::Expired, ProductStatus::Deleted] {
            let info = block_for_status(status, "bici").unwrap();
            assert_eq!(info.reason.as_deref(), Some(PRODUCT_INACTIVE_MESSAGE));
        }
    }
}

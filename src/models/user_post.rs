use std::collections::HashMap;

use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct CategoryPostStats {
    #[serde(default)]
    pub total_posts: i64,
    #[serde(default)]
    pub free_posts_used: i64,
    #[serde(default)]
    pub paid_posts: i64,
    #[serde(with = "crate::utils::dates::option_datetime", default)]
    pub last_posted_at: Option<DateTime<Utc>>,
}

/// One document per user: the posting ledger behind the free-post quota.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserPost {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    pub user: ObjectId,
    #[serde(default)]
    pub category_posts: HashMap<String, CategoryPostStats>,
    #[serde(default)]
    pub total_free_posts_used: i64,
    #[serde(default)]
    pub total_paid_posts: i64,
    #[serde(default)]
    pub total_amount_paid: i64,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl UserPost {
    pub fn new(user: ObjectId, now: DateTime<Utc>) -> Self {
        Self {
            id: ObjectId::new(),
            user,
            category_posts: HashMap::new(),
            total_free_posts_used: 0,
            total_paid_posts: 0,
            total_amount_paid: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this user still has free-post allowance in the category.
    /// Unknown categories never post for free.
    pub fn can_post_free(&self, category_name: &str) -> bool {
        let Some(form) = catalog::category_form(category_name) else {
            return false;
        };

        let used = self
            .category_posts
            .get(form.key)
            .map(|s| s.free_posts_used)
            .unwrap_or(0);

        used < form.free_posts
    }

    /// 0 while the free allowance lasts, the category's base price after.
    pub fn post_cost(&self, category_name: &str) -> i64 {
        let Some(form) = catalog::category_form(category_name) else {
            return 0;
        };

        if self.can_post_free(category_name) {
            0
        } else {
            form.price
        }
    }

    /// Bump the per-category and global counters. Returns false for an
    /// unknown category, which records nothing.
    pub fn record_post(&mut self, category_name: &str, paid: bool, now: DateTime<Utc>) -> bool {
        let Some(form) = catalog::category_form(category_name) else {
            return false;
        };

        let stats = self.category_posts.entry(form.key.to_string()).or_default();
        stats.total_posts += 1;
        stats.last_posted_at = Some(now);

        if paid {
            stats.paid_posts += 1;
            self.total_paid_posts += 1;
            self.total_amount_paid += form.price;
        } else {
            stats.free_posts_used += 1;
            self.total_free_posts_used += 1;
        }

        self.updated_at = now;
        true
    }
}

/// The ledger row is created lazily on first use.
pub async fn find_or_create(
    col: &mongodb::Collection<UserPost>,
    user: ObjectId,
    now: DateTime<Utc>,
) -> Result<UserPost, mongodb::error::Error> {
    if let Some(existing) = col.find_one(bson::doc! { "user": user }, None).await? {
        return Ok(existing);
    }

    let fresh = UserPost::new(user, now);
    col.insert_one(&fresh, None).await?;
    Ok(fresh)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> UserPost {
        UserPost::new(ObjectId::new(), Utc::now())
    }

    #[test]
    fn free_allowance_is_consumed_per_category() {
        let mut up = fresh();
        assert!(up.can_post_free("Animals"));
        assert_eq!(up.post_cost("Animals"), 0);

        assert!(up.record_post("Animals", false, Utc::now()));
        assert!(!up.can_post_free("Animals"));
        assert_eq!(up.post_cost("Animals"), 49);

        // other categories keep their own allowance
        assert!(up.can_post_free("Fruits"));
    }

    #[test]
    fn paid_only_categories_always_cost() {
        let up = fresh();
        assert!(!up.can_post_free("Cars"));
        assert_eq!(up.post_cost("Cars"), 199);
    }

    #[test]
    fn unknown_category_is_never_free_and_never_recorded() {
        let mut up = fresh();
        assert!(!up.can_post_free("Spaceships"));
        assert!(!up.record_post("Spaceships", false, Utc::now()));
        assert!(up.category_posts.is_empty());
    }

    #[test]
    fn paid_posts_accumulate_amount() {
        let mut up = fresh();
        let now = Utc::now();
        up.record_post("Cars", true, now);
        up.record_post("Bikes", true, now);

        assert_eq!(up.total_paid_posts, 2);
        assert_eq!(up.total_amount_paid, 199 + 99);
        assert_eq!(up.total_free_posts_used, 0);
        assert_eq!(up.category_posts.get("CAR").unwrap().paid_posts, 1);
    }

    #[test]
    fn lookup_is_case_insensitive_like_the_catalog() {
        let mut up = fresh();
        up.record_post("animals", false, Utc::now());
        assert!(!up.can_post_free("ANIMALS"));
    }
}

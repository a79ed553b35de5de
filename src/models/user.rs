use bson::oid::ObjectId;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Address {
    pub country: Option<String>,
    pub city: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub zip_code: Option<i64>,
    pub address_type: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GeoPoint {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
    #[serde(with = "crate::utils::dates::option_datetime", default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Otp {
    pub code: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    // Incremental numeric id kept alongside the ObjectId for legacy clients.
    #[serde(default)]
    pub user_id: Option<i64>,

    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub role: String, // "user" | "Admin"
    pub avatar: String,

    // NO uses skip_serializing aquí, si no Mongo no lo guarda.
    pub password_hash: Option<String>,

    #[serde(default)]
    pub addresses: Vec<Address>,
    #[serde(default)]
    pub last_known_location: Option<GeoPoint>,
    #[serde(default)]
    pub push_token: Option<String>,

    #[serde(default)]
    pub otp: Option<Otp>,
    #[serde(default)]
    pub is_phone_verified: bool,
    #[serde(default)]
    pub hide_phone_number: bool,

    // Contact-view credits and subscription state
    #[serde(default)]
    pub contact_views: i64,
    #[serde(default)]
    pub viewed_contacts: Vec<String>,
    #[serde(default)]
    pub has_unlimited_contacts: bool,
    #[serde(with = "crate::utils::dates::option_datetime", default)]
    pub subscription_expiry: Option<DateTime<Utc>>,
    #[serde(default)]
    pub contact_credits: i64,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterDto {
    #[validate(length(min = 2, message = "name too short"))]
    pub name: String,

    #[validate(email(message = "invalid email"))]
    pub email: String,

    #[validate(length(min = 6, message = "password too short"))]
    pub password: String,

    #[validate(length(equal = 10, message = "phone number must be 10 digits"))]
    pub phone_number: String,

    #[validate(url(message = "avatar must be a URL"))]
    pub avatar: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginDto {
    #[validate(email(message = "invalid email"))]
    pub email: String,

    #[validate(length(min = 6, message = "password too short"))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpDto {
    pub code: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePasswordDto {
    pub old_password: String,

    #[validate(length(min = 6, message = "password too short"))]
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateLocationDto {
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PushTokenDto {
    pub push_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HidePhoneDto {
    pub hide_phone_number: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileDto {
    #[validate(length(min = 2, message = "name too short"))]
    pub name: Option<String>,

    #[validate(url(message = "avatar must be a URL"))]
    pub avatar: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: String,
    pub user_id: Option<i64>,
    pub name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub role: String,
    pub avatar: String,
    pub is_phone_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        let phone_number = if u.hide_phone_number {
            None
        } else {
            Some(u.phone_number)
        };

        Self {
            id: u.id.to_hex(),
            user_id: u.user_id,
            name: u.name,
            email: u.email,
            phone_number,
            role: u.role,
            avatar: u.avatar,
            is_phone_verified: u.is_phone_verified,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum OtpOutcome {
    Missing,
    Expired,
    Invalid,
    Verified,
}

pub fn check_otp(otp: &Option<Otp>, code: &str, now: DateTime<Utc>) -> OtpOutcome {
    let Some(otp) = otp else {
        return OtpOutcome::Missing;
    };

    if now > otp.expires_at {
        return OtpOutcome::Expired;
    }

    if otp.code == code {
        OtpOutcome::Verified
    } else {
        OtpOutcome::Invalid
    }
}

/// Result of merging a batch of viewed contact ids into the stored set.
#[derive(Debug, PartialEq, Eq)]
pub struct ContactMerge {
    pub final_viewed: Vec<String>,
    pub newly_added: i64,
}

/// Union of stored + incoming ids, first occurrence wins. `newly_added` counts
/// only ids that were never in the stored set, which is what credits are
/// charged for.
pub fn merge_viewed_contacts(previous: &[String], incoming: &[String]) -> ContactMerge {
    let mut final_viewed: Vec<String> = Vec::new();
    for id in previous {
        if !id.is_empty() && !final_viewed.contains(id) {
            final_viewed.push(id.clone());
        }
    }

    let stored = final_viewed.len();
    for id in incoming {
        if !id.is_empty() && !final_viewed.contains(id) {
            final_viewed.push(id.clone());
        }
    }

    let newly_added = (final_viewed.len() - stored) as i64;
    ContactMerge {
        final_viewed,
        newly_added,
    }
}

/// Credits never go below zero.
pub fn charge_credits(current: i64, newly_added: i64) -> i64 {
    (current - newly_added).max(0)
}

/// Unlimited flag only counts while the expiry is in the future. A flag with
/// no expiry is treated as active (legacy documents).
pub fn subscription_active(
    has_unlimited: bool,
    expiry: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> bool {
    match (has_unlimited, expiry) {
        (false, _) => false,
        (true, None) => true,
        (true, Some(expiry)) => now <= expiry,
    }
}

pub fn days_remaining(expiry: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let secs = (expiry - now).num_seconds();
    if secs <= 0 {
        return 0;
    }
    // ceil, like the day counter shown to subscribers
    (secs + 86_399) / 86_400
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &[&str]) -> Vec<String> {
        v.iter().map(|x| x.to_string()).collect()
    }

    #[test]
    fn merge_dedupes_and_counts_only_new_ids() {
        let merge = merge_viewed_contacts(&s(&["a", "b"]), &s(&["b", "c", "c", "d"]));
        assert_eq!(merge.final_viewed, s(&["a", "b", "c", "d"]));
        assert_eq!(merge.newly_added, 2);
    }

    #[test]
    fn merge_ignores_empty_and_duplicate_stored_ids() {
        let merge = merge_viewed_contacts(&s(&["a", "a", ""]), &s(&["a"]));
        assert_eq!(merge.final_viewed, s(&["a"]));
        assert_eq!(merge.newly_added, 0);
    }

    #[test]
    fn charging_saturates_at_zero() {
        assert_eq!(charge_credits(7, 3), 4);
        assert_eq!(charge_credits(2, 5), 0);
        assert_eq!(charge_credits(0, 1), 0);
    }

    #[test]
    fn subscription_expiry_is_lazy_checked() {
        let now = Utc::now();
        assert!(subscription_active(true, Some(now + Duration::days(3)), now));
        assert!(!subscription_active(true, Some(now - Duration::days(1)), now));
        assert!(subscription_active(true, None, now));
        assert!(!subscription_active(false, Some(now + Duration::days(3)), now));
    }

    #[test]
    fn days_remaining_rounds_up() {
        let now = Utc::now();
        assert_eq!(days_remaining(now + Duration::hours(1), now), 1);
        assert_eq!(days_remaining(now + Duration::days(30), now), 30);
        assert_eq!(days_remaining(now - Duration::hours(1), now), 0);
    }

    #[test]
    fn otp_check_covers_all_outcomes() {
        let now = Utc::now();
        let otp = Some(Otp {
            code: "123456".into(),
            expires_at: now + Duration::minutes(10),
        });

        assert_eq!(check_otp(&None, "123456", now), OtpOutcome::Missing);
        assert_eq!(check_otp(&otp, "000000", now), OtpOutcome::Invalid);
        assert_eq!(check_otp(&otp, "123456", now), OtpOutcome::Verified);
        assert_eq!(
            check_otp(&otp, "123456", now + Duration::minutes(11)),
            OtpOutcome::Expired
        );
    }
}

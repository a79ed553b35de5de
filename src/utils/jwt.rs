use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id (ObjectId hex)
    pub role: String,
    pub phone_verified: bool,
    pub exp: usize,
}

pub fn sign_jwt(
    user_id: &str,
    role: &str,
    phone_verified: bool,
    secret: &str,
    exp_minutes: i64,
) -> Result<String, String> {
    let exp = (Utc::now() + Duration::minutes(exp_minutes)).timestamp() as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        role: role.to_string(),
        phone_verified,
        exp,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| e.to_string())
}

pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, String> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| e.to_string())?;

    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_verify_roundtrip() {
        let token = sign_jwt("abc123", "user", true, "secret", 60).unwrap();
        let claims = verify_jwt(&token, "secret").unwrap();

        assert_eq!(claims.sub, "abc123");
        assert_eq!(claims.role, "user");
        assert!(claims.phone_verified);
    }

    #[test]
    fn rejects_wrong_secret() {
        let token = sign_jwt("abc123", "user", false, "secret", 60).unwrap();
        assert!(verify_jwt(&token, "other").is_err());
    }
}

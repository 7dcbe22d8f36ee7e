use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config;

/// Token payload. Clients read `username` and `isAdmin` from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    #[serde(rename = "isAdmin", default)]
    pub is_admin: bool,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(username: impl Into<String>, is_admin: bool) -> Self {
        let now = Utc::now();
        let expiry_hours = config::config().security.jwt_expiry_hours;
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            username: username.into(),
            is_admin,
            exp,
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),
    #[error("JWT secret not configured")]
    InvalidSecret,
}

fn secret() -> Result<&'static str, JwtError> {
    let secret = config::config().security.jwt_secret.as_str();
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }
    Ok(secret)
}

/// Sign a token for `username`.
pub fn create_token(username: &str, is_admin: bool) -> Result<String, JwtError> {
    encode_claims(&Claims::new(username, is_admin))
}

pub fn encode_claims(claims: &Claims) -> Result<String, JwtError> {
    let encoding_key = EncodingKey::from_secret(secret()?.as_bytes());
    encode(&Header::default(), claims, &encoding_key).map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

/// Verify signature and expiry, returning the claims.
pub fn verify_token(token: &str) -> Result<Claims, JwtError> {
    let decoding_key = DecodingKey::from_secret(secret()?.as_bytes());
    let token_data = decode::<Claims>(token, &decoding_key, &Validation::default())
        .map_err(|e| JwtError::InvalidToken(e.to_string()))?;
    Ok(token_data.claims)
}

/// Hash a plaintext password at the configured bcrypt cost.
pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, config::config().security.bcrypt_work_factor)
}

pub fn verify_password(password: &str, hashed: &str) -> Result<bool, bcrypt::BcryptError> {
    bcrypt::verify(password, hashed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip() {
        let token = create_token("u1", false).unwrap();
        let claims = verify_token(&token).unwrap();
        assert_eq!(claims.username, "u1");
        assert!(!claims.is_admin);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn admin_flag_is_serialized_as_is_admin() {
        let claims = Claims::new("admin", true);
        let value = serde_json::to_value(&claims).unwrap();
        assert_eq!(value["isAdmin"], serde_json::json!(true));
    }

    #[test]
    fn rejects_token_signed_with_other_key() {
        let claims = Claims::new("u1", true);
        let forged = encode(&Header::default(), &claims, &EncodingKey::from_secret(b"not-the-secret")).unwrap();
        assert!(matches!(verify_token(&forged), Err(JwtError::InvalidToken(_))));
    }

    #[test]
    fn rejects_expired_token() {
        let mut claims = Claims::new("u1", false);
        claims.iat -= 7200;
        claims.exp = claims.iat + 60;
        let token = encode_claims(&claims).unwrap();
        assert!(verify_token(&token).is_err());
    }

    #[test]
    fn password_hash_verifies() {
        // Minimum bcrypt cost keeps this quick regardless of environment.
        let hashed = bcrypt::hash("password1", 4).unwrap();
        assert!(verify_password("password1", &hashed).unwrap());
        assert!(!verify_password("password2", &hashed).unwrap());
    }
}

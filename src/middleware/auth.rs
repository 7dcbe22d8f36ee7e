use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::{verify_token, Claims};
use crate::error::ApiError;

/// Authenticated user context extracted from JWT.
///
/// Also an extractor: handlers taking `AuthUser` reject anonymous requests
/// with 401.
#[derive(Clone, Debug, PartialEq)]
pub struct AuthUser {
    pub username: String,
    pub is_admin: bool,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            username: claims.username,
            is_admin: claims.is_admin,
        }
    }
}

/// Extractor that only admits admins.
#[derive(Clone, Debug)]
pub struct AdminUser(pub AuthUser);

/// If a bearer token was provided and verifies, store the user on the
/// request. A missing or bad token is not an error here; the guards decide.
pub async fn authenticate_jwt(headers: HeaderMap, mut request: Request, next: Next) -> Response {
    if let Some(token) = extract_bearer_token(&headers) {
        match verify_token(&token) {
            Ok(claims) => {
                request.extensions_mut().insert(AuthUser::from(claims));
            }
            Err(e) => tracing::debug!("Ignoring bad token: {}", e),
        }
    }
    next.run(request).await
}

/// Accepts `Bearer <token>` or `bearer <token>`.
fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_str = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    let token = auth_str
        .strip_prefix("Bearer ")
        .or_else(|| auth_str.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Unauthorized"))
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match AuthUser::from_request_parts(parts, state).await {
            Ok(user) if user.is_admin => Ok(AdminUser(user)),
            _ => Err(ApiError::unauthorized("Need to be admin to use this route")),
        }
    }
}

/// Admins may act on anyone; everyone else only on themselves.
pub fn ensure_correct_user_or_admin(user: &AuthUser, username: &str) -> Result<(), ApiError> {
    if user.is_admin || user.username == username {
        Ok(())
    } else {
        Err(ApiError::unauthorized("Unauthorized"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn extracts_either_bearer_casing() {
        assert_eq!(extract_bearer_token(&headers("Bearer abc")), Some("abc".to_string()));
        assert_eq!(extract_bearer_token(&headers("bearer abc ")), Some("abc".to_string()));
    }

    #[test]
    fn ignores_other_schemes_and_blank_tokens() {
        assert_eq!(extract_bearer_token(&headers("Basic abc")), None);
        assert_eq!(extract_bearer_token(&headers("Bearer   ")), None);
        assert_eq!(extract_bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn correct_user_or_admin() {
        let u1 = AuthUser { username: "u1".to_string(), is_admin: false };
        let admin = AuthUser { username: "admin".to_string(), is_admin: true };
        assert!(ensure_correct_user_or_admin(&u1, "u1").is_ok());
        assert!(ensure_correct_user_or_admin(&u1, "u2").is_err());
        assert!(ensure_correct_user_or_admin(&admin, "u2").is_ok());
    }
}

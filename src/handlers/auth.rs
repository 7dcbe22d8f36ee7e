use axum::{http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use super::validate::{Validate, ValidJson};
use crate::auth::create_token;
use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::models::{NewUser, User};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if self.username.is_empty() || self.password.is_empty() {
            return Err(ApiError::bad_request("username and password are required"));
        }
        Ok(())
    }
}

/// POST /auth/token { username, password } => { token }
pub async fn token(ValidJson(login): ValidJson<LoginRequest>) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let user = User::authenticate(&pool, &login.username, &login.password).await?;
    let token = create_token(&user.username, user.is_admin)?;
    Ok(Json(json!({ "token": token })))
}

/// POST /auth/register { user } => { token }
///
/// Self-registration never grants admin.
pub async fn register(ValidJson(mut data): ValidJson<NewUser>) -> Result<(StatusCode, Json<Value>), ApiError> {
    data.is_admin = false;
    let pool = DatabaseManager::pool().await?;
    let user = User::register(&pool, &data).await?;
    let token = create_token(&user.username, user.is_admin)?;
    Ok((StatusCode::CREATED, Json(json!({ "token": token }))))
}

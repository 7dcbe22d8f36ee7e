use axum::{extract::Path, http::StatusCode, Json};
use serde_json::{json, Value};

use super::params;
use super::validate::ValidJson;
use crate::auth::create_token;
use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::middleware::{ensure_correct_user_or_admin, AdminUser, AuthUser};
use crate::models::{NewUser, User, UserUpdate};

/// POST /users { user } => { user, token }
///
/// Admin-only way to add users, including other admins. Public signup is
/// `POST /auth/register`.
pub async fn create(_admin: AdminUser, ValidJson(data): ValidJson<NewUser>) -> Result<(StatusCode, Json<Value>), ApiError> {
    let pool = DatabaseManager::pool().await?;
    let user = User::register(&pool, &data).await?;
    let token = create_token(&user.username, user.is_admin)?;
    Ok((StatusCode::CREATED, Json(json!({ "user": user, "token": token }))))
}

/// GET /users => { users: [{ username, firstName, lastName, email, isAdmin, jobs }, ...] }
pub async fn list(_admin: AdminUser) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let users = User::find_all(&pool).await?;
    Ok(Json(json!({ "users": users })))
}

/// GET /users/:username => { user }
pub async fn get(auth: AuthUser, Path(username): Path<String>) -> Result<Json<Value>, ApiError> {
    ensure_correct_user_or_admin(&auth, &username)?;
    let pool = DatabaseManager::pool().await?;
    let user = User::get(&pool, &username).await?;
    Ok(Json(json!({ "user": user })))
}

/// PATCH /users/:username { firstName?, lastName?, password?, email?, isAdmin? } => { user }
///
/// Only admins may change `isAdmin`.
pub async fn update(
    auth: AuthUser,
    Path(username): Path<String>,
    ValidJson(data): ValidJson<UserUpdate>,
) -> Result<Json<Value>, ApiError> {
    ensure_correct_user_or_admin(&auth, &username)?;
    if data.is_admin.is_some() && !auth.is_admin {
        return Err(ApiError::unauthorized("Need to be admin to change admin status"));
    }

    let pool = DatabaseManager::pool().await?;
    let user = User::update(&pool, &username, &data).await?;
    Ok(Json(json!({ "user": user })))
}

/// DELETE /users/:username => { deleted: username }
pub async fn remove(auth: AuthUser, Path(username): Path<String>) -> Result<Json<Value>, ApiError> {
    ensure_correct_user_or_admin(&auth, &username)?;
    let pool = DatabaseManager::pool().await?;
    User::remove(&pool, &username).await?;
    Ok(Json(json!({ "deleted": username })))
}

/// POST /users/:username/jobs/:id => { applied: jobId }
pub async fn apply(auth: AuthUser, Path((username, id)): Path<(String, String)>) -> Result<Json<Value>, ApiError> {
    ensure_correct_user_or_admin(&auth, &username)?;
    let job_id = params::job_id(&id)?;
    let pool = DatabaseManager::pool().await?;
    let applied = User::apply_to_job(&pool, &username, job_id).await?;
    Ok(Json(json!({ "applied": applied })))
}

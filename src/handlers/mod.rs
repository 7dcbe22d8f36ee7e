// handlers/mod.rs - HTTP handlers, one module per resource
//
// Public:       GET /health, POST /auth/*, GET /companies*, GET /jobs*
// Admin:        POST/PATCH/DELETE on companies and jobs, POST/GET /users
// Self or admin: /users/:username[/jobs/:id]
//
// Guards are extractors (AuthUser, AdminUser) so each handler states its
// own access rule in its signature.

pub mod auth;
pub mod companies;
pub mod jobs;
pub mod params;
pub mod users;
pub mod validate;

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::database::DatabaseManager;
use crate::error::ApiError;

pub async fn health() -> impl IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database": "unavailable"
                })),
            )
        }
    }
}

pub async fn not_found() -> ApiError {
    ApiError::not_found("Not Found")
}

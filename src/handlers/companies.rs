use axum::{
    extract::{Path, Query},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use super::params::{self, QueryParams};
use super::validate::ValidJson;
use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::middleware::AdminUser;
use crate::models::{Company, CompanyFilter, CompanyUpdate, NewCompany};

const FILTERS: &[&str] = &["name", "minEmployees", "maxEmployees"];

/// POST /companies { company } => { company }
///
/// Authorization required: admin
pub async fn create(
    _admin: AdminUser,
    ValidJson(data): ValidJson<NewCompany>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let pool = DatabaseManager::pool().await?;
    let company = Company::create(&pool, &data).await?;
    Ok((StatusCode::CREATED, Json(json!({ "company": company }))))
}

/// GET /companies => { companies: [...] }
///
/// Optional filters: `name` (case-insensitive substring), `minEmployees`,
/// `maxEmployees`.
pub async fn list(Query(query): Query<QueryParams>) -> Result<Json<Value>, ApiError> {
    let filter = company_filter(&query)?;
    let pool = DatabaseManager::pool().await?;
    let companies = Company::find_all(&pool, &filter).await?;
    Ok(Json(json!({ "companies": companies })))
}

/// GET /companies/:handle => { company } with its jobs
pub async fn get(Path(handle): Path<String>) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let company = Company::get(&pool, &handle).await?;
    Ok(Json(json!({ "company": company })))
}

/// PATCH /companies/:handle { name?, description?, numEmployees?, logoUrl? } => { company }
pub async fn update(
    _admin: AdminUser,
    Path(handle): Path<String>,
    ValidJson(data): ValidJson<CompanyUpdate>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let company = Company::update(&pool, &handle, &data).await?;
    Ok(Json(json!({ "company": company })))
}

/// DELETE /companies/:handle => { deleted: handle }
pub async fn remove(_admin: AdminUser, Path(handle): Path<String>) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    Company::remove(&pool, &handle).await?;
    Ok(Json(json!({ "deleted": handle })))
}

fn company_filter(query: &QueryParams) -> Result<CompanyFilter, ApiError> {
    params::reject_unknown(query, FILTERS)?;

    let filter = CompanyFilter {
        name: params::text(query, "name"),
        min_employees: params::non_negative(query, "minEmployees")?,
        max_employees: params::non_negative(query, "maxEmployees")?,
    };

    if let (Some(min), Some(max)) = (filter.min_employees, filter.max_employees) {
        if min > max {
            return Err(ApiError::bad_request("minEmployees cannot be greater than maxEmployees"));
        }
    }

    Ok(filter)
}

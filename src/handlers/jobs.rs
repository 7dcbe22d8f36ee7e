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
use crate::models::{Job, JobFilter, JobUpdate, NewJob};

const FILTERS: &[&str] = &["title", "minSalary", "hasEquity"];

/// POST /jobs { title, salary?, equity?, companyHandle } => { job }
///
/// Authorization required: admin
pub async fn create(_admin: AdminUser, ValidJson(data): ValidJson<NewJob>) -> Result<(StatusCode, Json<Value>), ApiError> {
    let pool = DatabaseManager::pool().await?;
    let job = Job::create(&pool, &data).await?;
    Ok((StatusCode::CREATED, Json(json!({ "job": job }))))
}

/// GET /jobs?title=&minSalary=&hasEquity= => { jobs: [...] }
///
/// No matches is an empty list, not a 404.
pub async fn list(Query(query): Query<QueryParams>) -> Result<Json<Value>, ApiError> {
    let filter = job_filter(&query)?;
    let pool = DatabaseManager::pool().await?;
    let jobs = Job::find_all(&pool, &filter).await?;
    Ok(Json(json!({ "jobs": jobs })))
}

/// GET /jobs/:id => { job }
pub async fn get(Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    let id = params::job_id(&id)?;
    let pool = DatabaseManager::pool().await?;
    let job = Job::get(&pool, id).await?;
    Ok(Json(json!({ "job": job })))
}

/// PATCH /jobs/:id { title?, salary?, equity? } => { job }
pub async fn update(
    _admin: AdminUser,
    Path(id): Path<String>,
    ValidJson(data): ValidJson<JobUpdate>,
) -> Result<Json<Value>, ApiError> {
    let id = params::job_id(&id)?;
    let pool = DatabaseManager::pool().await?;
    let job = Job::update(&pool, id, &data).await?;
    Ok(Json(json!({ "job": job })))
}

/// DELETE /jobs/:id => { deleted: id }
pub async fn remove(_admin: AdminUser, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    let id = params::job_id(&id)?;
    let pool = DatabaseManager::pool().await?;
    Job::remove(&pool, id).await?;
    Ok(Json(json!({ "deleted": id })))
}

fn job_filter(query: &QueryParams) -> Result<JobFilter, ApiError> {
    params::reject_unknown(query, FILTERS)?;
    Ok(JobFilter {
        title: params::text(query, "title"),
        min_salary: params::non_negative(query, "minSalary")?,
        has_equity: params::boolean(query, "hasEquity")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> QueryParams {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn parses_query_string_filters() {
        let filter = job_filter(&query(&[("title", "construction"), ("minSalary", "55000"), ("hasEquity", "True")])).unwrap();
        assert_eq!(
            filter,
            JobFilter { title: Some("construction".to_string()), min_salary: Some(55000), has_equity: Some(true) }
        );
    }

    #[test]
    fn empty_query_means_no_filters() {
        assert_eq!(job_filter(&QueryParams::new()).unwrap(), JobFilter::default());
    }

    #[test]
    fn rejects_bad_values_and_keys() {
        assert!(job_filter(&query(&[("minSalary", "-5")])).is_err());
        assert!(job_filter(&query(&[("hasEquity", "maybe")])).is_err());
        assert!(job_filter(&query(&[("company", "c1")])).is_err());
    }
}

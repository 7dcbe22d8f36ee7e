use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::database::query::{classify, fetch_all_as, fetch_optional_as};
use crate::database::DatabaseError;
use crate::sql::{build_filter_clause, build_set_clause, FieldRenames, FilterCriteria, FilterWhere, UpdateData};

const RENAMES: FieldRenames<'static> = &[("companyHandle", "company_handle")];

// NUMERIC equity comes back as float8 so it serializes as a JSON number
const COLUMNS: &str = "id, title, salary, equity::float8 AS equity, company_handle";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: i32,
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<f64>,
    pub company_handle: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewJob {
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<f64>,
    pub company_handle: String,
}

/// Partial update. Id and company cannot change. `salary` and `equity`
/// may be cleared with `null`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobUpdate {
    #[serde(default, deserialize_with = "super::nullable")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub salary: Option<Option<i32>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub equity: Option<Option<f64>>,
}

impl From<&JobUpdate> for UpdateData {
    fn from(data: &JobUpdate) -> Self {
        let mut fields = UpdateData::new();
        fields
            .push_supplied("title", data.title.clone())
            .push_supplied("salary", data.salary)
            .push_supplied("equity", data.equity);
        fields
    }
}

/// `GET /jobs` filters, applied in this order: title, minSalary, hasEquity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobFilter {
    pub title: Option<String>,
    pub min_salary: Option<i64>,
    pub has_equity: Option<bool>,
}

impl FilterCriteria for JobFilter {
    fn apply(&self, filter: &mut FilterWhere) {
        filter
            .contains("title", self.title.as_deref())
            .at_least("salary", self.min_salary)
            .flag("equity > 0", self.has_equity);
    }
}

impl Job {
    /// Insert a job for an existing company.
    pub async fn create(pool: &PgPool, data: &NewJob) -> Result<Job, DatabaseError> {
        let company = sqlx::query_scalar::<_, String>("SELECT handle FROM companies WHERE handle = $1")
            .bind(&data.company_handle)
            .fetch_optional(pool)
            .await
            .map_err(classify)?;

        if company.is_none() {
            return Err(DatabaseError::Constraint(format!("No company: {}", data.company_handle)));
        }

        let job = sqlx::query_as::<_, Job>(&format!(
            "INSERT INTO jobs (title, salary, equity, company_handle)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        ))
        .bind(&data.title)
        .bind(data.salary)
        .bind(data.equity)
        .bind(&data.company_handle)
        .fetch_one(pool)
        .await
        .map_err(classify)?;

        tracing::info!("Created job {} for {}", job.id, job.company_handle);
        Ok(job)
    }

    /// List jobs ordered by title. An empty list is not an error.
    pub async fn find_all(pool: &PgPool, filter: &JobFilter) -> Result<Vec<Job>, DatabaseError> {
        let where_sql = build_filter_clause(filter);
        let sql = format!("SELECT {COLUMNS} FROM jobs {} ORDER BY title, id", where_sql.query);
        fetch_all_as::<Job>(pool, &sql, &where_sql.params).await
    }

    pub async fn get(pool: &PgPool, id: i32) -> Result<Job, DatabaseError> {
        sqlx::query_as::<_, Job>(&format!("SELECT {COLUMNS} FROM jobs WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(classify)?
            .ok_or_else(|| DatabaseError::NotFound(format!("No job: {}", id)))
    }

    pub async fn update(pool: &PgPool, id: i32, data: &JobUpdate) -> Result<Job, DatabaseError> {
        let set = build_set_clause(&UpdateData::from(data), RENAMES)?;
        let id_idx = set.params.len() + 1;
        let sql = format!("UPDATE jobs SET {} WHERE id = ${} RETURNING {COLUMNS}", set.query, id_idx);

        let mut params = set.params;
        params.push(id.into());

        fetch_optional_as::<Job>(pool, &sql, &params)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("No job: {}", id)))
    }

    pub async fn remove(pool: &PgPool, id: i32) -> Result<(), DatabaseError> {
        sqlx::query_scalar::<_, i32>("DELETE FROM jobs WHERE id = $1 RETURNING id")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(classify)?
            .ok_or_else(|| DatabaseError::NotFound(format!("No job: {}", id)))?;

        tracing::info!("Removed job {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn title_filter_is_wildcarded() {
        let filter = JobFilter { title: Some("civil".to_string()), ..Default::default() };
        let r = build_filter_clause(&filter);
        assert_eq!(r.query, "WHERE title ILIKE $1");
        assert_eq!(r.params, vec![json!("%civil%")]);
    }

    #[test]
    fn min_salary_and_equity() {
        let filter = JobFilter { min_salary: Some(200000), has_equity: Some(true), ..Default::default() };
        let r = build_filter_clause(&filter);
        assert_eq!(r.query, "WHERE salary >= $1 AND equity > 0");
        assert_eq!(r.params, vec![json!(200000)]);
    }

    #[test]
    fn false_equity_flag_adds_nothing() {
        let filter = JobFilter { min_salary: Some(100000), has_equity: Some(false), ..Default::default() };
        let r = build_filter_clause(&filter);
        assert_eq!(r.query, "WHERE salary >= $1");
    }

    #[test]
    fn no_filters_no_where() {
        let r = build_filter_clause(&JobFilter::default());
        assert!(r.query.is_empty());
        assert!(r.params.is_empty());
    }

    #[test]
    fn update_follows_declaration_order() {
        let data = JobUpdate {
            title: Some(Some("New yob".to_string())),
            salary: Some(Some(10000)),
            equity: Some(Some(1.0)),
        };
        let set = build_set_clause(&UpdateData::from(&data), RENAMES).unwrap();
        assert_eq!(set.query, r#""title"=$1, "salary"=$2, "equity"=$3"#);
        assert_eq!(set.params, vec![json!("New yob"), json!(10000), json!(1.0)]);
    }

    #[test]
    fn null_salary_is_kept() {
        let data: JobUpdate = serde_json::from_value(json!({ "salary": null, "equity": 0.5 })).unwrap();
        let set = build_set_clause(&UpdateData::from(&data), RENAMES).unwrap();
        assert_eq!(set.query, r#""salary"=$1, "equity"=$2"#);
        assert_eq!(set.params, vec![json!(null), json!(0.5)]);
    }

    #[test]
    fn job_serializes_company_handle_in_camel_case() {
        let job = Job {
            id: 3,
            title: "Consulting civil engineer".to_string(),
            salary: Some(60000),
            equity: Some(0.0),
            company_handle: "c2".to_string(),
        };
        let value = serde_json::to_value(job).unwrap();
        assert_eq!(value["companyHandle"], "c2");
        assert_eq!(value["equity"], json!(0.0));
    }
}

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::database::query::{classify, fetch_all_as, fetch_optional_as};
use crate::database::DatabaseError;
use crate::sql::{build_filter_clause, build_set_clause, FieldRenames, FilterCriteria, FilterWhere, UpdateData};

const RENAMES: FieldRenames<'static> = &[("numEmployees", "num_employees"), ("logoUrl", "logo_url")];

const COLUMNS: &str = "handle, name, description, num_employees, logo_url";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub handle: String,
    pub name: String,
    pub description: String,
    pub num_employees: Option<i32>,
    pub logo_url: Option<String>,
}

/// Company with the jobs it lists, as returned by `GET /companies/:handle`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyDetail {
    #[serde(flatten)]
    pub company: Company,
    pub jobs: Vec<CompanyJob>,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct CompanyJob {
    pub id: i32,
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewCompany {
    pub handle: String,
    pub name: String,
    pub description: String,
    pub num_employees: Option<i32>,
    pub logo_url: Option<String>,
}

/// Partial update. Handle is the key and cannot change.
///
/// Each field is absent (`None`), cleared (`Some(None)`) or set. Only
/// `numEmployees` and `logoUrl` may be cleared; validation rejects `null`
/// for the others.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompanyUpdate {
    #[serde(default, deserialize_with = "super::nullable")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub num_employees: Option<Option<i32>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub logo_url: Option<Option<String>>,
}

impl From<&CompanyUpdate> for UpdateData {
    fn from(data: &CompanyUpdate) -> Self {
        let mut fields = UpdateData::new();
        fields
            .push_supplied("name", data.name.clone())
            .push_supplied("description", data.description.clone())
            .push_supplied("numEmployees", data.num_employees)
            .push_supplied("logoUrl", data.logo_url.clone());
        fields
    }
}

/// `GET /companies` filters, applied in this order: name, minEmployees, maxEmployees.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyFilter {
    pub name: Option<String>,
    pub min_employees: Option<i64>,
    pub max_employees: Option<i64>,
}

impl FilterCriteria for CompanyFilter {
    fn apply(&self, filter: &mut FilterWhere) {
        filter
            .contains("name", self.name.as_deref())
            .at_least("num_employees", self.min_employees)
            .at_most("num_employees", self.max_employees);
    }
}

impl Company {
    /// Insert a company. Fails with `Duplicate` if the handle is taken.
    pub async fn create(pool: &PgPool, data: &NewCompany) -> Result<Company, DatabaseError> {
        let existing = sqlx::query_scalar::<_, String>("SELECT handle FROM companies WHERE handle = $1")
            .bind(&data.handle)
            .fetch_optional(pool)
            .await
            .map_err(classify)?;

        if existing.is_some() {
            return Err(DatabaseError::Duplicate(format!("Duplicate company: {}", data.handle)));
        }

        let company = sqlx::query_as::<_, Company>(&format!(
            "INSERT INTO companies (handle, name, description, num_employees, logo_url)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        ))
        .bind(&data.handle)
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.num_employees)
        .bind(&data.logo_url)
        .fetch_one(pool)
        .await
        .map_err(classify)?;

        tracing::info!("Created company {}", company.handle);
        Ok(company)
    }

    pub async fn find_all(pool: &PgPool, filter: &CompanyFilter) -> Result<Vec<Company>, DatabaseError> {
        let where_sql = build_filter_clause(filter);
        let sql = format!("SELECT {COLUMNS} FROM companies {} ORDER BY name", where_sql.query);
        fetch_all_as::<Company>(pool, &sql, &where_sql.params).await
    }

    pub async fn get(pool: &PgPool, handle: &str) -> Result<CompanyDetail, DatabaseError> {
        let company = sqlx::query_as::<_, Company>(&format!("SELECT {COLUMNS} FROM companies WHERE handle = $1"))
            .bind(handle)
            .fetch_optional(pool)
            .await
            .map_err(classify)?
            .ok_or_else(|| DatabaseError::NotFound(format!("No company: {}", handle)))?;

        let jobs = sqlx::query_as::<_, CompanyJob>(
            "SELECT id, title, salary, equity::float8 AS equity
             FROM jobs
             WHERE company_handle = $1
             ORDER BY id",
        )
        .bind(handle)
        .fetch_all(pool)
        .await
        .map_err(classify)?;

        Ok(CompanyDetail { company, jobs })
    }

    pub async fn update(pool: &PgPool, handle: &str, data: &CompanyUpdate) -> Result<Company, DatabaseError> {
        let set = build_set_clause(&UpdateData::from(data), RENAMES)?;
        let handle_idx = set.params.len() + 1;
        let sql = format!(
            "UPDATE companies SET {} WHERE handle = ${} RETURNING {COLUMNS}",
            set.query, handle_idx
        );

        let mut params = set.params;
        params.push(handle.into());

        fetch_optional_as::<Company>(pool, &sql, &params)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("No company: {}", handle)))
    }

    pub async fn remove(pool: &PgPool, handle: &str) -> Result<(), DatabaseError> {
        sqlx::query_scalar::<_, String>("DELETE FROM companies WHERE handle = $1 RETURNING handle")
            .bind(handle)
            .fetch_optional(pool)
            .await
            .map_err(classify)?
            .ok_or_else(|| DatabaseError::NotFound(format!("No company: {}", handle)))?;

        tracing::info!("Removed company {}", handle);
        Ok(())
    }
}

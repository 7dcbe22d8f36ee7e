use serde_json::Value;
use sqlx::encode::{Encode, IsNull};
use sqlx::postgres::{types::Oid, PgArgumentBuffer, PgArguments, PgRow, PgTypeInfo};
use sqlx::{FromRow, PgPool, Postgres, Type};
use std::time::Instant;

use crate::config;
use crate::database::manager::DatabaseError;

type PgQueryAs<'q, O> = sqlx::query::QueryAs<'q, Postgres, O, PgArguments>;

/// NULL with no declared parameter type (OID 0), so Postgres infers the
/// column type instead of rejecting a TEXT null in an integer column.
struct UntypedNull;

impl Type<Postgres> for UntypedNull {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_oid(Oid(0))
    }
}

impl<'q> Encode<'q, Postgres> for UntypedNull {
    fn encode_by_ref(&self, _buf: &mut PgArgumentBuffer) -> IsNull {
        IsNull::Yes
    }
}

/// Run a dynamically built statement and map every row into `T`.
pub async fn fetch_all_as<T>(pool: &PgPool, sql: &str, params: &[Value]) -> Result<Vec<T>, DatabaseError>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    log_query(sql, params);
    let started = Instant::now();
    let q = params.iter().fold(sqlx::query_as::<_, T>(sql), bind_param_query_as).persistent(false);
    let rows = q.fetch_all(pool).await.map_err(classify)?;
    warn_if_slow(sql, started);
    Ok(rows)
}

pub async fn fetch_optional_as<T>(pool: &PgPool, sql: &str, params: &[Value]) -> Result<Option<T>, DatabaseError>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    log_query(sql, params);
    let started = Instant::now();
    let q = params.iter().fold(sqlx::query_as::<_, T>(sql), bind_param_query_as).persistent(false);
    let row = q.fetch_optional(pool).await.map_err(classify)?;
    warn_if_slow(sql, started);
    Ok(row)
}

/// Turn constraint violations into client errors; everything else stays opaque.
pub fn classify(err: sqlx::Error) -> DatabaseError {
    if let sqlx::Error::Database(db_err) = &err {
        let detail = db_err.message().to_string();
        match db_err.code().as_deref() {
            Some("23505") => return DatabaseError::Duplicate(detail),
            // foreign_key_violation, not_null_violation, check_violation
            Some("23503") | Some("23502") | Some("23514") => return DatabaseError::Constraint(detail),
            // invalid_text_representation, numeric_value_out_of_range
            Some("22P02") | Some("22003") => return DatabaseError::Constraint(detail),
            _ => {}
        }
    }
    DatabaseError::Sqlx(err)
}

fn log_query(sql: &str, params: &[Value]) {
    if config::config().database.enable_query_logging {
        tracing::debug!(params = ?params, "SQL: {}", compact(sql));
    }
}

fn warn_if_slow(sql: &str, started: Instant) {
    let elapsed = started.elapsed();
    let threshold = config::config().database.slow_query_threshold_ms;
    if elapsed.as_millis() as u64 > threshold {
        tracing::warn!("Slow query ({} ms > {} ms): {}", elapsed.as_millis(), threshold, compact(sql));
    }
}

fn compact(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn bind_param_query_as<'q, O>(q: PgQueryAs<'q, O>, v: &'q Value) -> PgQueryAs<'q, O>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    match v {
        Value::Null => q.bind(UntypedNull),
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s.as_str()),
        Value::Array(_) | Value::Object(_) => q.bind(v.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compacts_multiline_sql() {
        let sql = "SELECT id,\n       title\n  FROM jobs\n WHERE id = $1";
        assert_eq!(compact(sql), "SELECT id, title FROM jobs WHERE id = $1");
    }

    #[test]
    fn non_database_errors_stay_opaque() {
        assert!(matches!(classify(sqlx::Error::RowNotFound), DatabaseError::Sqlx(_)));
    }
}

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;

use crate::auth::{hash_password, verify_password};
use crate::database::query::{classify, fetch_optional_as};
use crate::database::DatabaseError;
use crate::sql::{build_set_clause, FieldRenames, UpdateData};

const RENAMES: FieldRenames<'static> = &[
    ("firstName", "first_name"),
    ("lastName", "last_name"),
    ("isAdmin", "is_admin"),
];

const COLUMNS: &str = "username, first_name, last_name, email, is_admin";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_admin: bool,
}

/// User plus the ids of the jobs they applied to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: User,
    pub jobs: Vec<i32>,
}

#[derive(FromRow)]
struct UserWithPassword {
    #[sqlx(flatten)]
    user: User,
    password: String,
}

#[derive(FromRow)]
struct Application {
    username: String,
    job_id: i32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// Partial update. Can reset the password or grant admin, so callers must
/// check who is asking before passing one of these through. Every column is
/// NOT NULL, so validation rejects an explicit `null`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UserUpdate {
    #[serde(default, deserialize_with = "super::nullable")]
    pub first_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub last_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub password: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub is_admin: Option<Option<bool>>,
}

impl From<&UserUpdate> for UpdateData {
    fn from(data: &UserUpdate) -> Self {
        let mut fields = UpdateData::new();
        fields
            .push_supplied("firstName", data.first_name.clone())
            .push_supplied("lastName", data.last_name.clone())
            .push_supplied("password", data.password.clone())
            .push_supplied("email", data.email.clone())
            .push_supplied("isAdmin", data.is_admin);
        fields
    }
}

impl User {
    /// Check a username/password pair. Unknown user and wrong password
    /// produce the same error.
    pub async fn authenticate(pool: &PgPool, username: &str, password: &str) -> Result<User, DatabaseError> {
        let found = sqlx::query_as::<_, UserWithPassword>(&format!(
            "SELECT {COLUMNS}, password FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(pool)
        .await
        .map_err(classify)?;

        if let Some(found) = found {
            if verify_password(password, &found.password)? {
                return Ok(found.user);
            }
        }

        tracing::debug!("Failed login for {}", username);
        Err(DatabaseError::Unauthorized("Invalid username/password".to_string()))
    }

    pub async fn register(pool: &PgPool, data: &NewUser) -> Result<User, DatabaseError> {
        let existing = sqlx::query_scalar::<_, String>("SELECT username FROM users WHERE username = $1")
            .bind(&data.username)
            .fetch_optional(pool)
            .await
            .map_err(classify)?;

        if existing.is_some() {
            return Err(DatabaseError::Duplicate(format!("Duplicate username: {}", data.username)));
        }

        let hashed = hash_password(&data.password)?;

        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, password, first_name, last_name, email, is_admin)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        ))
        .bind(&data.username)
        .bind(&hashed)
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(&data.email)
        .bind(data.is_admin)
        .fetch_one(pool)
        .await
        .map_err(classify)?;

        tracing::info!("Registered user {}", user.username);
        Ok(user)
    }

    /// All users ordered by username, each with their applied job ids.
    pub async fn find_all(pool: &PgPool) -> Result<Vec<UserDetail>, DatabaseError> {
        let users = sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users ORDER BY username"))
            .fetch_all(pool)
            .await
            .map_err(classify)?;

        let applications = sqlx::query_as::<_, Application>(
            "SELECT username, job_id FROM applications ORDER BY job_id",
        )
        .fetch_all(pool)
        .await
        .map_err(classify)?;

        let mut jobs_by_user: HashMap<String, Vec<i32>> = HashMap::new();
        for app in applications {
            jobs_by_user.entry(app.username).or_default().push(app.job_id);
        }

        Ok(users
            .into_iter()
            .map(|user| {
                let jobs = jobs_by_user.remove(&user.username).unwrap_or_default();
                UserDetail { user, jobs }
            })
            .collect())
    }

    pub async fn get(pool: &PgPool, username: &str) -> Result<UserDetail, DatabaseError> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE username = $1"))
            .bind(username)
            .fetch_optional(pool)
            .await
            .map_err(classify)?
            .ok_or_else(|| DatabaseError::NotFound(format!("No user: {}", username)))?;

        let jobs = sqlx::query_scalar::<_, i32>(
            "SELECT job_id FROM applications WHERE username = $1 ORDER BY job_id",
        )
        .bind(username)
        .fetch_all(pool)
        .await
        .map_err(classify)?;

        Ok(UserDetail { user, jobs })
    }

    /// Partial update. A supplied password is hashed before it is stored.
    pub async fn update(pool: &PgPool, username: &str, data: &UserUpdate) -> Result<User, DatabaseError> {
        let mut fields = UpdateData::from(data);
        if let Some(Some(password)) = &data.password {
            fields.replace("password", hash_password(password)?);
        }

        let set = build_set_clause(&fields, RENAMES)?;
        let username_idx = set.params.len() + 1;
        let sql = format!(
            "UPDATE users SET {} WHERE username = ${} RETURNING {COLUMNS}",
            set.query, username_idx
        );

        let mut params = set.params;
        params.push(username.into());

        fetch_optional_as::<User>(pool, &sql, &params)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("No user: {}", username)))
    }

    pub async fn remove(pool: &PgPool, username: &str) -> Result<(), DatabaseError> {
        sqlx::query_scalar::<_, String>("DELETE FROM users WHERE username = $1 RETURNING username")
            .bind(username)
            .fetch_optional(pool)
            .await
            .map_err(classify)?
            .ok_or_else(|| DatabaseError::NotFound(format!("No user: {}", username)))?;

        tracing::info!("Removed user {}", username);
        Ok(())
    }

    /// Record an application. Both the user and the job must exist.
    pub async fn apply_to_job(pool: &PgPool, username: &str, job_id: i32) -> Result<i32, DatabaseError> {
        let user = sqlx::query_scalar::<_, String>("SELECT username FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(pool)
            .await
            .map_err(classify)?;
        if user.is_none() {
            return Err(DatabaseError::NotFound(format!("No user: {}", username)));
        }

        let job = sqlx::query_scalar::<_, i32>("SELECT id FROM jobs WHERE id = $1")
            .bind(job_id)
            .fetch_optional(pool)
            .await
            .map_err(classify)?;
        if job.is_none() {
            return Err(DatabaseError::NotFound(format!("No job: {}", job_id)));
        }

        let applied = sqlx::query_scalar::<_, i32>(
            "INSERT INTO applications (username, job_id) VALUES ($1, $2) RETURNING job_id",
        )
        .bind(username)
        .bind(job_id)
        .fetch_one(pool)
        .await
        .map_err(|e| match classify(e) {
            DatabaseError::Duplicate(_) => DatabaseError::Duplicate(format!("{} already applied to job {}", username, job_id)),
            other => other,
        })?;

        tracing::info!("{} applied to job {}", username, applied);
        Ok(applied)
    }
}

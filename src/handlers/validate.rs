use async_trait::async_trait;
use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

use crate::error::ApiError;
use crate::models::{CompanyUpdate, JobUpdate, NewCompany, NewJob, NewUser, UserUpdate};

/// Request-body checks that run before anything touches the database.
pub trait Validate {
    fn validate(&self) -> Result<(), ApiError>;
}

/// `Json<T>` that reports parse failures and `Validate` failures as `ApiError`.
#[derive(Debug)]
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
        value.validate()?;
        Ok(ValidJson(value))
    }
}

#[derive(Debug, Default)]
struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    fn check(&mut self, ok: bool, field: &str, message: &str) -> &mut Self {
        if !ok {
            self.0.entry(field.to_string()).or_insert_with(|| message.to_string());
        }
        self
    }

    fn length(&mut self, value: Option<&str>, field: &str, min: usize, max: usize) -> &mut Self {
        if let Some(value) = value {
            let len = value.chars().count();
            self.check(
                (min..=max).contains(&len),
                field,
                &format!("must be between {} and {} characters", min, max),
            );
        }
        self
    }

    /// Reject an explicit `null` for a column that cannot be cleared.
    fn not_null<T>(&mut self, value: &Option<Option<T>>, field: &str) -> &mut Self {
        self.check(!matches!(value, Some(None)), field, "cannot be null")
    }

    fn finish(&mut self, message: &str) -> Result<(), ApiError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation_error(message, std::mem::take(&mut self.0)))
        }
    }
}

/// The value of a patch field that was supplied and not `null`.
fn supplied<T>(value: &Option<Option<T>>) -> Option<&T> {
    value.as_ref().and_then(Option::as_ref)
}

fn is_http_url(value: &str) -> bool {
    matches!(url::Url::parse(value), Ok(url) if url.scheme() == "http" || url.scheme() == "https")
}

fn is_email(value: &str) -> bool {
    value.find('@').map_or(false, |at| at > 0 && at < value.len() - 1)
}

impl Validate for NewCompany {
    fn validate(&self) -> Result<(), ApiError> {
        FieldErrors::default()
            .length(Some(self.handle.as_str()), "handle", 1, 25)
            .length(Some(self.name.as_str()), "name", 1, 255)
            .check(self.num_employees.map_or(true, |n| n >= 0), "numEmployees", "must be >= 0")
            .check(self.logo_url.as_deref().map_or(true, is_http_url), "logoUrl", "must be an http(s) URL")
            .finish("Invalid company")
    }
}

impl Validate for CompanyUpdate {
    fn validate(&self) -> Result<(), ApiError> {
        FieldErrors::default()
            .not_null(&self.name, "name")
            .not_null(&self.description, "description")
            .length(supplied(&self.name).map(String::as_str), "name", 1, 255)
            .check(supplied(&self.num_employees).map_or(true, |n| *n >= 0), "numEmployees", "must be >= 0")
            .check(
                supplied(&self.logo_url).map_or(true, |url| is_http_url(url)),
                "logoUrl",
                "must be an http(s) URL",
            )
            .finish("Invalid company update")
    }
}

impl Validate for NewJob {
    fn validate(&self) -> Result<(), ApiError> {
        FieldErrors::default()
            .length(Some(self.title.as_str()), "title", 1, 255)
            .check(self.salary.map_or(true, |s| s >= 0), "salary", "must be >= 0")
            .check(self.equity.map_or(true, |e| (0.0..=1.0).contains(&e)), "equity", "must be between 0 and 1")
            .length(Some(self.company_handle.as_str()), "companyHandle", 1, 25)
            .finish("Invalid job")
    }
}

impl Validate for JobUpdate {
    fn validate(&self) -> Result<(), ApiError> {
        FieldErrors::default()
            .not_null(&self.title, "title")
            .length(supplied(&self.title).map(String::as_str), "title", 1, 255)
            .check(supplied(&self.salary).map_or(true, |s| *s >= 0), "salary", "must be >= 0")
            .check(
                supplied(&self.equity).map_or(true, |e| (0.0..=1.0).contains(e)),
                "equity",
                "must be between 0 and 1",
            )
            .finish("Invalid job update")
    }
}

impl Validate for NewUser {
    fn validate(&self) -> Result<(), ApiError> {
        FieldErrors::default()
            .length(Some(self.username.as_str()), "username", 1, 25)
            .length(Some(self.password.as_str()), "password", 5, 20)
            .length(Some(self.first_name.as_str()), "firstName", 1, 25)
            .length(Some(self.last_name.as_str()), "lastName", 1, 25)
            .length(Some(self.email.as_str()), "email", 6, 60)
            .check(is_email(&self.email), "email", "must be an email address")
            .finish("Invalid user")
    }
}

impl Validate for UserUpdate {
    fn validate(&self) -> Result<(), ApiError> {
        FieldErrors::default()
            .not_null(&self.first_name, "firstName")
            .not_null(&self.last_name, "lastName")
            .not_null(&self.password, "password")
            .not_null(&self.email, "email")
            .not_null(&self.is_admin, "isAdmin")
            .length(supplied(&self.first_name).map(String::as_str), "firstName", 1, 25)
            .length(supplied(&self.last_name).map(String::as_str), "lastName", 1, 25)
            .length(supplied(&self.password).map(String::as_str), "password", 5, 20)
            .length(supplied(&self.email).map(String::as_str), "email", 6, 60)
            .check(supplied(&self.email).map_or(true, |e| is_email(e)), "email", "must be an email address")
            .finish("Invalid user update")
    }
}

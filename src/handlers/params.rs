use std::collections::HashMap;

use crate::error::ApiError;

pub type QueryParams = HashMap<String, String>;

/// Reject any query key outside `allowed`.
pub fn reject_unknown(params: &QueryParams, allowed: &[&str]) -> Result<(), ApiError> {
    let mut unknown: Vec<&str> = params
        .keys()
        .map(String::as_str)
        .filter(|k| !allowed.contains(k))
        .collect();

    if unknown.is_empty() {
        return Ok(());
    }
    unknown.sort_unstable();
    Err(ApiError::bad_request(format!(
        "Unknown filter: {}. Allowed: {}",
        unknown.join(", "),
        allowed.join(", ")
    )))
}

/// Non-empty text value, or `None` when absent or blank.
pub fn text(params: &QueryParams, key: &str) -> Option<String> {
    params.get(key).map(|v| v.trim()).filter(|v| !v.is_empty()).map(str::to_string)
}

pub fn non_negative(params: &QueryParams, key: &str) -> Result<Option<i64>, ApiError> {
    match params.get(key).map(|v| v.trim()).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => match raw.parse::<i64>() {
            Ok(n) if n >= 0 => Ok(Some(n)),
            _ => Err(ApiError::bad_request(format!("{} must be an integer >= 0", key))),
        },
    }
}

/// `true` / `false`, case-insensitive.
pub fn boolean(params: &QueryParams, key: &str) -> Result<Option<bool>, ApiError> {
    match params.get(key).map(|v| v.trim().to_lowercase()) {
        None => Ok(None),
        Some(v) if v == "true" => Ok(Some(true)),
        Some(v) if v == "false" => Ok(Some(false)),
        Some(_) => Err(ApiError::bad_request(format!("{} must be true or false", key))),
    }
}

pub fn job_id(raw: &str) -> Result<i32, ApiError> {
    raw.parse::<i32>()
        .map_err(|_| ApiError::bad_request(format!("Invalid job id: {}", raw)))
}

use super::error::SqlError;
use super::types::{FieldRenames, SqlResult, UpdateData};

/// Build the `SET` list for a partial update.
///
/// `{firstName: "Aliya", age: 32}` with `[("firstName", "first_name")]`
/// becomes `"first_name"=$1, "age"=$2` with params `["Aliya", 32]`.
/// Columns without a rename keep the field name. Nothing is deduplicated:
/// two fields renamed to one column produce two assignments.
///
/// Callers append their own key placeholder at `$<params.len() + 1>`.
pub fn build_set_clause(data: &UpdateData, renames: FieldRenames<'_>) -> Result<SqlResult, SqlError> {
    if data.is_empty() {
        return Err(SqlError::InvalidInput("No data".to_string()));
    }

    let mut cols = Vec::with_capacity(data.len());
    let mut params = Vec::with_capacity(data.len());

    for (idx, (field, value)) in data.iter().enumerate() {
        let column = renames
            .iter()
            .find(|(from, _)| *from == field)
            .map(|(_, to)| *to)
            .unwrap_or(field);
        cols.push(format!("{}=${}", quote_identifier(column), idx + 1));
        params.push(value.clone());
    }

    Ok(SqlResult { query: cols.join(", "), params })
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

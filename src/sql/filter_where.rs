use serde_json::Value;

use super::types::SqlResult;

/// A typed set of optional list filters that knows how to render itself.
///
/// Implementors push their criteria into a [`FilterWhere`] in a fixed order;
/// that order decides placeholder numbering.
pub trait FilterCriteria {
    fn apply(&self, filter: &mut FilterWhere);
}

/// Render `criteria` as `WHERE a AND b ...` plus bound values.
/// No criteria present yields an empty fragment and no params.
pub fn build_filter_clause<C: FilterCriteria + ?Sized>(criteria: &C) -> SqlResult {
    let mut filter = FilterWhere::new();
    criteria.apply(&mut filter);
    filter.finish()
}

/// Accumulates comparisons and their parameters for one `WHERE` clause.
#[derive(Debug, Default)]
pub struct FilterWhere {
    conditions: Vec<String>,
    param_values: Vec<Value>,
}

impl FilterWhere {
    pub fn new() -> Self {
        Self::default()
    }

    /// Case-insensitive substring match, binds `%text%`.
    pub fn contains(&mut self, column: &str, text: Option<&str>) -> &mut Self {
        if let Some(text) = text {
            let p = self.param(Value::String(format!("%{}%", text)));
            self.conditions.push(format!("{} ILIKE {}", column, p));
        }
        self
    }

    pub fn at_least(&mut self, column: &str, min: Option<impl Into<Value>>) -> &mut Self {
        if let Some(min) = min {
            let p = self.param(min.into());
            self.conditions.push(format!("{} >= {}", column, p));
        }
        self
    }

    pub fn at_most(&mut self, column: &str, max: Option<impl Into<Value>>) -> &mut Self {
        if let Some(max) = max {
            let p = self.param(max.into());
            self.conditions.push(format!("{} <= {}", column, p));
        }
        self
    }

    /// Adds a fixed, parameterless comparison when `flag` is `Some(true)`.
    pub fn flag(&mut self, condition: &str, flag: Option<bool>) -> &mut Self {
        if flag == Some(true) {
            self.conditions.push(condition.to_string());
        }
        self
    }

    pub fn finish(self) -> SqlResult {
        if self.conditions.is_empty() {
            return SqlResult::default();
        }
        SqlResult {
            query: format!("WHERE {}", self.conditions.join(" AND ")),
            params: self.param_values,
        }
    }

    fn param(&mut self, value: Value) -> String {
        self.param_values.push(value);
        format!("${}", self.param_values.len())
    }
}

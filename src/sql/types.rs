use serde_json::Value;

/// SQL fragment plus the values bound to its `$n` placeholders, in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<Value>,
}

impl SqlResult {
    pub fn is_empty(&self) -> bool {
        self.query.is_empty()
    }
}

/// External field name -> column name pairs, e.g. `("numEmployees", "num_employees")`.
pub type FieldRenames<'a> = &'a [(&'a str, &'a str)];

/// Ordered `(field, value)` pairs for a partial update.
///
/// Placeholder numbering follows the order the pairs were pushed in. Model
/// update structs push their fields in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateData {
    fields: Vec<(String, Value)>,
}

impl UpdateData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.fields.push((field.into(), value.into()));
        self
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(field, value);
        self
    }

    /// Push `field` only if it was supplied. `Some(None)` for a nullable
    /// column arrives here as `Some(Value::Null)` and is kept.
    pub fn push_supplied<T: Into<Value>>(&mut self, field: &str, value: Option<T>) -> &mut Self {
        if let Some(value) = value {
            self.push(field, value);
        }
        self
    }

    /// Replace the value of an existing field in place, keeping its position.
    pub fn replace(&mut self, field: &str, value: impl Into<Value>) -> bool {
        match self.fields.iter_mut().find(|(f, _)| f == field) {
            Some(entry) => {
                entry.1 = value.into();
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(f, v)| (f.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for UpdateData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self { fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}

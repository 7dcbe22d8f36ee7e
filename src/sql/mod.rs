//! Parameterized SQL fragments for partial updates and list filters.

pub mod error;
pub mod filter_where;
pub mod partial_update;
pub mod types;

pub use error::SqlError;
pub use filter_where::{build_filter_clause, FilterCriteria, FilterWhere};
pub use partial_update::build_set_clause;
pub use types::{FieldRenames, SqlResult, UpdateData};

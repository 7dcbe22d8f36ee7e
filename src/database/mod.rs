pub mod manager;
pub mod query;

pub use manager::{DatabaseError, DatabaseManager};

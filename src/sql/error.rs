use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SqlError {
    /// Raised when an update payload carries no fields to set.
    #[error("{0}")]
    InvalidInput(String),
}

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Graph store error: {0}")]
    Store(#[from] neo4rs::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Malformed result row: {0}")]
    MalformedRow(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// True when the error indicates a missing counterpart node rather than
    /// a store or caller fault.
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }
}

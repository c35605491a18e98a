use thiserror::Error;

/// Observer system errors with structured error types
#[derive(Debug, Error, Clone)]
pub enum ObserverError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("System error: {0}")]
    SystemError(String),

    #[error("Timeout error: {0}")]
    TimeoutError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Observer recursion error: depth {depth} exceeds maximum {max_depth}")]
    RecursionError { depth: usize, max_depth: usize },
}

impl From<crate::database::manager::DatabaseError> for ObserverError {
    fn from(error: crate::database::manager::DatabaseError) -> Self {
        match error {
            crate::database::manager::DatabaseError::NotFound(what) => ObserverError::NotFound(what),
            other => ObserverError::DatabaseError(other.to_string()),
        }
    }
}

impl From<crate::tasks::TaskError> for ObserverError {
    fn from(error: crate::tasks::TaskError) -> Self {
        ObserverError::SystemError(error.to_string())
    }
}

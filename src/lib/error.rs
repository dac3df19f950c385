use thiserror::Error;

/// Failures raised at the connector boundary.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Unsupported database driver: {0}")]
    UnsupportedDriver(String),

    #[error("Invalid connection parameters: {0}")]
    InvalidParams(String),

    #[error("Database error: {0}")]
    Driver(#[from] sqlx::Error),
}

/// A field that broke a domain rule. Expected and recoverable.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub origin: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(origin: &'static str, message: impl Into<String>) -> Self {
        ValidationError {
            origin,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl Error {
    /// Name of the validator that produced the error, if any.
    pub fn origin(&self) -> Option<&'static str> {
        match self {
            Error::Validation(e) => Some(e.origin),
            Error::Database(_) => None,
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        Error::Database(DatabaseError::Driver(e))
    }
}

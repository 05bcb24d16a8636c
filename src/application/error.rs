use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("resource not found")]
    NotFound,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("payload too large")]
    PayloadTooLarge,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("database error: {0}")]
    DatabaseError(String),

    #[error("processing error: {0}")]
    ProcessingError(String),

    #[error("internal error: {0}")]
    InternalError(String),
}

impl From<std::io::Error> for ApplicationError {
    fn from(error: std::io::Error) -> Self {
        ApplicationError::InternalError(format!("I/O error: {}", error))
    }
}

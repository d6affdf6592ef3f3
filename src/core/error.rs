use thiserror::Error;

/// Crate-wide error type. Configuration failures are fatal at startup;
/// the rest are mapped to HTTP responses by [`crate::web::WebError`].
#[derive(Error, Debug)]
pub enum DbError {
    #[error("this node is a {0}, {1}")]
    RoleViolation(&'static str, &'static str),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, DbError>;

impl<T> From<std::sync::PoisonError<T>> for DbError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::Internal(format!("store lock poisoned: {err}"))
    }
}

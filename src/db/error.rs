use thiserror::Error;

// DbError is the lowest level error type, wrapping errors from the database layer. It does not wrap
// any higher level errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Record not found
    #[error("not found")]
    NotFound,

    /// Unique constraint violation
    #[error("unique violation")]
    UniqueViolation,

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for DbError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => DbError::NotFound,
            sqlx::Error::Database(ref db) if db.is_unique_violation() => DbError::UniqueViolation,
            other => DbError::Sqlx(other),
        }
    }
}

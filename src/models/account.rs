use crate::db::DbResult;
use crate::error::UsernameError;
use crate::models::types::UserId;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

/// Limit in bytes of UTF-8, not characters.
pub const MAX_USERNAME_LEN: usize = 20;

#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID
    pub id: UserId,
    /// Username, stored case-folded (distinct)
    pub username: String,
    /// Hashed password (argon2 PHC string)
    pub password_hash: String,
    /// Account creation timestamp
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl User {
    pub fn try_from_row(row: &SqliteRow) -> DbResult<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            password_hash: row.try_get("password_hash")?,
            created_at: row.try_get("created_at")?,
        })
    }

    /// Checks a username as typed by the user, before case folding.
    pub fn validate_username(s: &str) -> Result<(), UsernameError> {
        if s.is_empty() {
            return Err(UsernameError::Empty);
        }
        if s.len() > MAX_USERNAME_LEN {
            return Err(UsernameError::TooLong);
        }
        if s.trim() != s {
            return Err(UsernameError::Whitespace);
        }
        Ok(())
    }

    /// Usernames are unique regardless of case.
    pub fn fold_username(s: &str) -> String {
        s.to_lowercase()
    }
}

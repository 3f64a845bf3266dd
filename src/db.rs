use crate::db::error::DbError;
use sqlx::SqlitePool;
use sqlx::sqlite::SqliteRow;

// keep public API surface by re-exporting submodules
mod pool;
mod schema;

pub mod error;
pub mod repo;

pub type DbResult<T> = Result<T, DbError>;

/// File name of the SQLite store inside the data directory.
pub const DB_FILE_NAME: &str = "db.sqlite";

#[derive(Clone, Debug)]
pub struct Db {
    pub(crate) pool: SqlitePool,
}

impl Db {
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

pub(crate) fn map_row<T, F>(row: &SqliteRow, f: F, ctx: &str) -> DbResult<T>
where
    F: FnOnce(&SqliteRow) -> DbResult<T>,
{
    f(row).inspect_err(|e| tracing::error!(error = %e, context = %ctx, "row mapping failed"))
}

pub(crate) fn map_row_opt<T, F>(row_opt: Option<SqliteRow>, f: F, ctx: &str) -> DbResult<Option<T>>
where
    F: FnOnce(&SqliteRow) -> DbResult<T>,
{
    match row_opt {
        Some(row) => map_row(&row, f, ctx).map(Some),
        None => Ok(None),
    }
}

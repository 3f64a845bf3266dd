use super::{DB_FILE_NAME, Db, DbResult};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::Path;

impl Db {
    /// Opens (creating if needed) the store inside `data_dir`.
    pub async fn open(data_dir: &Path) -> DbResult<Self> {
        let path = data_dir.join(DB_FILE_NAME);
        tracing::info!(path = %path.display(), "opening database");

        let opts = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new().max_connections(8).connect_with(opts).await?;

        Ok(Self { pool })
    }

    /// Private in-memory store, for tests. A single connection that never idles out, so every
    /// query sees the same database.
    #[cfg(test)]
    pub(crate) async fn in_memory() -> DbResult<Self> {
        let opts = "sqlite::memory:".parse::<SqliteConnectOptions>()?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opts)
            .await?;

        Ok(Self { pool })
    }
}

use super::{Db, DbResult};

const SCHEMA: &str = include_str!("schema.sql");

impl Db {
    /// Run the embedded schema (idempotent).
    pub async fn init(&self) -> DbResult<()> {
        tracing::info!("initializing database schema");
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;

        Ok(())
    }
}

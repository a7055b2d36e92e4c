use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;

use crate::error::StoreError;
use crate::migrations::MigrationManager;

/// Open (creating if absent) a SQLite database at `path`, in WAL mode with a
/// 5s busy timeout, and apply any pending migrations.
pub async fn connect(path: &str) -> Result<SqlitePool, StoreError> {
    let options = SqliteConnectOptions::from_str(path)
        .map_err(|e| StoreError::Anyhow(e.into()))?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new().max_connections(8).connect_with(options).await?;

    MigrationManager::new(pool.clone())
        .apply_migrations()
        .await
        .map_err(StoreError::Database)?;

    Ok(pool)
}

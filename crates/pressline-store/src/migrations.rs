//! Hand-rolled forward/backward schema migrations, applied in order and
//! tracked in a `schema_version` table. sqlx's own `migrate!` macro embeds
//! migrations at compile time from a fixed directory; this pipeline needs
//! runtime-introspectable rollback (`rollback_to`) so migrations are plain
//! data instead.

use sqlx::SqlitePool;
use tracing::{error, info};

pub const CURRENT_VERSION: i64 = 1;

#[derive(Debug, Clone)]
pub struct Migration {
    pub version: i64,
    pub description: &'static str,
    pub up_sql: &'static str,
    pub down_sql: &'static str,
}

pub fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema with runs, items, and http_cache tables",
        up_sql: r#"
CREATE TABLE IF NOT EXISTS runs (
    run_id TEXT PRIMARY KEY,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    success INTEGER,
    error_summary TEXT
);
CREATE INDEX IF NOT EXISTS idx_runs_started_at ON runs(started_at);
CREATE INDEX IF NOT EXISTS idx_runs_success ON runs(success);

CREATE TABLE IF NOT EXISTS http_cache (
    source_id TEXT PRIMARY KEY,
    etag TEXT,
    last_modified TEXT,
    last_status INTEGER,
    last_fetch_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS items (
    url TEXT PRIMARY KEY,
    source_id TEXT NOT NULL,
    tier INTEGER NOT NULL,
    kind TEXT NOT NULL,
    title TEXT NOT NULL,
    published_at TEXT,
    date_confidence TEXT NOT NULL,
    content_hash TEXT NOT NULL,
    raw_json TEXT NOT NULL,
    first_seen_at TEXT NOT NULL,
    last_seen_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_items_source_id ON items(source_id);
CREATE INDEX IF NOT EXISTS idx_items_first_seen_at ON items(first_seen_at);
CREATE INDEX IF NOT EXISTS idx_items_last_seen_at ON items(last_seen_at);
CREATE INDEX IF NOT EXISTS idx_items_content_hash ON items(content_hash);
"#,
        down_sql: r#"
DROP INDEX IF EXISTS idx_items_content_hash;
DROP INDEX IF EXISTS idx_items_last_seen_at;
DROP INDEX IF EXISTS idx_items_first_seen_at;
DROP INDEX IF EXISTS idx_items_source_id;
DROP TABLE IF EXISTS items;
DROP TABLE IF EXISTS http_cache;
DROP INDEX IF EXISTS idx_runs_success;
DROP INDEX IF EXISTS idx_runs_started_at;
DROP TABLE IF EXISTS runs;
"#,
    }]
}

fn migrations_to_apply(current_version: i64) -> Vec<Migration> {
    all_migrations().into_iter().filter(|m| m.version > current_version).collect()
}

pub struct MigrationManager {
    pool: SqlitePool,
}

impl MigrationManager {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn ensure_version_table(&self) -> sqlx::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL,
                description TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn current_version(&self) -> sqlx::Result<i64> {
        self.ensure_version_table().await?;
        let version: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
            .fetch_one(&self.pool)
            .await?;
        Ok(version.unwrap_or(0))
    }

    /// Apply all pending migrations in order, each inside its own
    /// transaction. Returns the versions applied.
    pub async fn apply_migrations(&self) -> sqlx::Result<Vec<i64>> {
        let current = self.current_version().await?;
        let pending = migrations_to_apply(current);

        if pending.is_empty() {
            info!(current_version = current, "no migrations pending");
            return Ok(Vec::new());
        }

        let mut applied = Vec::new();
        for migration in pending {
            info!(version = migration.version, description = migration.description, "applying migration");

            let mut tx = self.pool.begin().await?;
            let result: Result<(), sqlx::Error> = async {
                sqlx::raw_sql(migration.up_sql).execute(&mut *tx).await?;
                sqlx::query(
                    "INSERT INTO schema_version (version, applied_at, description) VALUES (?, ?, ?)",
                )
                .bind(migration.version)
                .bind(chrono::Utc::now().to_rfc3339())
                .bind(migration.description)
                .execute(&mut *tx)
                .await?;
                Ok(())
            }
            .await;

            match result {
                Ok(()) => {
                    tx.commit().await?;
                    applied.push(migration.version);
                    info!(version = migration.version, "migration applied");
                }
                Err(e) => {
                    error!(version = migration.version, error = %e, "migration failed");
                    tx.rollback().await?;
                    return Err(e);
                }
            }
        }

        Ok(applied)
    }

    /// Rollback to `target_version`, executing down-SQL for every version
    /// above it in descending order.
    pub async fn rollback_to(&self, target_version: i64) -> anyhow::Result<Vec<i64>> {
        anyhow::ensure!(target_version >= 0, "invalid target version: {target_version}");

        let mut rolled_back = Vec::new();
        loop {
            let current = self.current_version().await?;
            if current <= target_version {
                break;
            }
            let Some(migration) = all_migrations().into_iter().find(|m| m.version == current) else {
                break;
            };

            info!(version = migration.version, description = migration.description, "rolling back migration");

            let mut tx = self.pool.begin().await?;
            let result: Result<(), sqlx::Error> = async {
                sqlx::raw_sql(migration.down_sql).execute(&mut *tx).await?;
                sqlx::query("DELETE FROM schema_version WHERE version = ?")
                    .bind(migration.version)
                    .execute(&mut *tx)
                    .await?;
                Ok(())
            }
            .await;

            match result {
                Ok(()) => {
                    tx.commit().await?;
                    rolled_back.push(migration.version);
                }
                Err(e) => {
                    error!(version = migration.version, error = %e, "rollback failed");
                    tx.rollback().await?;
                    return Err(e.into());
                }
            }
        }

        Ok(rolled_back)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn migrations_apply_idempotently() {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        let manager = MigrationManager::new(pool);

        let applied = manager.apply_migrations().await.unwrap();
        assert_eq!(applied, vec![1]);
        assert_eq!(manager.current_version().await.unwrap(), 1);

        let reapplied = manager.apply_migrations().await.unwrap();
        assert!(reapplied.is_empty());
    }

    #[tokio::test]
    async fn rollback_reverses_schema() {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        let manager = MigrationManager::new(pool);
        manager.apply_migrations().await.unwrap();

        let rolled_back = manager.rollback_to(0).await.unwrap();
        assert_eq!(rolled_back, vec![1]);
        assert_eq!(manager.current_version().await.unwrap(), 0);
    }
}

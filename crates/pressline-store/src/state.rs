use chrono::{DateTime, Utc};
use pressline_common::{DateConfidence, HttpCacheEntry, Item, RunRecord};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::StoreError;

#[derive(Debug, Clone, sqlx::FromRow)]
struct ItemRow {
    url: String,
    source_id: String,
    tier: i64,
    kind: String,
    title: String,
    published_at: Option<String>,
    date_confidence: String,
    content_hash: String,
    raw_json: String,
    first_seen_at: String,
    last_seen_at: String,
}

impl TryFrom<ItemRow> for Item {
    type Error = StoreError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        let parse_ts = |s: &str| -> Result<DateTime<Utc>, StoreError> {
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| StoreError::Anyhow(anyhow::anyhow!("invalid timestamp {s}: {e}")))
        };
        Ok(Item {
            url: row.url,
            source_id: row.source_id,
            tier: row.tier as u8,
            kind: row.kind.parse().map_err(|e: String| StoreError::Anyhow(anyhow::anyhow!(e)))?,
            title: row.title,
            published_at: row.published_at.as_deref().map(parse_ts).transpose()?,
            date_confidence: match row.date_confidence.as_str() {
                "HIGH" => DateConfidence::High,
                "MEDIUM" => DateConfidence::Medium,
                _ => DateConfidence::Low,
            },
            content_hash: row.content_hash,
            raw_json: row.raw_json,
            first_seen_at: parse_ts(&row.first_seen_at)?,
            last_seen_at: parse_ts(&row.last_seen_at)?,
        })
    }
}

fn date_confidence_str(c: DateConfidence) -> &'static str {
    match c {
        DateConfidence::High => "HIGH",
        DateConfidence::Medium => "MEDIUM",
        DateConfidence::Low => "LOW",
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct HttpCacheRow {
    source_id: String,
    etag: Option<String>,
    last_modified: Option<String>,
    last_status: Option<i64>,
    last_fetch_at: String,
}

impl TryFrom<HttpCacheRow> for HttpCacheEntry {
    type Error = StoreError;

    fn try_from(row: HttpCacheRow) -> Result<Self, Self::Error> {
        Ok(HttpCacheEntry {
            source_id: row.source_id,
            etag: row.etag,
            last_modified: row.last_modified,
            last_status: row.last_status,
            last_fetch_at: DateTime::parse_from_rfc3339(&row.last_fetch_at)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| StoreError::Anyhow(anyhow::anyhow!("invalid timestamp: {e}")))?,
        })
    }
}

/// How many items an `upsert_items_for_source` call inserted versus updated.
/// Items whose `content_hash` was unchanged are counted in neither.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertCounts {
    pub inserted: usize,
    pub updated: usize,
}

/// Persistence for runs, items, and the HTTP conditional-request cache.
#[derive(Clone)]
pub struct StateStore {
    pool: SqlitePool,
}

impl StateStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn begin_run(&self, run_id: Uuid, started_at: DateTime<Utc>) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO runs (run_id, started_at, finished_at, success, error_summary) VALUES (?, ?, NULL, NULL, NULL)")
            .bind(run_id.to_string())
            .bind(started_at.to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn finish_run(
        &self,
        run_id: Uuid,
        finished_at: DateTime<Utc>,
        success: bool,
        error_summary: Option<&str>,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE runs SET finished_at = ?, success = ?, error_summary = ? WHERE run_id = ?")
            .bind(finished_at.to_rfc3339())
            .bind(success)
            .bind(error_summary)
            .bind(run_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn get_run(&self, run_id: Uuid) -> Result<Option<RunRecord>, StoreError> {
        let row = sqlx::query_as::<_, (String, String, Option<String>, Option<bool>, Option<String>)>(
            "SELECT run_id, started_at, finished_at, success, error_summary FROM runs WHERE run_id = ?",
        )
        .bind(run_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        let Some((run_id_str, started_at, finished_at, success, error_summary)) = row else {
            return Ok(None);
        };

        Ok(Some(RunRecord {
            run_id: Uuid::parse_str(&run_id_str).map_err(|e| StoreError::Anyhow(e.into()))?,
            started_at: DateTime::parse_from_rfc3339(&started_at)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| StoreError::Anyhow(anyhow::anyhow!("invalid timestamp: {e}")))?,
            finished_at: finished_at
                .as_deref()
                .map(|s| {
                    DateTime::parse_from_rfc3339(s)
                        .map(|dt| dt.with_timezone(&Utc))
                        .map_err(|e| StoreError::Anyhow(anyhow::anyhow!("invalid timestamp: {e}")))
                })
                .transpose()?,
            success,
            error_summary,
        }))
    }

    /// Upsert one item. Preserves `first_seen_at` across re-ingestion of the
    /// same canonical URL; updates `content_hash`, `title`, `raw_json`, and
    /// `last_seen_at` unconditionally.
    async fn upsert_item_tx(tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>, item: &Item) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO items (url, source_id, tier, kind, title, published_at, date_confidence,
                                content_hash, raw_json, first_seen_at, last_seen_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(url) DO UPDATE SET
                source_id = excluded.source_id,
                tier = excluded.tier,
                kind = excluded.kind,
                title = excluded.title,
                published_at = excluded.published_at,
                date_confidence = excluded.date_confidence,
                content_hash = excluded.content_hash,
                raw_json = excluded.raw_json,
                last_seen_at = excluded.last_seen_at
            "#,
        )
        .bind(&item.url)
        .bind(&item.source_id)
        .bind(item.tier as i64)
        .bind(item.kind.to_string())
        .bind(&item.title)
        .bind(item.published_at.map(|t| t.to_rfc3339()))
        .bind(date_confidence_str(item.date_confidence))
        .bind(&item.content_hash)
        .bind(&item.raw_json)
        .bind(item.first_seen_at.to_rfc3339())
        .bind(item.last_seen_at.to_rfc3339())
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Upsert every item collected for one source inside a single
    /// transaction. A failure rolls back that source's batch only; it never
    /// touches items already committed for other sources. Each item is
    /// classified against its pre-upsert `content_hash` so a run can tell
    /// a brand-new item from one whose content changed from one that
    /// re-ingested unchanged (the latter touches only `last_seen_at` and
    /// counts as neither).
    pub async fn upsert_items_for_source(&self, items: &[Item]) -> Result<UpsertCounts, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut counts = UpsertCounts::default();
        for item in items {
            let existing_hash: Option<String> = sqlx::query_scalar("SELECT content_hash FROM items WHERE url = ?")
                .bind(&item.url)
                .fetch_optional(&mut *tx)
                .await?;
            match existing_hash {
                None => counts.inserted += 1,
                Some(hash) if hash != item.content_hash => counts.updated += 1,
                Some(_) => {}
            }
            Self::upsert_item_tx(&mut tx, item).await?;
        }
        tx.commit().await?;
        Ok(counts)
    }

    /// Most recent runs by start time, newest first — feeds the status page.
    pub async fn recent_runs(&self, limit: i64) -> Result<Vec<RunRecord>, StoreError> {
        let rows = sqlx::query_as::<_, (String, String, Option<String>, Option<bool>, Option<String>)>(
            "SELECT run_id, started_at, finished_at, success, error_summary FROM runs ORDER BY started_at DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(run_id, started_at, finished_at, success, error_summary)| {
                Ok(RunRecord {
                    run_id: Uuid::parse_str(&run_id).map_err(|e| StoreError::Anyhow(e.into()))?,
                    started_at: DateTime::parse_from_rfc3339(&started_at)
                        .map(|dt| dt.with_timezone(&Utc))
                        .map_err(|e| StoreError::Anyhow(anyhow::anyhow!("invalid timestamp: {e}")))?,
                    finished_at: finished_at
                        .as_deref()
                        .map(|s| {
                            DateTime::parse_from_rfc3339(s)
                                .map(|dt| dt.with_timezone(&Utc))
                                .map_err(|e| StoreError::Anyhow(anyhow::anyhow!("invalid timestamp: {e}")))
                        })
                        .transpose()?,
                    success,
                    error_summary,
                })
            })
            .collect()
    }

    pub async fn get_item(&self, url: &str) -> Result<Option<Item>, StoreError> {
        let row = sqlx::query_as::<_, ItemRow>("SELECT * FROM items WHERE url = ?")
            .bind(url)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Item::try_from).transpose()
    }

    /// All items first seen strictly after `since` — the delta set for a
    /// run that's comparing against the last successful run.
    pub async fn items_first_seen_after(&self, since: DateTime<Utc>) -> Result<Vec<Item>, StoreError> {
        let rows = sqlx::query_as::<_, ItemRow>("SELECT * FROM items WHERE first_seen_at > ? ORDER BY first_seen_at ASC")
            .bind(since.to_rfc3339())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Item::try_from).collect()
    }

    pub async fn items_by_source(&self, source_id: &str) -> Result<Vec<Item>, StoreError> {
        let rows = sqlx::query_as::<_, ItemRow>("SELECT * FROM items WHERE source_id = ? ORDER BY first_seen_at ASC")
            .bind(source_id)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Item::try_from).collect()
    }
}

#[async_trait::async_trait]
impl pressline_fetch::HttpCacheStore for StateStore {
    async fn get_http_cache(&self, source_id: &str) -> anyhow::Result<Option<HttpCacheEntry>> {
        let row = sqlx::query_as::<_, HttpCacheRow>("SELECT * FROM http_cache WHERE source_id = ?")
            .bind(source_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(HttpCacheEntry::try_from).transpose().map_err(Into::into)
    }

    async fn upsert_http_cache(&self, entry: HttpCacheEntry) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO http_cache (source_id, etag, last_modified, last_status, last_fetch_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(source_id) DO UPDATE SET
                etag = excluded.etag,
                last_modified = excluded.last_modified,
                last_status = excluded.last_status,
                last_fetch_at = excluded.last_fetch_at
            "#,
        )
        .bind(&entry.source_id)
        .bind(&entry.etag)
        .bind(&entry.last_modified)
        .bind(entry.last_status)
        .bind(entry.last_fetch_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::MigrationManager;
    use pressline_common::ContentKind;

    async fn test_store() -> StateStore {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        MigrationManager::new(pool.clone()).apply_migrations().await.unwrap();
        StateStore::new(pool)
    }

    fn sample_item(url: &str, title: &str) -> Item {
        let now = Utc::now();
        Item {
            url: url.to_string(),
            source_id: "arxiv-cs-ai".to_string(),
            tier: 0,
            kind: ContentKind::Paper,
            title: title.to_string(),
            published_at: Some(now),
            date_confidence: DateConfidence::High,
            content_hash: "deadbeef".to_string(),
            raw_json: "{}".to_string(),
            first_seen_at: now,
            last_seen_at: now,
        }
    }

    #[tokio::test]
    async fn upsert_preserves_first_seen_at_across_updates() {
        let store = test_store().await;
        let first = sample_item("https://arxiv.org/abs/2401.12345", "Original Title");
        store.upsert_items_for_source(std::slice::from_ref(&first)).await.unwrap();

        let mut updated = first.clone();
        updated.title = "Updated Title".to_string();
        updated.last_seen_at = updated.first_seen_at + chrono::Duration::hours(1);
        store.upsert_items_for_source(std::slice::from_ref(&updated)).await.unwrap();

        let fetched = store.get_item(&first.url).await.unwrap().unwrap();
        assert_eq!(fetched.title, "Updated Title");
        assert_eq!(fetched.first_seen_at, first.first_seen_at);
    }

    #[tokio::test]
    async fn upsert_reports_inserted_then_updated_then_no_delta_counts() {
        let store = test_store().await;
        let item = sample_item("https://arxiv.org/abs/2401.12345", "Original Title");

        let first_pass = store.upsert_items_for_source(std::slice::from_ref(&item)).await.unwrap();
        assert_eq!(first_pass, UpsertCounts { inserted: 1, updated: 0 });

        let unchanged_pass = store.upsert_items_for_source(std::slice::from_ref(&item)).await.unwrap();
        assert_eq!(unchanged_pass, UpsertCounts { inserted: 0, updated: 0 });

        let mut changed = item.clone();
        changed.title = "Updated Title".to_string();
        changed.content_hash = "newhash".to_string();
        let updated_pass = store.upsert_items_for_source(std::slice::from_ref(&changed)).await.unwrap();
        assert_eq!(updated_pass, UpsertCounts { inserted: 0, updated: 1 });
    }

    #[tokio::test]
    async fn items_first_seen_after_filters_by_timestamp() {
        let store = test_store().await;
        let old = sample_item("https://example.com/old", "Old");
        let mut recent = sample_item("https://example.com/new", "New");
        recent.first_seen_at = old.first_seen_at + chrono::Duration::days(1);
        recent.last_seen_at = recent.first_seen_at;

        store.upsert_items_for_source(&[old.clone(), recent.clone()]).await.unwrap();

        let cutoff = old.first_seen_at + chrono::Duration::hours(1);
        let delta = store.items_first_seen_after(cutoff).await.unwrap();
        assert_eq!(delta.len(), 1);
        assert_eq!(delta[0].url, recent.url);
    }

    #[tokio::test]
    async fn http_cache_roundtrips() {
        use pressline_fetch::HttpCacheStore;
        let store = test_store().await;
        assert!(store.get_http_cache("source-a").await.unwrap().is_none());

        let entry = HttpCacheEntry {
            source_id: "source-a".to_string(),
            etag: Some("\"abc\"".to_string()),
            last_modified: None,
            last_status: Some(200),
            last_fetch_at: Utc::now(),
        };
        store.upsert_http_cache(entry.clone()).await.unwrap();

        let fetched = store.get_http_cache("source-a").await.unwrap().unwrap();
        assert_eq!(fetched.etag, entry.etag);
        assert_eq!(fetched.last_status, Some(200));
    }
}

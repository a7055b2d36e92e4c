use pressline_common::HttpCacheEntry;

use crate::result::FetchResult;

const HTTP_STATUS_NOT_MODIFIED: u16 = 304;

/// Storage seam for conditional-request cache entries. `pressline-store`
/// implements this against its `http_cache` table; the fetch layer never
/// depends on the store crate directly.
#[async_trait::async_trait]
pub trait HttpCacheStore: Send + Sync {
    async fn get_http_cache(&self, source_id: &str) -> anyhow::Result<Option<HttpCacheEntry>>;
    async fn upsert_http_cache(&self, entry: HttpCacheEntry) -> anyhow::Result<()>;
}

/// Builds conditional request headers from, and updates, a cache store.
pub struct CacheManager<'a> {
    store: &'a dyn HttpCacheStore,
}

impl<'a> CacheManager<'a> {
    pub fn new(store: &'a dyn HttpCacheStore) -> Self {
        Self { store }
    }

    pub async fn conditional_headers(&self, source_id: &str) -> anyhow::Result<Vec<(String, String)>> {
        let mut headers = Vec::new();
        if let Some(entry) = self.store.get_http_cache(source_id).await? {
            if let Some(etag) = entry.etag {
                headers.push(("If-None-Match".to_string(), etag));
            }
            if let Some(last_modified) = entry.last_modified {
                headers.push(("If-Modified-Since".to_string(), last_modified));
            }
        }
        Ok(headers)
    }

    pub async fn update_from_result(
        &self,
        source_id: &str,
        result: &FetchResult,
        now: chrono::DateTime<chrono::Utc>,
    ) -> anyhow::Result<()> {
        if result.error.is_some() && result.status_code != HTTP_STATUS_NOT_MODIFIED {
            self.store
                .upsert_http_cache(HttpCacheEntry {
                    source_id: source_id.to_string(),
                    etag: None,
                    last_modified: None,
                    last_status: if result.status_code > 0 { Some(result.status_code as i64) } else { None },
                    last_fetch_at: now,
                })
                .await?;
            return Ok(());
        }

        let mut etag = result.header("etag").map(str::to_string);
        let mut last_modified = result.header("last-modified").map(str::to_string);

        if result.status_code == HTTP_STATUS_NOT_MODIFIED {
            if let Some(existing) = self.store.get_http_cache(source_id).await? {
                etag = etag.or(existing.etag);
                last_modified = last_modified.or(existing.last_modified);
            }
        }

        self.store
            .upsert_http_cache(HttpCacheEntry {
                source_id: source_id.to_string(),
                etag,
                last_modified,
                last_status: Some(result.status_code as i64),
                last_fetch_at: now,
            })
            .await?;
        Ok(())
    }
}

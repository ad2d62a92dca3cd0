//! Two-tier search result cache.
//!
//! Batch entries cover a whole keyword set for one request (24h TTL);
//! per-keyword entries cover one normalized keyword each (7d TTL) and make
//! partial-hit merges possible. Keys are content hashes of the normalized
//! keywords plus the option set.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::debug;

use vgen_models::ImageCandidate;

use crate::error::SearchResult;
use crate::provider::SearchOptions;

/// TTL for batch (whole keyword set) entries.
pub const BATCH_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// TTL for per-keyword entries.
pub const KEYWORD_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Entries holding fewer candidates than this are stale: served results this
/// thin came from a degraded search and must be refreshed.
pub const MIN_CACHE_RESULTS: usize = 5;

/// One cached result set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchCacheEntry {
    /// Normalized keywords the entry covers
    pub keywords: Vec<String>,
    pub candidates: Vec<ImageCandidate>,
    /// Raw provider result count before filtering
    pub total_found: u32,
}

impl SearchCacheEntry {
    /// Thin entries are treated as misses.
    pub fn is_stale(&self) -> bool {
        self.candidates.len() < MIN_CACHE_RESULTS
    }
}

/// Normalize a keyword for cache keys: trimmed, lowercase, collapsed
/// whitespace.
pub fn normalize_keyword(keyword: &str) -> String {
    keyword
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn options_fingerprint(options: &SearchOptions) -> String {
    format!(
        "{}|{}|{}|{}|{}",
        options.per_keyword_limit,
        options.safe_search,
        options.image_size,
        options.region.as_deref().unwrap_or(""),
        options.language.as_deref().unwrap_or(""),
    )
}

/// Cache key for a whole keyword set searched as one request.
pub fn batch_key(keywords: &[String], options: &SearchOptions) -> String {
    let mut normalized: Vec<String> = keywords.iter().map(|k| normalize_keyword(k)).collect();
    normalized.sort();
    let digest = Sha256::digest(
        format!("{}#{}", normalized.join(","), options_fingerprint(options)).as_bytes(),
    );
    format!("vgen:search:batch:{:x}", digest)
}

/// Cache key for one normalized keyword.
pub fn keyword_key(keyword: &str, options: &SearchOptions) -> String {
    let digest = Sha256::digest(
        format!(
            "{}#{}",
            normalize_keyword(keyword),
            options_fingerprint(options)
        )
        .as_bytes(),
    );
    format!("vgen:search:kw:{:x}", digest)
}

/// Backend-agnostic cache storage.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> SearchResult<Option<SearchCacheEntry>>;
    async fn put(&self, key: &str, entry: &SearchCacheEntry, ttl: Duration) -> SearchResult<()>;
}

/// Redis-backed cache store. Values are JSON with `SET ... EX`.
pub struct RedisCacheStore {
    client: redis::Client,
}

impl RedisCacheStore {
    pub fn new(redis_url: &str) -> SearchResult<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> SearchResult<Option<SearchCacheEntry>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Option<String> = conn.get(key).await?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, entry: &SearchCacheEntry, ttl: Duration) -> SearchResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let json = serde_json::to_string(entry)?;
        conn.set_ex::<_, _, ()>(key, json, ttl.as_secs()).await?;
        debug!(key = %key, candidates = entry.candidates.len(), "Cached search results");
        Ok(())
    }
}

/// In-memory cache store for tests and local development.
#[derive(Default)]
pub struct MemoryCacheStore {
    entries: RwLock<HashMap<String, (Instant, SearchCacheEntry)>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> SearchResult<Option<SearchCacheEntry>> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).and_then(|(expires, entry)| {
            if Instant::now() < *expires {
                Some(entry.clone())
            } else {
                None
            }
        }))
    }

    async fn put(&self, key: &str, entry: &SearchCacheEntry, ttl: Duration) -> SearchResult<()> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), (Instant::now() + ttl, entry.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_keyword() {
        assert_eq!(normalize_keyword("  Night  Skyline "), "night skyline");
    }

    #[test]
    fn test_batch_key_order_independent() {
        let options = SearchOptions::default();
        let a = batch_key(&["sunset".into(), "skyline".into()], &options);
        let b = batch_key(&["skyline".into(), "sunset".into()], &options);
        assert_eq!(a, b);
    }

    #[test]
    fn test_batch_key_varies_with_options() {
        let keywords = vec!["sunset".to_string()];
        let a = batch_key(&keywords, &SearchOptions::default());
        let b = batch_key(
            &keywords,
            &SearchOptions {
                safe_search: "high".into(),
                ..SearchOptions::default()
            },
        );
        assert_ne!(a, b);
    }

    #[test]
    fn test_keyword_key_normalizes() {
        let options = SearchOptions::default();
        assert_eq!(keyword_key("Sunset ", &options), keyword_key("sunset", &options));
    }

    #[test]
    fn test_staleness_threshold() {
        let thin = SearchCacheEntry {
            keywords: vec!["sunset".into()],
            candidates: vec![
                ImageCandidate::new("https://a/1.jpg", "", "a", 800, 800),
                ImageCandidate::new("https://a/2.jpg", "", "a", 800, 800),
                ImageCandidate::new("https://a/3.jpg", "", "a", 800, 800),
            ],
            total_found: 3,
        };
        assert!(thin.is_stale());
    }

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryCacheStore::new();
        let entry = SearchCacheEntry {
            keywords: vec!["sunset".into()],
            candidates: vec![],
            total_found: 0,
        };
        store.put("k", &entry, Duration::from_secs(60)).await.unwrap();
        assert!(store.get("k").await.unwrap().is_some());
        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_store_expiry() {
        let store = MemoryCacheStore::new();
        let entry = SearchCacheEntry {
            keywords: vec![],
            candidates: vec![],
            total_found: 0,
        };
        store.put("k", &entry, Duration::from_secs(0)).await.unwrap();
        assert!(store.get("k").await.unwrap().is_none());
    }
}

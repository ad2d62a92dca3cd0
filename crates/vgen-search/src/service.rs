//! Cache-then-fetch search coordination.

use std::sync::Arc;

use metrics::counter;
use tracing::{debug, warn};

use vgen_models::ImageCandidate;

use crate::cache::{
    batch_key, keyword_key, CacheStore, SearchCacheEntry, BATCH_TTL, KEYWORD_TTL,
};
use crate::error::SearchResult;
use crate::filter::{CandidateFilter, FilterReason, FilterTally};
use crate::provider::{ImageSearchProvider, RawSearchItem, SearchOptions};
use crate::quality::score_candidate;

/// Counters for one search request.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchStats {
    /// Upstream provider calls issued
    pub upstream_calls: u32,
    /// Per-keyword cache hits reused
    pub cache_hits: u32,
    /// Raw provider items seen before filtering
    pub total_found: u32,
    pub filtered: FilterTally,
}

/// Result of a cached search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub candidates: Vec<ImageCandidate>,
    /// True when every keyword was served from cache
    pub from_cache: bool,
    pub stats: SearchStats,
}

/// Image search with the two-tier cache in front of a provider.
///
/// The cache is shared read/write across concurrent requests; last write
/// wins on the same key, which is acceptable because candidate lists for
/// the same keyword are fungible. Cache failures never block the search:
/// read errors degrade to misses and write errors are dropped.
pub struct SearchService<P> {
    provider: P,
    cache: Arc<dyn CacheStore>,
    filter: CandidateFilter,
}

impl<P: ImageSearchProvider> SearchService<P> {
    pub fn new(provider: P, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            provider,
            cache,
            filter: CandidateFilter::default(),
        }
    }

    pub fn with_filter(mut self, filter: CandidateFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Search a keyword set as one request, cached as a whole.
    ///
    /// A fresh batch entry serves the whole request; otherwise every keyword
    /// is searched upstream and the merged result is written back under the
    /// batch key.
    pub async fn search_with_cache(
        &self,
        keywords: &[String],
        options: &SearchOptions,
    ) -> SearchResult<SearchOutcome> {
        let key = batch_key(keywords, options);
        let mut stats = SearchStats::default();

        if let Some(entry) = self.cache_get(&key).await {
            if !entry.is_stale() {
                counter!("vgen_search_cache_hits_total", "tier" => "batch").increment(1);
                debug!(candidates = entry.candidates.len(), "Batch cache hit");
                stats.cache_hits = 1;
                return Ok(SearchOutcome {
                    candidates: entry.candidates,
                    from_cache: true,
                    stats,
                });
            }
            debug!("Batch cache entry below minimum result count, refreshing");
        }
        counter!("vgen_search_cache_misses_total", "tier" => "batch").increment(1);

        let mut sets = Vec::with_capacity(keywords.len());
        let mut last_error = None;
        for keyword in keywords {
            match self.provider.search(keyword, options).await {
                Ok(items) => {
                    stats.upstream_calls += 1;
                    stats.total_found += items.len() as u32;
                    sets.push(self.convert_and_filter(items, &mut stats.filtered));
                }
                Err(e) => {
                    warn!(keyword = %keyword, error = %e, "Upstream search failed for keyword");
                    stats.upstream_calls += 1;
                    last_error = Some(e);
                }
            }
        }

        let candidates = merge_and_rank(sets, &mut stats.filtered);

        if candidates.is_empty() {
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        self.cache_put(
            &key,
            &SearchCacheEntry {
                keywords: keywords.to_vec(),
                candidates: candidates.clone(),
                total_found: stats.total_found,
            },
            BATCH_TTL,
        )
        .await;

        Ok(SearchOutcome {
            candidates,
            from_cache: false,
            stats,
        })
    }

    /// Search keywords with independent per-keyword cache entries.
    ///
    /// Cached keywords are reused verbatim; exactly one upstream call is
    /// issued per uncached keyword and each fresh result set is written
    /// back under its own key before the merge.
    pub async fn search_each_cached(
        &self,
        keywords: &[String],
        options: &SearchOptions,
    ) -> SearchResult<SearchOutcome> {
        let mut stats = SearchStats::default();
        let mut sets = Vec::with_capacity(keywords.len());
        let mut last_error = None;

        for keyword in keywords {
            let key = keyword_key(keyword, options);

            if let Some(entry) = self.cache_get(&key).await {
                if !entry.is_stale() {
                    counter!("vgen_search_cache_hits_total", "tier" => "keyword").increment(1);
                    debug!(keyword = %keyword, candidates = entry.candidates.len(), "Keyword cache hit");
                    stats.cache_hits += 1;
                    sets.push(entry.candidates);
                    continue;
                }
                debug!(keyword = %keyword, "Keyword cache entry below minimum result count, refreshing");
            }
            counter!("vgen_search_cache_misses_total", "tier" => "keyword").increment(1);

            match self.provider.search(keyword, options).await {
                Ok(items) => {
                    stats.upstream_calls += 1;
                    stats.total_found += items.len() as u32;
                    let candidates = self.convert_and_filter(items, &mut stats.filtered);
                    self.cache_put(
                        &key,
                        &SearchCacheEntry {
                            keywords: vec![keyword.clone()],
                            candidates: candidates.clone(),
                            total_found: candidates.len() as u32,
                        },
                        KEYWORD_TTL,
                    )
                    .await;
                    sets.push(candidates);
                }
                Err(e) => {
                    warn!(keyword = %keyword, error = %e, "Upstream search failed for keyword");
                    stats.upstream_calls += 1;
                    last_error = Some(e);
                }
            }
        }

        let from_cache = stats.cache_hits as usize == keywords.len();
        let candidates = merge_and_rank(sets, &mut stats.filtered);

        if candidates.is_empty() {
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        Ok(SearchOutcome {
            candidates,
            from_cache,
            stats,
        })
    }

    fn convert_and_filter(
        &self,
        items: Vec<RawSearchItem>,
        tally: &mut FilterTally,
    ) -> Vec<ImageCandidate> {
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            let info = item.image.unwrap_or_default();
            let mut candidate = ImageCandidate::new(
                item.link,
                item.title,
                item.display_link,
                info.width,
                info.height,
            );
            if let Some(thumb) = info.thumbnail_link {
                candidate = candidate.with_thumbnail(thumb);
            }

            match self.filter.check(&candidate) {
                Ok(()) => {
                    candidate.quality_score = score_candidate(&candidate);
                    out.push(candidate);
                }
                Err(reason) => tally.record(reason),
            }
        }
        out
    }

    async fn cache_get(&self, key: &str) -> Option<SearchCacheEntry> {
        match self.cache.get(key).await {
            Ok(entry) => entry,
            Err(e) => {
                // Read failure degrades to a miss
                warn!(key = %key, error = %e, "Cache read failed");
                None
            }
        }
    }

    async fn cache_put(&self, key: &str, entry: &SearchCacheEntry, ttl: std::time::Duration) {
        if let Err(e) = self.cache.put(key, entry, ttl).await {
            // Write failure is dropped; the cache is not a correctness dependency
            warn!(key = %key, error = %e, "Cache write failed");
        }
    }
}

/// Merge per-keyword result sets: dedupe by source URL (first seen wins),
/// sort by descending quality, re-assign sort order 0..N-1.
fn merge_and_rank(
    sets: Vec<Vec<ImageCandidate>>,
    tally: &mut FilterTally,
) -> Vec<ImageCandidate> {
    let mut seen = std::collections::HashSet::new();
    let mut merged = Vec::new();

    for set in sets {
        for candidate in set {
            if seen.insert(candidate.source_url.clone()) {
                merged.push(candidate);
            } else {
                tally.record(FilterReason::Duplicate);
            }
        }
    }

    merged.sort_by(|a, b| {
        b.quality_score
            .partial_cmp(&a.quality_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    for (index, candidate) in merged.iter_mut().enumerate() {
        candidate.sort_order = index as u32;
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemoryCacheStore, MIN_CACHE_RESULTS};
    use crate::error::SearchError;
    use crate::provider::RawImageInfo;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Provider stub that records which keywords were searched.
    struct StubProvider {
        calls: AtomicU32,
        searched: std::sync::Mutex<Vec<String>>,
        fail: bool,
    }

    impl StubProvider {
        fn new() -> Self {
            Self {
                calls: AtomicU32::new(0),
                searched: std::sync::Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new()
            }
        }
    }

    fn raw_item(url: &str, domain: &str, width: u32, height: u32) -> RawSearchItem {
        RawSearchItem {
            link: url.to_string(),
            title: "img".to_string(),
            display_link: domain.to_string(),
            image: Some(RawImageInfo {
                width,
                height,
                thumbnail_link: Some(format!("{}?thumb", url)),
            }),
        }
    }

    #[async_trait]
    impl ImageSearchProvider for StubProvider {
        async fn search(
            &self,
            keyword: &str,
            _options: &SearchOptions,
        ) -> SearchResult<Vec<RawSearchItem>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.searched.lock().unwrap().push(keyword.to_string());
            if self.fail {
                return Err(SearchError::provider_failed("provider down"));
            }
            // Six distinct candidates per keyword, one shared URL across
            // keywords to exercise dedup
            let mut items: Vec<RawSearchItem> = (0..6)
                .map(|i| {
                    raw_item(
                        &format!("https://photos.example/{}/{}.jpg", keyword, i),
                        "photos.example",
                        1200 + 100 * i,
                        1800,
                    )
                })
                .collect();
            items.push(raw_item(
                "https://photos.example/shared.jpg",
                "photos.example",
                2000,
                3000,
            ));
            Ok(items)
        }
    }

    fn seeded_entry(keyword: &str) -> SearchCacheEntry {
        let candidates: Vec<ImageCandidate> = (0..6)
            .map(|i| {
                let mut c = ImageCandidate::new(
                    format!("https://cached.example/{}/{}.jpg", keyword, i),
                    "img",
                    "cached.example",
                    1080,
                    1920,
                );
                c.quality_score = 0.8;
                c
            })
            .collect();
        SearchCacheEntry {
            keywords: vec![keyword.to_string()],
            candidates,
            total_found: 6,
        }
    }

    #[tokio::test]
    async fn test_partial_cache_hit_issues_one_call_per_miss() {
        let cache = Arc::new(MemoryCacheStore::new());
        let options = SearchOptions::default();

        // Pre-seed 3 of 5 keywords
        for keyword in ["sunset", "skyline", "neon"] {
            cache
                .put(&keyword_key(keyword, &options), &seeded_entry(keyword), KEYWORD_TTL)
                .await
                .unwrap();
        }

        let provider = StubProvider::new();
        let service = SearchService::new(provider, cache.clone() as Arc<dyn CacheStore>);

        let keywords: Vec<String> = ["sunset", "skyline", "neon", "beach", "city"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let outcome = service.search_each_cached(&keywords, &options).await.unwrap();

        assert_eq!(outcome.stats.upstream_calls, 2);
        assert_eq!(outcome.stats.cache_hits, 3);
        assert!(!outcome.from_cache);

        let searched = service.provider.searched.lock().unwrap().clone();
        assert_eq!(searched, vec!["beach".to_string(), "city".to_string()]);

        // No duplicate source URLs after merge
        let mut urls: Vec<_> = outcome.candidates.iter().map(|c| &c.source_url).collect();
        let before = urls.len();
        urls.sort();
        urls.dedup();
        assert_eq!(urls.len(), before);

        // Newly fetched keywords were written back to their own entries
        assert!(cache
            .get(&keyword_key("beach", &options))
            .await
            .unwrap()
            .is_some());
        assert!(cache
            .get(&keyword_key("city", &options))
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_merge_sorts_by_quality_and_reassigns_order() {
        let cache = Arc::new(MemoryCacheStore::new());
        let service = SearchService::new(StubProvider::new(), cache as Arc<dyn CacheStore>);

        let keywords = vec!["sunset".to_string(), "beach".to_string()];
        let outcome = service
            .search_each_cached(&keywords, &SearchOptions::default())
            .await
            .unwrap();

        for window in outcome.candidates.windows(2) {
            assert!(window[0].quality_score >= window[1].quality_score);
        }
        for (i, candidate) in outcome.candidates.iter().enumerate() {
            assert_eq!(candidate.sort_order, i as u32);
        }
        // The shared URL appears once and was tallied as a duplicate
        assert_eq!(outcome.stats.filtered.duplicate, 1);
    }

    #[tokio::test]
    async fn test_thin_cache_entry_triggers_refresh() {
        let cache = Arc::new(MemoryCacheStore::new());
        let options = SearchOptions::default();

        // Entry with only 3 candidates, below the 5 minimum
        let mut thin = seeded_entry("sunset");
        thin.candidates.truncate(3);
        cache
            .put(&keyword_key("sunset", &options), &thin, KEYWORD_TTL)
            .await
            .unwrap();

        let service =
            SearchService::new(StubProvider::new(), cache.clone() as Arc<dyn CacheStore>);
        let outcome = service
            .search_each_cached(&["sunset".to_string()], &options)
            .await
            .unwrap();

        assert_eq!(outcome.stats.upstream_calls, 1);
        assert_eq!(outcome.stats.cache_hits, 0);
        assert!(outcome.candidates.len() >= MIN_CACHE_RESULTS);
    }

    #[tokio::test]
    async fn test_batch_cache_hit_skips_provider() {
        let cache = Arc::new(MemoryCacheStore::new());
        let options = SearchOptions::default();
        let keywords = vec!["sunset".to_string(), "beach".to_string()];

        cache
            .put(&batch_key(&keywords, &options), &seeded_entry("batch"), BATCH_TTL)
            .await
            .unwrap();

        let service = SearchService::new(StubProvider::new(), cache as Arc<dyn CacheStore>);
        let outcome = service.search_with_cache(&keywords, &options).await.unwrap();

        assert!(outcome.from_cache);
        assert_eq!(outcome.stats.upstream_calls, 0);
        assert_eq!(service.provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_batch_miss_searches_then_writes_back() {
        let cache = Arc::new(MemoryCacheStore::new());
        let options = SearchOptions::default();
        let keywords = vec!["sunset".to_string()];

        let service =
            SearchService::new(StubProvider::new(), cache.clone() as Arc<dyn CacheStore>);
        let outcome = service.search_with_cache(&keywords, &options).await.unwrap();
        assert!(!outcome.from_cache);
        assert_eq!(outcome.stats.upstream_calls, 1);

        let cached = cache
            .get(&batch_key(&keywords, &options))
            .await
            .unwrap()
            .expect("batch entry written");
        assert_eq!(cached.candidates.len(), outcome.candidates.len());
    }

    #[tokio::test]
    async fn test_provider_failure_with_no_results_propagates() {
        let cache = Arc::new(MemoryCacheStore::new());
        let service = SearchService::new(StubProvider::failing(), cache as Arc<dyn CacheStore>);

        let result = service
            .search_each_cached(&["sunset".to_string()], &SearchOptions::default())
            .await;
        assert!(result.is_err());
    }
}

//! Image search and caching for the variation pipeline.
//!
//! Wraps an external image-search provider with a two-tier cache:
//! - a batch cache keyed by the whole normalized keyword set, and
//! - a per-keyword cache enabling partial-hit merges.
//!
//! Candidates are domain/dimension filtered before scoring; filtered
//! candidates never enter the cache or the result set. The cache is a
//! performance optimization only: read failures degrade to misses and write
//! failures are dropped.

pub mod cache;
pub mod error;
pub mod filter;
pub mod provider;
pub mod quality;
pub mod service;

pub use cache::{CacheStore, MemoryCacheStore, RedisCacheStore, SearchCacheEntry};
pub use error::{SearchError, SearchResult};
pub use filter::{CandidateFilter, FilterReason, FilterTally};
pub use provider::{CseClient, ImageSearchProvider, RawSearchItem, SearchOptions};
pub use quality::score_candidate;
pub use service::{SearchOutcome, SearchService, SearchStats};

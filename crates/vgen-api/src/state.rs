//! Application state.

use std::sync::Arc;

use vgen_render::{ComposeClient, ComposeConfig, RenderSubmitter};
use vgen_search::{CseClient, MemoryCacheStore, RedisCacheStore, SearchService};
use vgen_store::{JobStore, MemoryJobStore, MemorySeedStore, RedisJobStore, RedisSeedStore, SeedStore};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub jobs: Arc<dyn JobStore>,
    pub seeds: Arc<dyn SeedStore>,
    pub search: Arc<SearchService<CseClient>>,
    pub render: Arc<dyn RenderSubmitter>,
    pub compose: Arc<ComposeConfig>,
}

impl AppState {
    /// Create application state from the environment. Redis backs the job
    /// rows and the search cache; `STORE_BACKEND=memory` swaps in the
    /// in-memory stores for local development.
    pub fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let use_memory = std::env::var("STORE_BACKEND")
            .map(|v| v.to_lowercase() == "memory")
            .unwrap_or(false);

        let (jobs, seeds): (Arc<dyn JobStore>, Arc<dyn SeedStore>) = if use_memory {
            (
                Arc::new(MemoryJobStore::new()),
                Arc::new(MemorySeedStore::new()),
            )
        } else {
            (
                Arc::new(RedisJobStore::from_env()?),
                Arc::new(RedisSeedStore::from_env()?),
            )
        };

        let provider = CseClient::from_env()?;
        let cache: Arc<dyn vgen_search::CacheStore> = if use_memory {
            Arc::new(MemoryCacheStore::new())
        } else {
            let redis_url = std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string());
            Arc::new(RedisCacheStore::new(&redis_url)?)
        };
        let search = Arc::new(SearchService::new(provider, cache));

        let compose = Arc::new(ComposeConfig::from_env()?);
        let render: Arc<dyn RenderSubmitter> = Arc::new(ComposeClient::new(&compose.base_url));

        Ok(Self {
            config,
            jobs,
            seeds,
            search,
            render,
            compose,
        })
    }
}

//! Seed generation lookups.

use async_trait::async_trait;

use vgen_models::SeedGeneration;

use crate::error::StoreResult;

/// Read-only access to seed generations. Seeds are produced by the
/// generation pipeline upstream of this core and never mutated here.
#[async_trait]
pub trait SeedStore: Send + Sync {
    async fn get(&self, seed_id: &str) -> StoreResult<Option<SeedGeneration>>;
}

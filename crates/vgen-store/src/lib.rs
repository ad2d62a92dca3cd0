//! Persistence seam for the variation pipeline.
//!
//! The core never assumes a specific storage engine: it needs lookups by id
//! and single-row, keyed updates with standard not-found semantics. The
//! `JobStore` trait owns the terminal-state idempotency rule so callbacks
//! and the poller converge on identical behavior. A Redis implementation
//! backs deployments; an in-memory implementation backs tests and local
//! development.

pub mod error;
pub mod job_store;
pub mod memory;
pub mod redis_store;
pub mod seed_store;

pub use error::{StoreError, StoreResult};
pub use job_store::{Applied, JobStore, TerminalUpdate};
pub use memory::{MemoryJobStore, MemorySeedStore};
pub use redis_store::{RedisJobStore, RedisSeedStore};
pub use seed_store::SeedStore;

//! Variation job store trait and the shared terminal-update contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use vgen_models::{BatchId, VariationJob, VariationJobId};

use crate::error::StoreResult;

/// Terminal outcome reported by the render engine.
///
/// Both input paths (callback push and poller pull) reduce to this type and
/// apply it through `JobStore::apply_terminal`, which guarantees the
/// idempotency rule in one place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TerminalUpdate {
    Completed { output_url: String },
    Failed { error: String },
}

/// Result of applying a terminal update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The job transitioned to the terminal state
    Updated,
    /// The job was already terminal; nothing changed
    AlreadyTerminal,
    /// No job with that id is tracked; safe no-op for late callbacks
    NotFound,
}

/// Durable store for variation job rows.
///
/// All updates are single-row keyed writes; concurrent updates to different
/// jobs never contend.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Persist a new placeholder row.
    async fn insert(&self, job: &VariationJob) -> StoreResult<()>;

    async fn get(&self, id: &VariationJobId) -> StoreResult<Option<VariationJob>>;

    /// All jobs in a batch, in creation order.
    async fn list_batch(&self, batch_id: &BatchId) -> StoreResult<Vec<VariationJob>>;

    /// Record successful render submission: Pending -> Processing plus the
    /// remote handle.
    async fn mark_processing(
        &self,
        id: &VariationJobId,
        remote_handle: &str,
    ) -> StoreResult<()>;

    /// Apply a terminal update idempotently.
    ///
    /// A job already in a terminal state is left untouched and reported as
    /// `AlreadyTerminal`; an unknown id is reported as `NotFound` rather
    /// than an error, so late callbacks for cancelled batches are safe.
    async fn apply_terminal(
        &self,
        id: &VariationJobId,
        update: TerminalUpdate,
    ) -> StoreResult<Applied>;
}

/// Apply a terminal update to an owned job row. Shared by store
/// implementations so the state-transition function is written once.
pub(crate) fn apply_update(job: VariationJob, update: TerminalUpdate) -> (VariationJob, Applied) {
    if job.status.is_terminal() {
        return (job, Applied::AlreadyTerminal);
    }
    let job = match update {
        TerminalUpdate::Completed { output_url } => job.complete(output_url),
        TerminalUpdate::Failed { error } => job.fail(error),
    };
    (job, Applied::Updated)
}

//! Business logic services.

pub mod variation;

pub use variation::{start_variation_batch, BatchOutcome};

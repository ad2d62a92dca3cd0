//! Shared data models for the VGen variation backend.
//!
//! This crate provides Serde-serializable types and the pure algorithms of
//! the variation pipeline:
//! - Style presets and the named style-set catalog
//! - Variation settings and the combination generator
//! - Seed generations and their typed metadata
//! - Variation jobs and their lifecycle states
//! - Image candidates produced by the search layer
//! - Keyword/tag extraction from seed metadata or prompt text

pub mod combination;
pub mod image;
pub mod job;
pub mod keywords;
pub mod presets;
pub mod seed;

// Re-export common types
pub use combination::{generate_combinations, AxisSelection};
pub use image::ImageCandidate;
pub use job::{
    AutoPublish, BatchId, JobStatus, VariationJob, VariationJobId, VariationSettings,
};
pub use keywords::{extract_keywords, KeywordCaps};
pub use presets::{ColorGrade, EffectPreset, StyleSet, TextStyle, Vibe};
pub use seed::{AspectRatio, AudioRef, ScriptLine, SeedGeneration, SeedMetadata, SeedStatus};

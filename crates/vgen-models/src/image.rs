//! Image candidates sourced by the search layer.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One scored image candidate from a search.
///
/// Ephemeral: constructed per search and cached by keyword, never persisted
/// as a first-class entity beyond the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ImageCandidate {
    pub id: String,

    /// Full-size image URL; dedup key across merged result sets
    pub source_url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,

    pub source_title: String,

    /// Page domain the image was found on
    pub source_domain: String,

    pub width: u32,

    pub height: u32,

    /// Deterministic quality score in [0, 1]
    pub quality_score: f64,

    /// Position after merge/sort, 0-based
    pub sort_order: u32,

    /// Whether the reviewer/picker has selected this candidate
    #[serde(default)]
    pub is_selected: bool,
}

impl ImageCandidate {
    /// Construct an unscored candidate from raw search fields.
    pub fn new(
        source_url: impl Into<String>,
        source_title: impl Into<String>,
        source_domain: impl Into<String>,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            id: format!("img_{}", Uuid::new_v4()),
            source_url: source_url.into(),
            thumbnail_url: None,
            source_title: source_title.into(),
            source_domain: source_domain.into(),
            width,
            height,
            quality_score: 0.0,
            sort_order: 0,
            is_selected: false,
        }
    }

    pub fn with_thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail_url = Some(url.into());
        self
    }

    /// Megapixel count of the full-size image.
    pub fn megapixels(&self) -> f64 {
        (self.width as f64 * self.height as f64) / 1_000_000.0
    }

    /// Height/width ratio; 0 when width is unknown.
    pub fn aspect(&self) -> f64 {
        if self.width == 0 {
            0.0
        } else {
            self.height as f64 / self.width as f64
        }
    }
}

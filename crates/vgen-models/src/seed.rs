//! Seed generations: completed videos used as the basis for variations.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Lifecycle status of a seed generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SeedStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl SeedStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeedStatus::Pending => "pending",
            SeedStatus::Processing => "processing",
            SeedStatus::Completed => "completed",
            SeedStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for SeedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Aspect ratio specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct AspectRatio {
    pub width: u32,
    pub height: u32,
}

impl AspectRatio {
    /// Standard portrait (9:16) for TikTok/Reels
    pub const PORTRAIT: AspectRatio = AspectRatio {
        width: 9,
        height: 16,
    };

    /// Landscape (16:9)
    pub const LANDSCAPE: AspectRatio = AspectRatio {
        width: 16,
        height: 9,
    };

    /// Square (1:1)
    pub const SQUARE: AspectRatio = AspectRatio {
        width: 1,
        height: 1,
    };

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns the aspect ratio as a decimal.
    pub fn as_f64(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

impl FromStr for AspectRatio {
    type Err = AspectRatioParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 2 {
            return Err(AspectRatioParseError::InvalidFormat(s.to_string()));
        }

        let width = parts[0]
            .parse()
            .map_err(|_| AspectRatioParseError::InvalidNumber(parts[0].to_string()))?;
        let height = parts[1]
            .parse()
            .map_err(|_| AspectRatioParseError::InvalidNumber(parts[1].to_string()))?;

        if width == 0 || height == 0 {
            return Err(AspectRatioParseError::ZeroValue);
        }

        Ok(AspectRatio { width, height })
    }
}

impl Default for AspectRatio {
    fn default() -> Self {
        Self::PORTRAIT
    }
}

#[derive(Debug, Error)]
pub enum AspectRatioParseError {
    #[error("Invalid aspect ratio format: {0}, expected 'W:H'")]
    InvalidFormat(String),
    #[error("Invalid number in aspect ratio: {0}")]
    InvalidNumber(String),
    #[error("Aspect ratio cannot have zero values")]
    ZeroValue,
}

/// Reference to the seed's audio track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AudioRef {
    /// Public URL of the audio asset
    pub url: String,
    /// Offset into the track, in seconds
    #[serde(default)]
    pub start_time: f64,
    /// Trim duration in seconds; None lets the render engine match the video
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

/// One subtitle line with timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScriptLine {
    pub text: String,
    /// Seconds from the start of the video
    pub timing: f64,
    /// Seconds the line stays on screen
    pub duration: f64,
}

/// Typed quality metadata attached to a seed by whichever pipeline produced
/// it. Keyword extraction probes these variants in priority order instead of
/// walking untyped JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SeedMetadata {
    /// Produced by the fast-cut pipeline
    FastCut {
        #[serde(default)]
        search_keywords: Vec<String>,
        #[serde(default)]
        script_lines: Vec<ScriptLine>,
    },
    /// Produced by the full compose pipeline
    Compose {
        #[serde(default)]
        keywords: Vec<String>,
        #[serde(default)]
        search_keywords: Vec<String>,
        #[serde(default)]
        script_lines: Vec<ScriptLine>,
        /// URLs of the images the seed was rendered from
        #[serde(default)]
        image_urls: Vec<String>,
    },
    /// Produced by the one-shot quick compose path
    QuickCompose {
        #[serde(default)]
        keywords: Vec<String>,
        #[serde(default)]
        image_urls: Vec<String>,
    },
}

impl SeedMetadata {
    /// Script lines recorded at seed render time, if any.
    ///
    /// Variations reuse these verbatim so subtitles stay consistent across
    /// renders of the same seed.
    pub fn script_lines(&self) -> Option<&[ScriptLine]> {
        match self {
            SeedMetadata::FastCut { script_lines, .. }
            | SeedMetadata::Compose { script_lines, .. } => {
                if script_lines.is_empty() {
                    None
                } else {
                    Some(script_lines)
                }
            }
            SeedMetadata::QuickCompose { .. } => None,
        }
    }

    /// Image URLs recorded at seed render time, if any.
    pub fn image_urls(&self) -> Option<&[String]> {
        match self {
            SeedMetadata::Compose { image_urls, .. }
            | SeedMetadata::QuickCompose { image_urls, .. } => {
                if image_urls.is_empty() {
                    None
                } else {
                    Some(image_urls)
                }
            }
            SeedMetadata::FastCut { .. } => None,
        }
    }
}

/// An already-completed creation that serves as the basis for variations.
///
/// Read-only to the variation core; never mutated once referenced.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SeedGeneration {
    pub id: String,

    /// Label (workspace/team) that owns this seed; RBAC gate for variations
    pub label_id: String,

    pub prompt: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,

    /// Target duration in seconds
    pub duration: f64,

    #[serde(default)]
    pub aspect_ratio: AspectRatio,

    /// Linked audio asset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioRef>,

    pub status: SeedStatus,

    /// Output URL of the rendered seed video
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_url: Option<String>,

    /// Typed metadata from the producing pipeline
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<SeedMetadata>,

    pub created_at: DateTime<Utc>,
}

impl SeedGeneration {
    pub fn is_completed(&self) -> bool {
        self.status == SeedStatus::Completed
    }
}

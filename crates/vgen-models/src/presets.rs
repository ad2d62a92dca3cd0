//! Style preset axes and the named style-set catalog.
//!
//! Each variation is styled along four independent axes (effect, color
//! grade, text style, vibe). A `StyleSet` bundles one value per axis under a
//! curated name so the dashboard can offer one-click moods.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::job::VariationSettings;

/// Transition/motion effect applied between slides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EffectPreset {
    /// Zoom pulses synced to the audio beat
    ZoomBeat,
    /// Soft crossfade between images
    Crossfade,
    /// Directional slide transitions
    SlideDynamic,
    /// Rhythmic zoom in/out
    PulseZoom,
    /// Hard cuts with a shake accent
    ShakeCut,
}

impl EffectPreset {
    pub const ALL: &'static [EffectPreset] = &[
        EffectPreset::ZoomBeat,
        EffectPreset::Crossfade,
        EffectPreset::SlideDynamic,
        EffectPreset::PulseZoom,
        EffectPreset::ShakeCut,
    ];

    /// Defaults substituted when a request selects no effects.
    pub const DEFAULTS: &'static [EffectPreset] =
        &[EffectPreset::ZoomBeat, EffectPreset::Crossfade];

    pub fn as_str(&self) -> &'static str {
        match self {
            EffectPreset::ZoomBeat => "zoom_beat",
            EffectPreset::Crossfade => "crossfade",
            EffectPreset::SlideDynamic => "slide_dynamic",
            EffectPreset::PulseZoom => "pulse_zoom",
            EffectPreset::ShakeCut => "shake_cut",
        }
    }
}

impl fmt::Display for EffectPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EffectPreset {
    type Err = PresetParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "zoom_beat" => Ok(EffectPreset::ZoomBeat),
            "crossfade" => Ok(EffectPreset::Crossfade),
            "slide_dynamic" => Ok(EffectPreset::SlideDynamic),
            "pulse_zoom" => Ok(EffectPreset::PulseZoom),
            "shake_cut" => Ok(EffectPreset::ShakeCut),
            _ => Err(PresetParseError::new("effect preset", s)),
        }
    }
}

/// Color grade applied to every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ColorGrade {
    /// Saturated, punchy colors
    Vibrant,
    /// Dark, desaturated shadows
    Moody,
    /// Faded film look
    Vintage,
    /// Black and white
    Mono,
    /// High-contrast neon accents
    Neon,
}

impl ColorGrade {
    pub const ALL: &'static [ColorGrade] = &[
        ColorGrade::Vibrant,
        ColorGrade::Moody,
        ColorGrade::Vintage,
        ColorGrade::Mono,
        ColorGrade::Neon,
    ];

    pub const DEFAULTS: &'static [ColorGrade] = &[ColorGrade::Vibrant];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColorGrade::Vibrant => "vibrant",
            ColorGrade::Moody => "moody",
            ColorGrade::Vintage => "vintage",
            ColorGrade::Mono => "mono",
            ColorGrade::Neon => "neon",
        }
    }
}

impl fmt::Display for ColorGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ColorGrade {
    type Err = PresetParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "vibrant" => Ok(ColorGrade::Vibrant),
            "moody" => Ok(ColorGrade::Moody),
            "vintage" => Ok(ColorGrade::Vintage),
            "mono" => Ok(ColorGrade::Mono),
            "neon" => Ok(ColorGrade::Neon),
            _ => Err(PresetParseError::new("color grade", s)),
        }
    }
}

/// On-screen subtitle/caption styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TextStyle {
    /// Heavy sans with pop animation
    BoldPop,
    /// Thin, understated captions
    MinimalClean,
    /// Glowing neon outline
    NeonGlow,
    /// Character-by-character reveal
    Typewriter,
}

impl TextStyle {
    pub const ALL: &'static [TextStyle] = &[
        TextStyle::BoldPop,
        TextStyle::MinimalClean,
        TextStyle::NeonGlow,
        TextStyle::Typewriter,
    ];

    pub const DEFAULTS: &'static [TextStyle] = &[TextStyle::BoldPop];

    pub fn as_str(&self) -> &'static str {
        match self {
            TextStyle::BoldPop => "bold_pop",
            TextStyle::MinimalClean => "minimal_clean",
            TextStyle::NeonGlow => "neon_glow",
            TextStyle::Typewriter => "typewriter",
        }
    }
}

impl fmt::Display for TextStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TextStyle {
    type Err = PresetParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bold_pop" => Ok(TextStyle::BoldPop),
            "minimal_clean" => Ok(TextStyle::MinimalClean),
            "neon_glow" => Ok(TextStyle::NeonGlow),
            "typewriter" => Ok(TextStyle::Typewriter),
            _ => Err(PresetParseError::new("text style", s)),
        }
    }
}

/// Overall pacing/mood of the edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum Vibe {
    Pop,
    Chill,
    Hype,
    Dreamy,
    Retro,
}

impl Vibe {
    pub const ALL: &'static [Vibe] = &[Vibe::Pop, Vibe::Chill, Vibe::Hype, Vibe::Dreamy, Vibe::Retro];

    pub const DEFAULTS: &'static [Vibe] = &[Vibe::Pop];

    pub fn as_str(&self) -> &'static str {
        match self {
            Vibe::Pop => "Pop",
            Vibe::Chill => "Chill",
            Vibe::Hype => "Hype",
            Vibe::Dreamy => "Dreamy",
            Vibe::Retro => "Retro",
        }
    }
}

impl fmt::Display for Vibe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Vibe {
    type Err = PresetParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pop" => Ok(Vibe::Pop),
            "chill" => Ok(Vibe::Chill),
            "hype" => Ok(Vibe::Hype),
            "dreamy" => Ok(Vibe::Dreamy),
            "retro" => Ok(Vibe::Retro),
            _ => Err(PresetParseError::new("vibe", s)),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown {kind}: {value}")]
pub struct PresetParseError {
    kind: &'static str,
    value: String,
}

impl PresetParseError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// A curated bundle of one value per style axis.
///
/// Style sets are a static registry; pure lookup, no state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleSet {
    /// Stable id used by the dashboard selection set
    pub id: &'static str,
    /// Human-readable name
    pub name: &'static str,
    pub effect: EffectPreset,
    pub color: ColorGrade,
    pub text: TextStyle,
    pub vibe: Vibe,
}

impl StyleSet {
    pub const ALL: &'static [StyleSet] = &[
        StyleSet {
            id: "viral_tiktok",
            name: "Viral TikTok",
            effect: EffectPreset::ZoomBeat,
            color: ColorGrade::Vibrant,
            text: TextStyle::BoldPop,
            vibe: Vibe::Pop,
        },
        StyleSet {
            id: "cinematic_moody",
            name: "Cinematic Moody",
            effect: EffectPreset::Crossfade,
            color: ColorGrade::Moody,
            text: TextStyle::MinimalClean,
            vibe: Vibe::Chill,
        },
        StyleSet {
            id: "high_energy",
            name: "High Energy",
            effect: EffectPreset::ShakeCut,
            color: ColorGrade::Neon,
            text: TextStyle::NeonGlow,
            vibe: Vibe::Hype,
        },
        StyleSet {
            id: "retro_wave",
            name: "Retro Wave",
            effect: EffectPreset::SlideDynamic,
            color: ColorGrade::Vintage,
            text: TextStyle::Typewriter,
            vibe: Vibe::Retro,
        },
        StyleSet {
            id: "dreamy_soft",
            name: "Dreamy Soft",
            effect: EffectPreset::PulseZoom,
            color: ColorGrade::Vintage,
            text: TextStyle::MinimalClean,
            vibe: Vibe::Dreamy,
        },
        StyleSet {
            id: "clean_minimal",
            name: "Clean Minimal",
            effect: EffectPreset::Crossfade,
            color: ColorGrade::Mono,
            text: TextStyle::MinimalClean,
            vibe: Vibe::Chill,
        },
    ];

    /// Look up a style set by id.
    pub fn find(id: &str) -> Option<&'static StyleSet> {
        Self::ALL.iter().find(|s| s.id == id)
    }

    /// The settings bundle this set resolves to.
    pub fn settings(&self) -> VariationSettings {
        VariationSettings {
            effect_preset: self.effect,
            color_grade: self.color,
            text_style: self.text,
            vibe: self.vibe,
        }
    }
}

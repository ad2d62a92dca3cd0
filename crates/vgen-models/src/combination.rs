//! Combinatorial expansion of style axes into variation settings.

use crate::presets::{ColorGrade, EffectPreset, TextStyle, Vibe};
use crate::job::VariationSettings;

/// Selected values per style axis. Empty axes fall back to the documented
/// defaults at generation time.
#[derive(Debug, Clone, Default)]
pub struct AxisSelection {
    pub effects: Vec<EffectPreset>,
    pub colors: Vec<ColorGrade>,
    pub texts: Vec<TextStyle>,
    pub vibes: Vec<Vibe>,
}

/// Enumerate the Cartesian product of the selected axes, up to `cap`.
///
/// Nesting order is effect (outermost), then color, text, vibe (innermost),
/// so results are deterministic for the same inputs. Enumeration stops the
/// instant `cap` combinations have been produced; combinations past the cap
/// are never constructed. Always returns at least one combination: an empty
/// axis is substituted with its default selection. With every axis empty the
/// defaults yield two combinations (two default effects times one of each
/// other axis), subject to `cap`.
pub fn generate_combinations(axes: &AxisSelection, cap: usize) -> Vec<VariationSettings> {
    let effects: &[EffectPreset] = if axes.effects.is_empty() {
        EffectPreset::DEFAULTS
    } else {
        &axes.effects
    };
    let colors: &[ColorGrade] = if axes.colors.is_empty() {
        ColorGrade::DEFAULTS
    } else {
        &axes.colors
    };
    let texts: &[TextStyle] = if axes.texts.is_empty() {
        TextStyle::DEFAULTS
    } else {
        &axes.texts
    };
    let vibes: &[Vibe] = if axes.vibes.is_empty() {
        Vibe::DEFAULTS
    } else {
        &axes.vibes
    };

    let mut combinations = Vec::with_capacity(cap.min(effects.len() * colors.len()));

    'outer: for effect in effects {
        for color in colors {
            for text in texts {
                for vibe in vibes {
                    if combinations.len() >= cap {
                        break 'outer;
                    }
                    combinations.push(VariationSettings {
                        effect_preset: *effect,
                        color_grade: *color,
                        text_style: *text,
                        vibe: *vibe,
                    });
                }
            }
        }
    }

    combinations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cap_is_exact_when_product_exceeds_it() {
        let axes = AxisSelection {
            effects: EffectPreset::ALL.to_vec(),
            colors: ColorGrade::ALL.to_vec(),
            texts: TextStyle::ALL.to_vec(),
            vibes: Vibe::ALL.to_vec(),
        };
        let combos = generate_combinations(&axes, 9);
        assert_eq!(combos.len(), 9);
    }

    #[test]
    fn test_full_product_when_under_cap() {
        let axes = AxisSelection {
            effects: vec![EffectPreset::ZoomBeat, EffectPreset::Crossfade],
            colors: vec![ColorGrade::Vibrant],
            texts: vec![TextStyle::BoldPop],
            vibes: vec![Vibe::Pop, Vibe::Hype],
        };
        let combos = generate_combinations(&axes, 9);
        assert_eq!(combos.len(), 4);

        // All four {effect, vibe} pairs are distinct
        let mut pairs: Vec<_> = combos
            .iter()
            .map(|c| (c.effect_preset, c.vibe))
            .collect();
        pairs.sort_by_key(|(e, v)| (e.as_str(), v.as_str()));
        pairs.dedup();
        assert_eq!(pairs.len(), 4);
    }

    #[test]
    fn test_default_substitution_for_all_empty_axes() {
        let combos = generate_combinations(&AxisSelection::default(), 9);
        // effects default to two entries; every other axis defaults to one
        assert_eq!(combos.len(), 2);
        assert_eq!(combos[0].effect_preset, EffectPreset::ZoomBeat);
        assert_eq!(combos[1].effect_preset, EffectPreset::Crossfade);
        for combo in &combos {
            assert_eq!(combo.color_grade, ColorGrade::Vibrant);
            assert_eq!(combo.text_style, TextStyle::BoldPop);
            assert_eq!(combo.vibe, Vibe::Pop);
        }
    }

    #[test]
    fn test_never_empty() {
        let combos = generate_combinations(&AxisSelection::default(), 1);
        assert_eq!(combos.len(), 1);
    }

    #[test]
    fn test_deterministic_order() {
        let axes = AxisSelection {
            effects: vec![EffectPreset::ShakeCut, EffectPreset::ZoomBeat],
            colors: vec![ColorGrade::Neon, ColorGrade::Mono],
            texts: vec![TextStyle::Typewriter],
            vibes: vec![Vibe::Retro, Vibe::Chill],
        };
        let a = generate_combinations(&axes, 100);
        let b = generate_combinations(&axes, 100);
        assert_eq!(a, b);

        // Effect is the outermost axis, vibe the innermost
        assert_eq!(a[0].effect_preset, EffectPreset::ShakeCut);
        assert_eq!(a[0].vibe, Vibe::Retro);
        assert_eq!(a[1].vibe, Vibe::Chill);
        assert_eq!(a[4].effect_preset, EffectPreset::ZoomBeat);
    }

    #[test]
    fn test_cap_short_circuits_mid_axis() {
        let axes = AxisSelection {
            effects: vec![EffectPreset::ZoomBeat, EffectPreset::Crossfade],
            colors: vec![ColorGrade::Vibrant, ColorGrade::Moody],
            texts: vec![TextStyle::BoldPop],
            vibes: vec![Vibe::Pop],
        };
        let combos = generate_combinations(&axes, 3);
        assert_eq!(combos.len(), 3);
        // The fourth combination (crossfade/moody) was never constructed
        assert_eq!(combos[2].effect_preset, EffectPreset::Crossfade);
        assert_eq!(combos[2].color_grade, ColorGrade::Vibrant);
    }
}

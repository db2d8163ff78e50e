//! Text-encoder tuner.
//!
//! The 32 transformer layers of the SDXL text encoder are split by relative
//! depth into three bands: early layers parse syntax, middle layers carry
//! subject semantics, late layers shape style and composition.

use crate::core::curve::{map_weight, Curve};
use crate::core::emitter::{emit, Target};
use crate::core::keys::{is_fixed_parameter, parse_layer_index};
use crate::core::TunerNode;
use crate::domain::model::{GroupMultiplier, Mode, TuneReport, TunedModel};
use crate::domain::ports::PatchableModel;
use crate::domain::schema::{InputSpec, NodeDescriptor, OutputSpec};
use crate::utils::error::{Result, TunerError};
use crate::utils::validation::{validate_slider, Validate};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Layer count used to normalise layer indices into a depth ratio.
pub const TEXT_ENCODER_LAYERS: u32 = 32;

const SYNTAX_END: f64 = 0.35;
const SEMANTIC_END: f64 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextBand {
    Syntax,
    Semantic,
    Style,
}

impl TextBand {
    pub const ALL: [TextBand; 3] = [TextBand::Syntax, TextBand::Semantic, TextBand::Style];

    pub fn name(self) -> &'static str {
        match self {
            TextBand::Syntax => "Syntax",
            TextBand::Semantic => "Semantic",
            TextBand::Style => "Style",
        }
    }

    pub fn ordinal(self) -> usize {
        self as usize
    }

    /// Input name of the band's slider.
    pub fn slider(self) -> &'static str {
        match self {
            TextBand::Syntax => "syntax_rigidity",
            TextBand::Semantic => "semantic_focus",
            TextBand::Style => "style_abstraction",
        }
    }

    pub fn tooltip(self) -> &'static str {
        match self {
            TextBand::Syntax => "Grammar parsing and token strictness (early layers).",
            TextBand::Semantic => "Subject recognition and action attributes (middle layers).",
            TextBand::Style => "Global composition and artistic interpretation (late layers).",
        }
    }

    /// Band of layer `index`; band edges belong to the lower band.
    pub fn for_layer(index: u32) -> TextBand {
        let ratio = f64::from(index) / f64::from(TEXT_ENCODER_LAYERS);
        if ratio <= SYNTAX_END {
            TextBand::Syntax
        } else if ratio <= SEMANTIC_END {
            TextBand::Semantic
        } else {
            TextBand::Style
        }
    }

    pub fn from_slider(name: &str) -> Option<TextBand> {
        Self::ALL
            .into_iter()
            .find(|b| b.slider() == name || b.name().eq_ignore_ascii_case(name))
    }
}

/// How a text-encoder key is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKeyClass {
    /// Architecture constant; never patched.
    Excluded,
    /// No layer index; follows `base_scale`.
    Untyped,
    Band(TextBand),
}

pub fn classify_text_key(key: &str) -> TextKeyClass {
    if is_fixed_parameter(key) {
        return TextKeyClass::Excluded;
    }
    match parse_layer_index(key) {
        Some(index) => TextKeyClass::Band(TextBand::for_layer(index)),
        None => TextKeyClass::Untyped,
    }
}

/// Slider values for one text-encoder run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipWeights {
    pub mode: Mode,
    pub base_scale: f64,
    pub syntax: f64,
    pub semantic: f64,
    pub style: f64,
}

impl Default for ClipWeights {
    fn default() -> Self {
        Self {
            mode: Mode::SoftValue,
            base_scale: 1.0,
            syntax: 1.0,
            semantic: 1.0,
            style: 1.0,
        }
    }
}

impl ClipWeights {
    pub fn slider(&self, band: TextBand) -> f64 {
        match band {
            TextBand::Syntax => self.syntax,
            TextBand::Semantic => self.semantic,
            TextBand::Style => self.style,
        }
    }

    /// Set a slider by input name (`base_scale`, `syntax_rigidity`, …).
    pub fn set(&mut self, name: &str, value: f64) -> Result<()> {
        if name == "base_scale" {
            self.base_scale = value;
            return Ok(());
        }
        let band = TextBand::from_slider(name).ok_or_else(|| TunerError::UnknownGroupError {
            node: ClipTuner::ID.to_string(),
            name: name.to_string(),
        })?;
        match band {
            TextBand::Syntax => self.syntax = value,
            TextBand::Semantic => self.semantic = value,
            TextBand::Style => self.style = value,
        }
        Ok(())
    }
}

impl Validate for ClipWeights {
    fn validate(&self) -> Result<()> {
        validate_slider("base_scale", self.base_scale)?;
        for band in TextBand::ALL {
            validate_slider(band.slider(), self.slider(band))?;
        }
        Ok(())
    }
}

/// Resolved multipliers for a run.
#[derive(Debug, Clone, Copy, PartialEq)]
struct BandMultipliers {
    base: f64,
    bands: [f64; 3],
}

impl BandMultipliers {
    fn from_weights(weights: &ClipWeights) -> Self {
        let map = |v| map_weight(v, weights.mode, Curve::LinearCompression);
        Self {
            base: map(weights.base_scale),
            bands: TextBand::ALL.map(|b| map(weights.slider(b))),
        }
    }

    fn band(&self, band: TextBand) -> f64 {
        self.bands[band.ordinal()]
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ClipTuner;

impl ClipTuner {
    pub const ID: &'static str = "SdxlClipTuner";
}

impl TunerNode for ClipTuner {
    type Weights = ClipWeights;

    fn descriptor(&self) -> NodeDescriptor {
        let mut inputs = vec![
            InputSpec::Object {
                name: "clip".to_string(),
                kind: "CLIP".to_string(),
            },
            InputSpec::Choice {
                name: "mode".to_string(),
                options: Mode::choices().map(str::to_string).to_vec(),
            },
            InputSpec::slider("base_scale", Some("Global multiplier applied to all layers.")),
        ];
        inputs.extend(
            TextBand::ALL
                .into_iter()
                .map(|b| InputSpec::slider(b.slider(), Some(b.tooltip()))),
        );

        NodeDescriptor {
            id: Self::ID.to_string(),
            display_name: "CLIP Tuner (SDXL)".to_string(),
            category: super::NODE_CATEGORY.to_string(),
            description: "Scales text-encoder layers in three depth bands: syntax, semantics, style."
                .to_string(),
            inputs,
            outputs: vec![OutputSpec::new("CLIP", "CLIP"), OutputSpec::new("info", "STRING")],
        }
    }

    fn tune<M: PatchableModel>(&self, clip: &M, weights: &ClipWeights) -> TunedModel<M> {
        let multipliers = BandMultipliers::from_weights(weights);

        let emission = emit(clip, None, |key| match classify_text_key(key) {
            TextKeyClass::Excluded => None,
            TextKeyClass::Untyped => Some(Target::new("base", multipliers.base)),
            TextKeyClass::Band(band) => Some(Target::new(band.name(), multipliers.band(band))),
        });

        let info = format!(
            "CLIP tuned | Syn: {:.2} | Sem: {:.2} | Sty: {:.2} | Patches: {}",
            multipliers.band(TextBand::Syntax),
            multipliers.band(TextBand::Semantic),
            multipliers.band(TextBand::Style),
            emission.patches.len()
        );
        tracing::info!("{}", info);

        let report = TuneReport {
            node: Self::ID.to_string(),
            mode: weights.mode,
            info,
            base_multiplier: multipliers.base,
            multipliers: TextBand::ALL
                .into_iter()
                .map(|b| GroupMultiplier {
                    name: b.name().to_string(),
                    multiplier: multipliers.band(b),
                })
                .collect(),
            override_used: false,
            keys_seen: emission.keys_seen,
            skipped_neutral: emission.skipped_neutral,
            excluded: emission.excluded,
            patches: emission.patches,
            generated_at: Utc::now(),
        };

        TunedModel {
            model: emission.model,
            report,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_edges() {
        assert_eq!(TextBand::for_layer(0), TextBand::Syntax);
        // 11/32 = 0.34375
        assert_eq!(TextBand::for_layer(11), TextBand::Syntax);
        // 12/32 = 0.375
        assert_eq!(TextBand::for_layer(12), TextBand::Semantic);
        // 24/32 = 0.75 exactly
        assert_eq!(TextBand::for_layer(24), TextBand::Semantic);
        assert_eq!(TextBand::for_layer(25), TextBand::Style);
        assert_eq!(TextBand::for_layer(31), TextBand::Style);
        assert_eq!(TextBand::for_layer(40), TextBand::Style);
    }

    #[test]
    fn test_classify_text_key() {
        assert_eq!(
            classify_text_key("clip_g.transformer.text_model.encoder.layers.0.weight"),
            TextKeyClass::Band(TextBand::Syntax)
        );
        assert_eq!(classify_text_key("logit_scale"), TextKeyClass::Excluded);
        assert_eq!(
            classify_text_key("clip_l.transformer.text_model.embeddings.position_ids"),
            TextKeyClass::Excluded
        );
        assert_eq!(
            classify_text_key("clip_g.transformer.text_model.final_layer_norm.weight"),
            TextKeyClass::Untyped
        );
    }

    #[test]
    fn test_set_by_slider_name() {
        let mut weights = ClipWeights::default();
        weights.set("semantic_focus", 1.4).unwrap();
        weights.set("Style", 0.2).unwrap();
        weights.set("base_scale", 0.9).unwrap();
        assert_eq!(weights.semantic, 1.4);
        assert_eq!(weights.style, 0.2);
        assert_eq!(weights.base_scale, 0.9);
        assert!(weights.set("IN_Layout_Geometry", 1.0).is_err());
    }

    #[test]
    fn test_soft_mode_compresses_bands() {
        let weights = ClipWeights {
            syntax: 2.0,
            style: 0.0,
            ..ClipWeights::default()
        };
        let m = BandMultipliers::from_weights(&weights);
        assert!((m.band(TextBand::Syntax) - 1.2).abs() < 1e-12);
        assert_eq!(m.band(TextBand::Semantic), 1.0);
        assert!((m.band(TextBand::Style) - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_descriptor_lists_sliders_in_order() {
        let names: Vec<String> = ClipTuner
            .descriptor()
            .inputs
            .iter()
            .map(|i| i.name().to_string())
            .collect();
        assert_eq!(
            names,
            ["clip", "mode", "base_scale", "syntax_rigidity", "semantic_focus", "style_abstraction"]
        );
    }
}

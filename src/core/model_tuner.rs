//! Denoiser (UNet) tuner.
//!
//! SDXL's UNet has 19 block slots: input blocks 0-8, the middle block
//! (slot 9) and output blocks 0-8 (slots 10-18). Each slot belongs to
//! exactly one of eleven named groups. Input groups steer layout and
//! composition; output groups steer style, materials, lighting and detail.

use crate::core::curve::{map_weight, Curve};
use crate::core::emitter::{emit, Target};
use crate::core::keys::{parse_block, BlockKind};
use crate::core::TunerNode;
use crate::domain::model::{GroupMultiplier, Mode, TuneReport, TunedModel};
use crate::domain::ports::PatchableModel;
use crate::domain::schema::{InputSpec, NodeDescriptor, OutputSpec};
use crate::utils::error::{Result, TunerError};
use crate::utils::validation::{validate_slider, Validate};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const BLOCK_SLOTS: usize = 19;
/// Blocks on each of the input and output sides.
pub const BLOCKS_PER_SIDE: u32 = 9;
pub const MIDDLE_SLOT: usize = 9;
pub const OUTPUT_SLOT_OFFSET: usize = 10;

/// Prefix of every UNet key in the host's state dict.
pub const DIFFUSION_PREFIX: &str = "diffusion_model.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BlockGroup {
    #[serde(rename = "IN_Layout_Geometry")]
    LayoutGeometry,
    #[serde(rename = "IN_Perspective_Masses")]
    PerspectiveMasses,
    #[serde(rename = "IN_Subject_Identity")]
    SubjectIdentity,
    #[serde(rename = "IN_Global_Composition")]
    GlobalComposition,
    #[serde(rename = "MID_Core_Concept")]
    CoreConcept,
    #[serde(rename = "OUT_Art_Style_Medium")]
    ArtStyleMedium,
    #[serde(rename = "OUT_Material_Substance")]
    MaterialSubstance,
    #[serde(rename = "OUT_Lighting_Atmosphere")]
    LightingAtmosphere,
    #[serde(rename = "OUT_Shadows_Depth")]
    ShadowsDepth,
    #[serde(rename = "OUT_Texture_Details")]
    TextureDetails,
    #[serde(rename = "OUT_Final_Sharpness")]
    FinalSharpness,
}

/// Owning group of each slot.
static SLOT_GROUPS: [BlockGroup; BLOCK_SLOTS] = [
    BlockGroup::LayoutGeometry,
    BlockGroup::LayoutGeometry,
    BlockGroup::PerspectiveMasses,
    BlockGroup::PerspectiveMasses,
    BlockGroup::SubjectIdentity,
    BlockGroup::SubjectIdentity,
    BlockGroup::GlobalComposition,
    BlockGroup::GlobalComposition,
    BlockGroup::GlobalComposition,
    BlockGroup::CoreConcept,
    BlockGroup::ArtStyleMedium,
    BlockGroup::ArtStyleMedium,
    BlockGroup::MaterialSubstance,
    BlockGroup::LightingAtmosphere,
    BlockGroup::LightingAtmosphere,
    BlockGroup::ShadowsDepth,
    BlockGroup::TextureDetails,
    BlockGroup::TextureDetails,
    BlockGroup::FinalSharpness,
];

impl BlockGroup {
    pub const COUNT: usize = 11;

    /// Slider order.
    pub const ALL: [BlockGroup; Self::COUNT] = [
        BlockGroup::LayoutGeometry,
        BlockGroup::PerspectiveMasses,
        BlockGroup::SubjectIdentity,
        BlockGroup::GlobalComposition,
        BlockGroup::CoreConcept,
        BlockGroup::ArtStyleMedium,
        BlockGroup::MaterialSubstance,
        BlockGroup::LightingAtmosphere,
        BlockGroup::ShadowsDepth,
        BlockGroup::TextureDetails,
        BlockGroup::FinalSharpness,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BlockGroup::LayoutGeometry => "IN_Layout_Geometry",
            BlockGroup::PerspectiveMasses => "IN_Perspective_Masses",
            BlockGroup::SubjectIdentity => "IN_Subject_Identity",
            BlockGroup::GlobalComposition => "IN_Global_Composition",
            BlockGroup::CoreConcept => "MID_Core_Concept",
            BlockGroup::ArtStyleMedium => "OUT_Art_Style_Medium",
            BlockGroup::MaterialSubstance => "OUT_Material_Substance",
            BlockGroup::LightingAtmosphere => "OUT_Lighting_Atmosphere",
            BlockGroup::ShadowsDepth => "OUT_Shadows_Depth",
            BlockGroup::TextureDetails => "OUT_Texture_Details",
            BlockGroup::FinalSharpness => "OUT_Final_Sharpness",
        }
    }

    pub fn ordinal(self) -> usize {
        self as usize
    }

    pub fn tooltip(self) -> &'static str {
        match self {
            BlockGroup::LayoutGeometry => "Spatial features and high-resolution layout.",
            BlockGroup::PerspectiveMasses => "Global shapes and perspective.",
            BlockGroup::SubjectIdentity => "Object semantics and structure.",
            BlockGroup::GlobalComposition => "High-level semantic arrangement.",
            BlockGroup::CoreConcept => "Central semantic processing.",
            BlockGroup::ArtStyleMedium => "Artistic style and medium.",
            BlockGroup::MaterialSubstance => "Material properties.",
            BlockGroup::LightingAtmosphere => "Volumetric lighting and atmosphere.",
            BlockGroup::ShadowsDepth => "Contrast and depth perception.",
            BlockGroup::TextureDetails => "High-frequency detail such as texture and fabric.",
            BlockGroup::FinalSharpness => "Final pixel refinement.",
        }
    }

    /// Slots owned by this group, ascending.
    pub fn slots(self) -> impl Iterator<Item = usize> {
        (0..BLOCK_SLOTS).filter(move |&slot| SLOT_GROUPS[slot] == self)
    }

    pub fn for_slot(slot: usize) -> Option<BlockGroup> {
        SLOT_GROUPS.get(slot).copied()
    }

    pub fn from_name(name: &str) -> Option<BlockGroup> {
        Self::ALL.into_iter().find(|g| g.name().eq_ignore_ascii_case(name))
    }
}

/// Short slot label: `IN_0`…`IN_8`, `MID`, `OUT_0`…`OUT_8`.
pub fn slot_label(slot: usize) -> String {
    match slot {
        s if s < MIDDLE_SLOT => format!("IN_{}", s),
        MIDDLE_SLOT => "MID".to_string(),
        s => format!("OUT_{}", s - OUTPUT_SLOT_OFFSET),
    }
}

/// Slot of a UNet key, or `None` when the key follows `base_scale`.
pub fn classify_block_key(key: &str) -> Option<usize> {
    let block = parse_block(key)?;
    let side_slot = |offset: usize| {
        block
            .index
            .filter(|&i| i < BLOCKS_PER_SIDE)
            .map(|i| offset + i as usize)
    };
    match block.kind {
        BlockKind::Input => side_slot(0),
        BlockKind::Middle => Some(MIDDLE_SLOT),
        BlockKind::Output => side_slot(OUTPUT_SLOT_OFFSET),
    }
}

/// Why an override vector was ignored.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OverrideRejection {
    #[error("expected 19 values, found {0}")]
    WrongCount(usize),
    #[error("'{0}' is not a finite number")]
    InvalidToken(String),
}

/// Parsed form of the `vectors_override` input.
#[derive(Debug, Clone, PartialEq)]
pub enum OverrideVector {
    Absent,
    Accepted([f64; BLOCK_SLOTS]),
    Rejected(OverrideRejection),
}

/// Parse a comma-separated list of exactly 19 raw slider values.
///
/// Blank entries are dropped before counting. Rejection is never fatal.
pub fn parse_override(text: &str) -> OverrideVector {
    if text.trim().is_empty() {
        return OverrideVector::Absent;
    }

    let mut values = Vec::with_capacity(BLOCK_SLOTS);
    for token in text.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        match token.parse::<f64>() {
            Ok(v) if v.is_finite() => values.push(v),
            _ => return OverrideVector::Rejected(OverrideRejection::InvalidToken(token.to_string())),
        }
    }

    match <[f64; BLOCK_SLOTS]>::try_from(values.as_slice()) {
        Ok(slots) => OverrideVector::Accepted(slots),
        Err(_) => OverrideVector::Rejected(OverrideRejection::WrongCount(values.len())),
    }
}

/// Slider values for one denoiser run.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelWeights {
    pub mode: Mode,
    pub base_scale: f64,
    pub groups: [f64; BlockGroup::COUNT],
    pub vectors_override: String,
}

impl Default for ModelWeights {
    fn default() -> Self {
        Self {
            mode: Mode::SoftValue,
            base_scale: 1.0,
            groups: [1.0; BlockGroup::COUNT],
            vectors_override: String::new(),
        }
    }
}

impl ModelWeights {
    pub fn group(&self, group: BlockGroup) -> f64 {
        self.groups[group.ordinal()]
    }

    pub fn set_group(&mut self, group: BlockGroup, value: f64) {
        self.groups[group.ordinal()] = value;
    }

    /// Set a slider by input name (`base_scale` or a group name).
    pub fn set(&mut self, name: &str, value: f64) -> Result<()> {
        if name == "base_scale" {
            self.base_scale = value;
            return Ok(());
        }
        let group = BlockGroup::from_name(name).ok_or_else(|| TunerError::UnknownGroupError {
            node: ModelTuner::ID.to_string(),
            name: name.to_string(),
        })?;
        self.set_group(group, value);
        Ok(())
    }
}

impl Validate for ModelWeights {
    fn validate(&self) -> Result<()> {
        validate_slider("base_scale", self.base_scale)?;
        for group in BlockGroup::ALL {
            validate_slider(group.name(), self.group(group))?;
        }
        Ok(())
    }
}

/// Per-slot multipliers and where they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotMultipliers {
    pub slots: [f64; BLOCK_SLOTS],
    pub override_used: bool,
}

impl SlotMultipliers {
    pub fn resolve(weights: &ModelWeights) -> Self {
        let map = |v| map_weight(v, weights.mode, Curve::PiecewiseQuadratic);

        match parse_override(&weights.vectors_override) {
            OverrideVector::Accepted(raw) => {
                return Self {
                    slots: raw.map(map),
                    override_used: true,
                }
            }
            OverrideVector::Rejected(reason) => {
                tracing::warn!("Ignoring block vector override ({}); using group sliders", reason);
            }
            OverrideVector::Absent => {}
        }

        let mut slots = [1.0; BLOCK_SLOTS];
        for group in BlockGroup::ALL {
            let multiplier = map(weights.group(group));
            for slot in group.slots() {
                slots[slot] = multiplier;
            }
        }
        Self {
            slots,
            override_used: false,
        }
    }

    fn label(&self, slot: usize) -> String {
        if self.override_used {
            slot_label(slot)
        } else {
            BlockGroup::for_slot(slot)
                .map(|g| g.name().to_string())
                .unwrap_or_else(|| slot_label(slot))
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ModelTuner;

impl ModelTuner {
    pub const ID: &'static str = "SdxlModelTuner";
}

impl TunerNode for ModelTuner {
    type Weights = ModelWeights;

    fn descriptor(&self) -> NodeDescriptor {
        let mut inputs = vec![
            InputSpec::Object {
                name: "model".to_string(),
                kind: "MODEL".to_string(),
            },
            InputSpec::Choice {
                name: "mode".to_string(),
                options: Mode::choices().map(str::to_string).to_vec(),
            },
            InputSpec::slider(
                "base_scale",
                Some("Global multiplier applied to all blocks before individual tuning."),
            ),
            InputSpec::Text {
                name: "vectors_override".to_string(),
                default: String::new(),
                multiline: false,
                placeholder: format!("Optional: comma-separated list of {} floats.", BLOCK_SLOTS),
            },
        ];
        inputs.extend(
            BlockGroup::ALL
                .into_iter()
                .map(|g| InputSpec::slider(g.name(), Some(g.tooltip()))),
        );

        NodeDescriptor {
            id: Self::ID.to_string(),
            display_name: "Model Tuner (SDXL)".to_string(),
            category: super::NODE_CATEGORY.to_string(),
            description: "Scales UNet block groups: layout and composition on the way down, \
                          style, lighting and detail on the way up."
                .to_string(),
            inputs,
            outputs: vec![OutputSpec::new("MODEL", "MODEL"), OutputSpec::new("info", "STRING")],
        }
    }

    fn tune<M: PatchableModel>(&self, model: &M, weights: &ModelWeights) -> TunedModel<M> {
        let slots = SlotMultipliers::resolve(weights);
        let base = map_weight(weights.base_scale, weights.mode, Curve::PiecewiseQuadratic);

        let emission = emit(model, Some(DIFFUSION_PREFIX), |key| {
            Some(match classify_block_key(key) {
                Some(slot) => Target::new(slots.label(slot), slots.slots[slot]),
                None => Target::new("base", base),
            })
        });

        let info = format!(
            "Model tuned | Mode: {} | Source: {} | Patches: {}",
            weights.mode,
            if slots.override_used { "vector" } else { "sliders" },
            emission.patches.len()
        );
        tracing::info!("{}", info);

        let multipliers = if slots.override_used {
            (0..BLOCK_SLOTS)
                .map(|slot| GroupMultiplier {
                    name: slot_label(slot),
                    multiplier: slots.slots[slot],
                })
                .collect()
        } else {
            BlockGroup::ALL
                .into_iter()
                .filter_map(|g| {
                    g.slots().next().map(|slot| GroupMultiplier {
                        name: g.name().to_string(),
                        multiplier: slots.slots[slot],
                    })
                })
                .collect()
        };

        let report = TuneReport {
            node: Self::ID.to_string(),
            mode: weights.mode,
            info,
            base_multiplier: base,
            multipliers,
            override_used: slots.override_used,
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
    fn test_groups_partition_slots() {
        let mut owned = [0usize; BLOCK_SLOTS];
        for group in BlockGroup::ALL {
            for slot in group.slots() {
                owned[slot] += 1;
            }
        }
        assert!(owned.iter().all(|&n| n == 1));
        assert_eq!(BlockGroup::LayoutGeometry.slots().collect::<Vec<_>>(), [0, 1]);
        assert_eq!(BlockGroup::GlobalComposition.slots().collect::<Vec<_>>(), [6, 7, 8]);
        assert_eq!(BlockGroup::CoreConcept.slots().collect::<Vec<_>>(), [9]);
        assert_eq!(BlockGroup::FinalSharpness.slots().collect::<Vec<_>>(), [18]);
    }

    #[test]
    fn test_classify_block_key() {
        assert_eq!(classify_block_key("diffusion_model.input_blocks.0.0.weight"), Some(0));
        assert_eq!(classify_block_key("diffusion_model.middle_block.2.in_layers.0.bias"), Some(9));
        assert_eq!(classify_block_key("diffusion_model.output_blocks.0.0.skip.weight"), Some(10));
        assert_eq!(classify_block_key("diffusion_model.output_blocks.8.0.emb.weight"), Some(18));
        assert_eq!(classify_block_key("diffusion_model.input_blocks.9.0.weight"), None);
        assert_eq!(classify_block_key("diffusion_model.output_blocks.18.0.weight"), None);
        assert_eq!(classify_block_key("diffusion_model.out.2.weight"), None);
    }

    #[test]
    fn test_slot_labels() {
        assert_eq!(slot_label(0), "IN_0");
        assert_eq!(slot_label(9), "MID");
        assert_eq!(slot_label(18), "OUT_8");
    }

    #[test]
    fn test_parse_override() {
        let ones = vec!["1.0"; BLOCK_SLOTS].join(",");
        assert_eq!(parse_override(&ones), OverrideVector::Accepted([1.0; BLOCK_SLOTS]));
        assert_eq!(parse_override("   "), OverrideVector::Absent);

        let short = vec!["1"; 18].join(",");
        assert_eq!(
            parse_override(&short),
            OverrideVector::Rejected(OverrideRejection::WrongCount(18))
        );

        let padded = format!("{},,  ,", ones);
        assert!(matches!(parse_override(&padded), OverrideVector::Accepted(_)));

        let bad = format!("abc,{}", vec!["1"; 18].join(","));
        assert_eq!(
            parse_override(&bad),
            OverrideVector::Rejected(OverrideRejection::InvalidToken("abc".to_string()))
        );
        assert!(matches!(
            parse_override(&format!("nan,{}", vec!["1"; 18].join(","))),
            OverrideVector::Rejected(OverrideRejection::InvalidToken(_))
        ));
    }

    #[test]
    fn test_rejected_override_falls_back_to_sliders() {
        let mut weights = ModelWeights {
            mode: Mode::RealValue,
            vectors_override: vec!["0.5"; 20].join(","),
            ..ModelWeights::default()
        };
        weights.set_group(BlockGroup::CoreConcept, 1.3);

        let resolved = SlotMultipliers::resolve(&weights);
        assert!(!resolved.override_used);
        assert_eq!(resolved.slots[MIDDLE_SLOT], 1.3);
        assert_eq!(resolved.slots[0], 1.0);
    }

    #[test]
    fn test_accepted_override_goes_through_curve() {
        let weights = ModelWeights {
            vectors_override: vec!["2.0"; BLOCK_SLOTS].join(","),
            ..ModelWeights::default()
        };
        let resolved = SlotMultipliers::resolve(&weights);
        assert!(resolved.override_used);
        assert!(resolved.slots.iter().all(|m| (m - 1.133).abs() < 1e-12));
    }

    #[test]
    fn test_set_unknown_group() {
        let mut weights = ModelWeights::default();
        assert!(weights.set("OUT_Shadows_Depth", 0.7).is_ok());
        assert_eq!(weights.group(BlockGroup::ShadowsDepth), 0.7);
        assert!(weights.set("syntax_rigidity", 1.0).is_err());
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How slider values are turned into multipliers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// Node-specific compression curve.
    #[default]
    #[serde(rename = "soft", alias = "Soft Value")]
    SoftValue,
    /// Slider value used as-is.
    #[serde(rename = "real", alias = "Real Value")]
    RealValue,
}

impl Mode {
    /// Choice label shown by the host widget.
    pub fn label(self) -> &'static str {
        match self {
            Mode::SoftValue => "Soft Value",
            Mode::RealValue => "Real Value",
        }
    }

    pub fn choices() -> [&'static str; 2] {
        [Mode::SoftValue.label(), Mode::RealValue.label()]
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "soft" | "soft value" | "soft_value" => Ok(Mode::SoftValue),
            "real" | "real value" | "real_value" => Ok(Mode::RealValue),
            other => Err(format!("unknown mode '{}', expected 'soft' or 'real'", other)),
        }
    }
}

/// Which tuner node a run targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Text encoder (CLIP) tuner.
    Clip,
    /// Denoiser (UNet) tuner.
    Model,
}

impl FromStr for NodeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clip" | "text-encoder" | "text_encoder" => Ok(NodeKind::Clip),
            "model" | "unet" | "denoiser" => Ok(NodeKind::Model),
            other => Err(format!("unknown node '{}', expected 'clip' or 'model'", other)),
        }
    }
}

/// Effective multiplier for one named group (or block slot).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMultiplier {
    pub name: String,
    pub multiplier: f64,
}

/// One patch handed to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchRecord {
    pub key: String,
    pub target: String,
    pub multiplier: f64,
    pub strength: f64,
}

/// Everything one tuning pass decided.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TuneReport {
    pub node: String,
    pub mode: Mode,
    pub info: String,
    pub base_multiplier: f64,
    pub multipliers: Vec<GroupMultiplier>,
    pub override_used: bool,
    pub keys_seen: usize,
    pub skipped_neutral: usize,
    pub excluded: usize,
    pub patches: Vec<PatchRecord>,
    pub generated_at: DateTime<Utc>,
}

impl TuneReport {
    pub fn patch_count(&self) -> usize {
        self.patches.len()
    }

    pub fn patch_for(&self, key: &str) -> Option<&PatchRecord> {
        self.patches.iter().find(|p| p.key == key)
    }
}

/// The cloned, patched host model together with its report.
#[derive(Debug, Clone)]
pub struct TunedModel<M> {
    pub model: M,
    pub report: TuneReport,
}

impl<M> TunedModel<M> {
    pub fn info(&self) -> &str {
        &self.report.info
    }

    /// The `(model, info)` pair a host node returns.
    pub fn into_outputs(self) -> (M, String) {
        (self.model, self.report.info)
    }
}

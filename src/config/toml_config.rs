use crate::core::clip_tuner::ClipWeights;
use crate::core::model_tuner::ModelWeights;
use crate::domain::model::Mode;
use crate::utils::error::{Result, TunerError};
use crate::utils::validation::Validate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

static ENV_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern"));

/// Tuning presets loaded from a TOML file.
///
/// ```toml
/// [clip]
/// mode = "soft"
/// syntax_rigidity = 1.4
///
/// [model]
/// mode = "real"
/// vectors_override = ""
///
/// [model.groups]
/// OUT_Lighting_Atmosphere = 1.2
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TuneConfig {
    pub clip: Option<ClipSection>,
    pub model: Option<ModelSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClipSection {
    pub mode: Option<Mode>,
    pub base_scale: Option<f64>,
    pub syntax_rigidity: Option<f64>,
    pub semantic_focus: Option<f64>,
    pub style_abstraction: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelSection {
    pub mode: Option<Mode>,
    pub base_scale: Option<f64>,
    pub vectors_override: Option<String>,
    /// Group name to slider value.
    pub groups: Option<BTreeMap<String, f64>>,
}

impl TuneConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content);
        Ok(toml::from_str(&processed)?)
    }

    /// Replace `${NAME}` with the environment variable's value; unset
    /// variables are left as written.
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    /// Text-encoder weights: defaults overlaid with the `[clip]` table.
    pub fn clip_weights(&self) -> ClipWeights {
        let mut weights = ClipWeights::default();
        if let Some(section) = &self.clip {
            if let Some(mode) = section.mode {
                weights.mode = mode;
            }
            let overlay = [
                (&mut weights.base_scale, section.base_scale),
                (&mut weights.syntax, section.syntax_rigidity),
                (&mut weights.semantic, section.semantic_focus),
                (&mut weights.style, section.style_abstraction),
            ];
            for (slot, value) in overlay {
                if let Some(v) = value {
                    *slot = v;
                }
            }
        }
        weights
    }

    /// Denoiser weights: defaults overlaid with the `[model]` table.
    pub fn model_weights(&self) -> Result<ModelWeights> {
        let mut weights = ModelWeights::default();
        let Some(section) = &self.model else {
            return Ok(weights);
        };

        if let Some(mode) = section.mode {
            weights.mode = mode;
        }
        if let Some(base) = section.base_scale {
            weights.base_scale = base;
        }
        if let Some(vector) = &section.vectors_override {
            weights.vectors_override = vector.clone();
        }
        for (name, value) in section.groups.iter().flatten() {
            weights.set(name, *value)?;
        }
        Ok(weights)
    }
}

impl Validate for TuneConfig {
    fn validate(&self) -> Result<()> {
        self.clip_weights().validate()?;
        self.model_weights()?.validate()?;

        if let Some(groups) = self.model.as_ref().and_then(|m| m.groups.as_ref()) {
            if groups.keys().any(|name| name == "base_scale") {
                return Err(TunerError::ConfigValidationError {
                    field: "model.groups".to_string(),
                    message: "base_scale belongs in [model], not [model.groups]".to_string(),
                });
            }
        }
        Ok(())
    }
}

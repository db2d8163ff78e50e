use crate::adapters::report_writer::ReportFormat;
use crate::config::toml_config::TuneConfig;
use crate::core::clip_tuner::ClipWeights;
use crate::core::model_tuner::ModelWeights;
use crate::domain::model::{Mode, NodeKind};
use crate::utils::error::{Result, TunerError};
use crate::utils::validation::{validate_path, validate_slider, Validate};
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "sdxl-tuner")]
#[command(about = "Plan SDXL text-encoder and UNet weight patches against a key inventory")]
pub struct CliConfig {
    /// Node to run: clip or model
    #[arg(long, default_value = "clip")]
    pub node: NodeKind,

    /// Key inventory: one key per line, or a JSON array/object of keys
    #[arg(short, long)]
    pub keys: Option<String>,

    /// TOML file with [clip] / [model] presets
    #[arg(short, long)]
    pub config: Option<String>,

    /// Curve mode: soft or real (overrides the config file)
    #[arg(long)]
    pub mode: Option<Mode>,

    /// Global multiplier slider (overrides the config file)
    #[arg(long)]
    pub base_scale: Option<f64>,

    /// Slider override, repeatable, e.g. --set syntax_rigidity=1.4
    #[arg(long = "set", value_name = "NAME=VALUE")]
    pub set: Vec<String>,

    /// Comma-separated 19-value block vector (model node only)
    #[arg(long)]
    pub vectors: Option<String>,

    /// Report format: text, json or csv
    #[arg(long, default_value = "text")]
    pub format: ReportFormat,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    pub output: Option<String>,

    /// Print the node registry as JSON and exit
    #[arg(long)]
    pub describe: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    fn file_config(&self) -> Result<TuneConfig> {
        match &self.config {
            Some(path) => TuneConfig::from_file(path),
            None => Ok(TuneConfig::default()),
        }
    }

    fn slider_overrides(&self) -> Result<Vec<(String, f64)>> {
        self.set
            .iter()
            .map(|entry| -> Result<(String, f64)> {
                let invalid = |reason: &str| TunerError::InvalidConfigValueError {
                    field: "set".to_string(),
                    value: entry.clone(),
                    reason: reason.to_string(),
                };
                let (name, value) = entry
                    .split_once('=')
                    .ok_or_else(|| invalid("expected NAME=VALUE"))?;
                let value: f64 = value
                    .trim()
                    .parse()
                    .map_err(|_| invalid("value is not a number"))?;
                Ok((name.trim().to_string(), value))
            })
            .collect()
    }

    /// Text-encoder weights: defaults, then the config file, then flags.
    pub fn clip_weights(&self) -> Result<ClipWeights> {
        let mut weights = self.file_config()?.clip_weights();
        if let Some(mode) = self.mode {
            weights.mode = mode;
        }
        if let Some(base) = self.base_scale {
            weights.base_scale = base;
        }
        for (name, value) in self.slider_overrides()? {
            weights.set(&name, value)?;
        }
        Ok(weights)
    }

    /// Denoiser weights: defaults, then the config file, then flags.
    pub fn model_weights(&self) -> Result<ModelWeights> {
        let mut weights = self.file_config()?.model_weights()?;
        if let Some(mode) = self.mode {
            weights.mode = mode;
        }
        if let Some(base) = self.base_scale {
            weights.base_scale = base;
        }
        if let Some(vector) = &self.vectors {
            weights.vectors_override = vector.clone();
        }
        for (name, value) in self.slider_overrides()? {
            weights.set(&name, value)?;
        }
        Ok(weights)
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if self.describe {
            return Ok(());
        }

        let keys = self.keys.as_deref().ok_or_else(|| TunerError::MissingConfigError {
            field: "--keys".to_string(),
        })?;
        validate_path("keys", keys)?;

        if let Some(config) = &self.config {
            validate_path("config", config)?;
        }
        if let Some(output) = &self.output {
            validate_path("output", output)?;
        }
        if let Some(base) = self.base_scale {
            validate_slider("base_scale", base)?;
        }
        if self.vectors.is_some() && self.node == NodeKind::Clip {
            return Err(TunerError::InvalidConfigValueError {
                field: "vectors".to_string(),
                value: self.vectors.clone().unwrap_or_default(),
                reason: "block vectors only apply to the model node".to_string(),
            });
        }
        Ok(())
    }
}

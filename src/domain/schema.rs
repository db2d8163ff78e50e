use serde::{Deserialize, Serialize};

use crate::utils::validation::{SLIDER_MAX, SLIDER_MIN};

/// Slider granularity for every float input.
pub const SLIDER_STEP: f64 = 0.01;

/// What a node declares to the host so it can be registered and drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDescriptor {
    pub id: String,
    pub display_name: String,
    pub category: String,
    pub description: String,
    pub inputs: Vec<InputSpec>,
    pub outputs: Vec<OutputSpec>,
}

impl NodeDescriptor {
    pub fn input(&self, name: &str) -> Option<&InputSpec> {
        self.inputs.iter().find(|i| i.name() == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InputSpec {
    /// A host object such as `MODEL` or `CLIP`.
    Object { name: String, kind: String },
    Choice { name: String, options: Vec<String> },
    Float {
        name: String,
        default: f64,
        min: f64,
        max: f64,
        step: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        tooltip: Option<String>,
    },
    Text {
        name: String,
        default: String,
        multiline: bool,
        placeholder: String,
    },
}

impl InputSpec {
    pub fn name(&self) -> &str {
        match self {
            InputSpec::Object { name, .. }
            | InputSpec::Choice { name, .. }
            | InputSpec::Float { name, .. }
            | InputSpec::Text { name, .. } => name,
        }
    }

    /// Neutral `[0, 2]` slider defaulting to 1.0.
    pub fn slider(name: &str, tooltip: Option<&str>) -> Self {
        InputSpec::Float {
            name: name.to_string(),
            default: 1.0,
            min: SLIDER_MIN,
            max: SLIDER_MAX,
            step: SLIDER_STEP,
            tooltip: tooltip.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSpec {
    pub name: String,
    pub kind: String,
}

impl OutputSpec {
    pub fn new(name: &str, kind: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: kind.to_string(),
        }
    }
}

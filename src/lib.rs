pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::adapters::memory::MemoryModel;
pub use crate::core::clip_tuner::{ClipTuner, ClipWeights};
pub use crate::core::model_tuner::{ModelTuner, ModelWeights};
pub use crate::core::registry::node_registry;
pub use crate::core::TunerNode;
pub use crate::domain::model::{Mode, NodeKind, TuneReport, TunedModel};
pub use crate::domain::ports::PatchableModel;
pub use crate::utils::error::{Result, TunerError};

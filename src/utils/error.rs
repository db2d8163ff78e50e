use thiserror::Error;

#[derive(Error, Debug)]
pub enum TunerError {
    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Unknown group '{name}' for node {node}")]
    UnknownGroupError { node: String, name: String },

    #[error("Key inventory error: {message}")]
    KeyInventoryError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Io,
    Format,
    Configuration,
    Input,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl TunerError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            TunerError::IoError(_) => ErrorCategory::Io,
            TunerError::CsvError(_) | TunerError::SerializationError(_) => ErrorCategory::Format,
            TunerError::TomlError(_)
            | TunerError::ConfigValidationError { .. }
            | TunerError::InvalidConfigValueError { .. }
            | TunerError::MissingConfigError { .. }
            | TunerError::UnknownGroupError { .. } => ErrorCategory::Configuration,
            TunerError::KeyInventoryError { .. } => ErrorCategory::Input,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Io => ErrorSeverity::Critical,
            ErrorCategory::Format => ErrorSeverity::High,
            ErrorCategory::Configuration | ErrorCategory::Input => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            TunerError::IoError(_) => "Check that the file exists and is readable/writable",
            TunerError::CsvError(_) => "Check the output destination and retry",
            TunerError::SerializationError(_) => {
                "Key inventories must be a JSON array of strings or a JSON object"
            }
            TunerError::TomlError(_) | TunerError::ConfigValidationError { .. } => {
                "Make sure the config file is valid TOML with [clip] and/or [model] tables"
            }
            TunerError::InvalidConfigValueError { .. } => {
                "Slider values must lie in [0.0, 2.0]; mode must be 'soft' or 'real'"
            }
            TunerError::MissingConfigError { .. } => "Provide the missing option on the command line",
            TunerError::UnknownGroupError { .. } => {
                "Run with --describe to list the sliders each node accepts"
            }
            TunerError::KeyInventoryError { .. } => {
                "Provide one tensor key per line, or a JSON array/object of keys"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            TunerError::IoError(e) => format!("File access failed: {}", e),
            TunerError::UnknownGroupError { node, name } => {
                format!("The {} node has no slider named '{}'", node, name)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TunerError>;

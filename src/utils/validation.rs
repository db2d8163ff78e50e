use crate::utils::error::{Result, TunerError};

/// Lower bound shared by every slider the nodes declare.
pub const SLIDER_MIN: f64 = 0.0;
/// Upper bound shared by every slider the nodes declare.
pub const SLIDER_MAX: f64 = 2.0;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(TunerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(TunerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    // NaN fails both comparisons, so test for membership instead of exclusion.
    if !(value >= min && value <= max) {
        return Err(TunerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

pub fn validate_slider(field_name: &str, value: f64) -> Result<()> {
    validate_range(field_name, value, SLIDER_MIN, SLIDER_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_slider() {
        assert!(validate_slider("base_scale", 0.0).is_ok());
        assert!(validate_slider("base_scale", 2.0).is_ok());
        assert!(validate_slider("base_scale", 2.01).is_err());
        assert!(validate_slider("base_scale", -0.1).is_err());
        assert!(validate_slider("base_scale", f64::NAN).is_err());
    }

    #[test]
    fn test_validate_path() {
        assert!(validate_path("keys", "keys.txt").is_ok());
        assert!(validate_path("keys", "").is_err());
        assert!(validate_path("keys", "a\0b").is_err());
    }
}

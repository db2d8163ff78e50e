//! Slider-to-multiplier curves.
//!
//! `Mode::RealValue` passes the slider through untouched. `Mode::SoftValue`
//! applies a node-specific curve; the two curves are not interchangeable.

use crate::domain::model::Mode;

/// Compression curve applied in soft mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Curve {
    /// `0.8 + 0.2 * v`: the `[0, 2]` slider becomes `[0.8, 1.2]`.
    LinearCompression,
    /// Downward parabola up to 1.0, then a shallow line above it.
    PiecewiseQuadratic,
}

impl Curve {
    pub fn apply(self, value: f64) -> f64 {
        match self {
            Curve::LinearCompression => 0.8 + 0.2 * value,
            Curve::PiecewiseQuadratic => {
                if value <= 1.0 {
                    (-1.02 * value * value + 2.02 * value).max(0.0)
                } else {
                    1.0 + (value - 1.0) * 0.133
                }
            }
        }
    }
}

/// Effective multiplier for a slider `value` under `mode`.
pub fn map_weight(value: f64, mode: Mode, curve: Curve) -> f64 {
    match mode {
        Mode::RealValue => value,
        Mode::SoftValue => curve.apply(value),
    }
}

//! Velocity transfer function (pointer acceleration)
//!
//! Maps a sensitivity-scaled speed to a gain multiplier. The final
//! per-axis displacement is
//!
//! ```text
//! d = v × m(v × sensitivity) × sensitivity
//! ```
//!
//! # Curves
//!
//! | Curve | m(s) | Use |
//! |-------|------|-----|
//! | Sigmoid | 1 / (1 + e^(-slope·(abs(s) - center))) | Acceleration on |
//! | Linear | 1 | Acceleration off |
//!
//! The sigmoid suppresses micro-movement near zero (jitter rejection) and
//! approaches full gain for deliberate movement. It depends only on the
//! magnitude of its input, so both directions accelerate identically.

use serde::{Deserialize, Serialize};

/// Speed-to-gain mapping
pub trait TransferCurve: Send + Sync {
    /// Gain for a sensitivity-scaled speed, in (0, 1]
    fn multiplier(&self, speed: f64) -> f64;
}

/// Sigmoid tunables
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccelParams {
    /// Speed at which the gain reaches one half
    #[serde(default = "default_center")]
    pub center: f64,

    /// Steepness of the transition
    #[serde(default = "default_slope")]
    pub slope: f64,
}

fn default_center() -> f64 {
    20.0
}
fn default_slope() -> f64 {
    0.15
}

impl Default for AccelParams {
    fn default() -> Self {
        Self {
            center: default_center(),
            slope: default_slope(),
        }
    }
}

/// Logistic acceleration curve
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SigmoidCurve {
    params: AccelParams,
}

impl SigmoidCurve {
    /// Create a curve with explicit parameters
    pub fn new(params: AccelParams) -> Self {
        Self { params }
    }

    /// Active parameters
    pub fn params(&self) -> &AccelParams {
        &self.params
    }
}

impl TransferCurve for SigmoidCurve {
    fn multiplier(&self, speed: f64) -> f64 {
        let x = self.params.slope * (speed.abs() - self.params.center);
        let m = 1.0 / (1.0 + (-x).exp());
        // exp() underflow at extreme inputs would give exactly 0
        m.max(f64::MIN_POSITIVE)
    }
}

/// Constant unit gain (acceleration disabled)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinearCurve;

impl TransferCurve for LinearCurve {
    fn multiplier(&self, _speed: f64) -> f64 {
        1.0
    }
}

/// Per-axis displacement for one velocity component
pub fn displacement(curve: &dyn TransferCurve, velocity: f64, sensitivity: f64) -> f64 {
    velocity * curve.multiplier(velocity * sensitivity) * sensitivity
}

//! Velocity estimation
//!
//! Exponential blend of per-tick displacement with the previous velocity,
//! using the α the adaptive filter chose for the same tick:
//!
//! ```text
//! v = (p - p_prev) · α + (1 - α) · v_prev
//! ```

use crate::tracker::PositionSample;

/// Signed per-tick velocity in tracker units
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Velocity {
    /// Horizontal component
    pub vx: f64,
    /// Vertical component
    pub vy: f64,
}

impl Velocity {
    /// Magnitude of the vector
    pub fn speed(&self) -> f64 {
        self.vx.hypot(self.vy)
    }
}

/// Blends raw displacement into a running velocity
#[derive(Debug, Clone, Default)]
pub struct VelocityEstimator {
    previous: Option<(f64, f64)>,
    velocity: Velocity,
}

impl VelocityEstimator {
    /// Create an estimator with no prior sample
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one raw position and the filter's α for this tick
    ///
    /// Returns `None` on the first sample after a reset: it only seeds the
    /// previous position so a discontinuity never reads as a velocity spike.
    pub fn update(&mut self, sample: &PositionSample, alpha: f64) -> Option<Velocity> {
        let Some((px, py)) = self.previous.replace((sample.x, sample.y)) else {
            return None;
        };

        self.velocity = Velocity {
            vx: (sample.x - px) * alpha + (1.0 - alpha) * self.velocity.vx,
            vy: (sample.y - py) * alpha + (1.0 - alpha) * self.velocity.vy,
        };

        Some(self.velocity)
    }

    /// Last computed velocity
    pub fn velocity(&self) -> Velocity {
        self.velocity
    }

    /// Forget the previous position and velocity
    pub fn reset(&mut self) {
        self.previous = None;
        self.velocity = Velocity::default();
    }
}

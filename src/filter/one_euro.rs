//! One Euro Filter
//!
//! Adaptive low-pass filter: smooth at rest, responsive during motion.
//!
//! # Algorithm
//!
//! ```text
//! dx_hat  = lowpass(dx/dt, d_cutoff)
//! cutoff  = min_cutoff + beta * |dx_hat|
//! α       = 1 / (1 + τ/dt),  τ = 1 / (2π · cutoff)
//! x_hat   = α · x + (1 - α) · x_hat_prev
//! ```
//!
//! The α used for the value is returned alongside it so dependent
//! computations (the velocity blend) share the same time constant.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::trace;

/// Tunables for the adaptive filter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OneEuroParams {
    /// Minimum cutoff frequency (Hz). Lower = smoother at rest.
    #[serde(default = "default_min_cutoff")]
    pub min_cutoff: f64,

    /// Speed coefficient. Higher = less lag during fast motion.
    #[serde(default = "default_beta")]
    pub beta: f64,

    /// Cutoff frequency for the derivative estimate (Hz)
    #[serde(default = "default_d_cutoff")]
    pub d_cutoff: f64,
}

fn default_min_cutoff() -> f64 {
    0.5
}
fn default_beta() -> f64 {
    0.07
}
fn default_d_cutoff() -> f64 {
    1.0
}

impl Default for OneEuroParams {
    fn default() -> Self {
        Self {
            min_cutoff: default_min_cutoff(),
            beta: default_beta(),
            d_cutoff: default_d_cutoff(),
        }
    }
}

/// One filtered sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterOutput {
    /// Filtered value
    pub value: f64,
    /// Blend coefficient applied this tick, in (0, 1]
    pub alpha: f64,
    /// Timestamp did not advance; `value` and `alpha` repeat the previous tick
    pub stale: bool,
}

/// Blend coefficient for a first-order low-pass at `cutoff` Hz over `dt` seconds
pub fn smoothing_factor(dt: f64, cutoff: f64) -> f64 {
    let tau = 1.0 / (2.0 * PI * cutoff);
    1.0 / (1.0 + tau / dt)
}

/// Cutoff frequency for the current derivative estimate
pub fn adaptive_cutoff(params: &OneEuroParams, derivative: f64) -> f64 {
    params.min_cutoff + params.beta * derivative.abs()
}

#[derive(Debug, Clone, Copy)]
struct FilterState {
    value: f64,
    derivative: f64,
    timestamp: f64,
    alpha: f64,
}

/// Stateful one-euro filter over a scalar signal
#[derive(Debug, Clone)]
pub struct OneEuroFilter {
    params: OneEuroParams,
    state: Option<FilterState>,
}

impl OneEuroFilter {
    /// Create a filter with no prior sample
    pub fn new(params: OneEuroParams) -> Self {
        Self {
            params,
            state: None,
        }
    }

    /// Filter one sample taken at `timestamp` seconds
    ///
    /// The first sample after construction or [`reset`](Self::reset) is
    /// returned unfiltered with α = 1. A timestamp that does not advance
    /// returns the previous output marked stale, and leaves the state alone.
    pub fn filter(&mut self, value: f64, timestamp: f64) -> FilterOutput {
        let Some(prev) = self.state else {
            self.state = Some(FilterState {
                value,
                derivative: 0.0,
                timestamp,
                alpha: 1.0,
            });
            return FilterOutput {
                value,
                alpha: 1.0,
                stale: false,
            };
        };

        let dt = timestamp - prev.timestamp;
        if dt <= 0.0 || dt.is_nan() {
            trace!("one-euro: non-increasing timestamp (dt={:.6}), holding", dt);
            return FilterOutput {
                value: prev.value,
                alpha: prev.alpha,
                stale: true,
            };
        }

        let a_d = smoothing_factor(dt, self.params.d_cutoff);
        let dx = (value - prev.value) / dt;
        let dx_hat = a_d * dx + (1.0 - a_d) * prev.derivative;

        let cutoff = adaptive_cutoff(&self.params, dx_hat);
        let alpha = smoothing_factor(dt, cutoff);
        let x_hat = alpha * value + (1.0 - alpha) * prev.value;

        self.state = Some(FilterState {
            value: x_hat,
            derivative: dx_hat,
            timestamp,
            alpha,
        });

        FilterOutput {
            value: x_hat,
            alpha,
            stale: false,
        }
    }

    /// Discard all history
    pub fn reset(&mut self) {
        self.state = None;
    }

    /// Whether a sample has been seen since the last reset
    pub fn is_seeded(&self) -> bool {
        self.state.is_some()
    }

    /// Current derivative estimate (0 before the second sample)
    pub fn derivative(&self) -> f64 {
        self.state.map_or(0.0, |s| s.derivative)
    }

    /// Active parameters
    pub fn params(&self) -> &OneEuroParams {
        &self.params
    }
}

impl Default for OneEuroFilter {
    fn default() -> Self {
        Self::new(OneEuroParams::default())
    }
}

//! Signal filtering
//!
//! Turns the tracker's noisy per-frame position into a velocity the
//! dispatcher can act on.
//!
//! ```text
//! PositionSample
//!   ├─> |p| ──> OneEuroFilter ──> α
//!   └─> p ───────────────────────> VelocityEstimator(α) ──> Velocity
//! ```
//!
//! Both stages are reset together, and only on an explicit tracking
//! restart. Mode toggles leave them untouched.

mod one_euro;
mod velocity;

pub use one_euro::{adaptive_cutoff, smoothing_factor, FilterOutput, OneEuroFilter, OneEuroParams};
pub use velocity::{Velocity, VelocityEstimator};

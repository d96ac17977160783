//! Upstream tracker boundary
//!
//! The face/gesture tracker is an external producer. Once per camera frame
//! it hands the engine one [`TrackerFrame`]: a landmark position with its
//! capture timestamp and the vector of gesture-activation scores. Either
//! part may be missing when the tracker lost the face for that frame.

pub mod replay;

use serde::{Deserialize, Serialize};

/// One landmark position with its capture time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    /// Horizontal position in tracker units
    pub x: f64,
    /// Vertical position in tracker units
    pub y: f64,
    /// Capture time in seconds (monotonic, tracker clock)
    pub timestamp: f64,
}

impl PositionSample {
    /// Create a new sample
    pub fn new(x: f64, y: f64, timestamp: f64) -> Self {
        Self { x, y, timestamp }
    }

    /// Distance from the tracker origin, the scalar the adaptive filter runs on
    pub fn magnitude(&self) -> f64 {
        self.x.hypot(self.y)
    }
}

/// Everything the tracker produced for one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackerFrame {
    /// Landmark position, if a face was found
    pub position: Option<PositionSample>,
    /// Gesture-activation scores, each in [0, 1]
    pub scores: Option<Vec<f32>>,
}

impl TrackerFrame {
    /// Frame with both a position and scores
    pub fn new(position: PositionSample, scores: Vec<f32>) -> Self {
        Self {
            position: Some(position),
            scores: Some(scores),
        }
    }

    /// Frame carrying only a position
    pub fn position_only(position: PositionSample) -> Self {
        Self {
            position: Some(position),
            scores: None,
        }
    }

    /// Frame carrying only gesture scores
    pub fn scores_only(scores: Vec<f32>) -> Self {
        Self {
            position: None,
            scores: Some(scores),
        }
    }

    /// Score at `index`, if present and finite
    pub fn score(&self, index: usize) -> Option<f32> {
        self.scores
            .as_ref()
            .and_then(|s| s.get(index).copied())
            .filter(|s| s.is_finite())
    }
}

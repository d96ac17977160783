//! Gesture state machine
//!
//! Converts a continuous gesture-activation score into the binary pointer
//! mode, with hysteresis so the mode never chatters at the threshold.
//!
//! # Policies
//!
//! | Policy | Enter pointer mode | Leave pointer mode |
//! |--------|--------------------|--------------------|
//! | Toggle | each upward crossing of T flips the mode | (same) |
//! | Hold | s > T | s < T × 0.5 |
//!
//! The toggle latch is set on the upward crossing and cleared only once the
//! score falls back to ≤ T, so a gesture held above T flips the mode once.

use serde::{Deserialize, Serialize};
use tracing::info;

/// Ratio of the hold-policy release threshold to the trigger threshold
pub const HOLD_RELEASE_RATIO: f32 = 0.5;

/// Which way the captured keys are routed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PointerMode {
    /// Designated keys drive pointer emulation
    PointerActive,
    /// Designated keys pass through unchanged
    #[default]
    KeyboardActive,
}

impl PointerMode {
    /// Whether pointer emulation is active
    pub fn is_pointer(&self) -> bool {
        matches!(self, Self::PointerActive)
    }

    /// Mode from the shared boolean flag
    pub fn from_pointer_flag(pointer: bool) -> Self {
        if pointer {
            Self::PointerActive
        } else {
            Self::KeyboardActive
        }
    }

    /// The other mode
    pub fn toggled(&self) -> Self {
        match self {
            Self::PointerActive => Self::KeyboardActive,
            Self::KeyboardActive => Self::PointerActive,
        }
    }
}

impl std::fmt::Display for PointerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PointerActive => write!(f, "pointer"),
            Self::KeyboardActive => write!(f, "keyboard"),
        }
    }
}

/// How the gesture drives the mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TriggerPolicy {
    /// Each gesture flips the mode
    #[default]
    Toggle,
    /// Pointer mode lasts while the gesture is held
    Hold,
}

impl std::fmt::Display for TriggerPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Toggle => write!(f, "toggle"),
            Self::Hold => write!(f, "hold"),
        }
    }
}

impl std::str::FromStr for TriggerPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "toggle" | "switch" => Ok(Self::Toggle),
            "hold" | "momentary" => Ok(Self::Hold),
            _ => Err(format!("Unknown trigger policy: {}", s)),
        }
    }
}

/// Hysteresis state machine over one activation score
#[derive(Debug, Clone, Default)]
pub struct GestureStateMachine {
    mode: PointerMode,
    latched: bool,
}

impl GestureStateMachine {
    /// Start in keyboard mode with the latch clear
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate one score against `threshold`, continuing from `current`
    ///
    /// `current` is the mode as last published in shared state, so a mode
    /// written elsewhere (e.g. forced on stop) is respected. Returns the
    /// new mode.
    pub fn evaluate(
        &mut self,
        current: PointerMode,
        score: f32,
        threshold: f32,
        policy: TriggerPolicy,
    ) -> PointerMode {
        self.mode = current;

        let next = match policy {
            TriggerPolicy::Toggle => {
                if score > threshold && !self.latched {
                    self.latched = true;
                    current.toggled()
                } else {
                    if score <= threshold {
                        self.latched = false;
                    }
                    current
                }
            }
            TriggerPolicy::Hold => match current {
                PointerMode::KeyboardActive if score > threshold => PointerMode::PointerActive,
                PointerMode::PointerActive if score < threshold * HOLD_RELEASE_RATIO => {
                    PointerMode::KeyboardActive
                }
                _ => current,
            },
        };

        if next != current {
            info!(
                "Gesture {} ({:.2} vs {:.2}): {} -> {} mode",
                policy, score, threshold, current, next
            );
        }

        self.mode = next;
        next
    }

    /// Mode after the last evaluation
    pub fn mode(&self) -> PointerMode {
        self.mode
    }

    /// Whether the toggle latch is set
    pub fn is_latched(&self) -> bool {
        self.latched
    }

    /// Clear the toggle latch (policy change)
    pub fn clear_latch(&mut self) {
        self.latched = false;
    }
}

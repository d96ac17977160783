//! Typing-conflict monitor
//!
//! Flags the contradictory state of a user typing text while the captured
//! keys are routed to pointer emulation. The last-typing time is written
//! from the hook context and the warning is a polled predicate; nothing is
//! pushed to the UI.

use crate::controller::shared::SharedState;
use crate::input::keycodes;
use crate::input::KeyState;
use crate::keyboard::hook::KeyEvent;
use std::time::{Duration, Instant};
use tracing::trace;

/// Default decay window for the warning
pub const DEFAULT_TYPING_DECAY: Duration = Duration::from_millis(100);

/// Tracks recent typing while pointer mode is active
#[derive(Debug, Clone, Copy)]
pub struct TypingMonitor {
    decay: Duration,
}

impl TypingMonitor {
    /// Create a monitor with the given decay window
    pub fn new(decay: Duration) -> Self {
        Self { decay }
    }

    /// Decay window
    pub fn decay(&self) -> Duration {
        self.decay
    }

    /// Offer a key transition from the hook context
    ///
    /// Counts as typing only for a key-down outside the reserved control
    /// set, with no shortcut modifier held, while tracking is active and
    /// the mode is pointer. Returns whether it was recorded.
    pub fn observe(&self, shared: &SharedState, event: &KeyEvent, modifier_held: bool) -> bool {
        if event.state != KeyState::Pressed
            || modifier_held
            || keycodes::is_control_key(event.keycode)
            || !shared.is_tracking()
            || !shared.mode().is_pointer()
        {
            return false;
        }

        shared.record_typing(event.timestamp);
        trace!("typing: key {} while pointer mode", event.keycode);
        true
    }

    /// Whether the warning is raised at `now`
    pub fn is_warning_at(&self, shared: &SharedState, now: Instant) -> bool {
        if !shared.is_tracking() || !shared.mode().is_pointer() {
            return false;
        }
        shared
            .last_typing()
            .is_some_and(|last| now.saturating_duration_since(last) < self.decay)
    }

    /// Whether the warning is raised now
    pub fn is_warning(&self, shared: &SharedState) -> bool {
        self.is_warning_at(shared, Instant::now())
    }
}

impl Default for TypingMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_TYPING_DECAY)
    }
}

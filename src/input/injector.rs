//! Host input-injection surface
//!
//! Everything the engine synthesizes (relative pointer motion, pointer
//! buttons, passthrough and arrow keys) leaves the crate through
//! [`InputInjector`]. The update context and the hook context share one
//! injector, so implementations take `&self` and must be `Send + Sync`.

use crate::input::error::Result;
use crate::input::keycodes;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};

/// Pointer buttons the engine can synthesize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerButton {
    /// Left mouse button
    Left,
    /// Middle mouse button
    Middle,
    /// Right mouse button
    Right,
}

impl PointerButton {
    /// All buttons, in held-mask bit order
    pub const ALL: [PointerButton; 3] =
        [PointerButton::Left, PointerButton::Middle, PointerButton::Right];

    /// Convert to Linux button code
    pub fn to_linux_button(&self) -> u32 {
        match self {
            PointerButton::Left => keycodes::BTN_LEFT,
            PointerButton::Middle => keycodes::BTN_MIDDLE,
            PointerButton::Right => keycodes::BTN_RIGHT,
        }
    }

    /// Bit used for this button in the held-button mask
    pub(crate) fn mask(&self) -> u8 {
        match self {
            PointerButton::Left => 0b001,
            PointerButton::Middle => 0b010,
            PointerButton::Right => 0b100,
        }
    }
}

impl std::fmt::Display for PointerButton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Middle => write!(f, "middle"),
            Self::Right => write!(f, "right"),
        }
    }
}

/// Key or button transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyState {
    /// Key released (evdev value 0)
    Released,
    /// Key pressed (evdev value 1)
    Pressed,
    /// Auto-repeat while held (evdev value 2)
    Repeat,
}

impl KeyState {
    /// Convert from the evdev event value
    pub fn from_evdev_value(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Released),
            1 => Some(Self::Pressed),
            2 => Some(Self::Repeat),
            _ => None,
        }
    }

    /// evdev event value for this transition
    pub fn evdev_value(&self) -> i32 {
        match self {
            Self::Released => 0,
            Self::Pressed => 1,
            Self::Repeat => 2,
        }
    }

    /// Pressed or auto-repeat
    pub fn is_down(&self) -> bool {
        !matches!(self, Self::Released)
    }
}

/// Synthetic input sink at the OS boundary
#[cfg_attr(test, mockall::automock)]
pub trait InputInjector: Send + Sync {
    /// Move the pointer by a relative displacement
    fn move_relative(&self, dx: i32, dy: i32) -> Result<()>;

    /// Press or release a pointer button
    fn button(&self, button: PointerButton, pressed: bool) -> Result<()>;

    /// Emit a key transition
    fn key(&self, keycode: u32, state: KeyState) -> Result<()>;
}

/// Injector that only logs what it would emit
///
/// Used by `--dry-run` to exercise the full engine without touching
/// `/dev/uinput`.
#[derive(Debug, Default)]
pub struct LoggingInjector {
    moves: AtomicU64,
    buttons: AtomicU64,
    keys: AtomicU64,
}

impl LoggingInjector {
    /// Create a new logging injector
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of (moves, button transitions, key transitions) logged so far
    pub fn counts(&self) -> (u64, u64, u64) {
        (
            self.moves.load(Ordering::Relaxed),
            self.buttons.load(Ordering::Relaxed),
            self.keys.load(Ordering::Relaxed),
        )
    }
}

impl InputInjector for LoggingInjector {
    fn move_relative(&self, dx: i32, dy: i32) -> Result<()> {
        self.moves.fetch_add(1, Ordering::Relaxed);
        trace!("inject move_relative({}, {})", dx, dy);
        Ok(())
    }

    fn button(&self, button: PointerButton, pressed: bool) -> Result<()> {
        self.buttons.fetch_add(1, Ordering::Relaxed);
        debug!(
            "inject button {} {}",
            button,
            if pressed { "down" } else { "up" }
        );
        Ok(())
    }

    fn key(&self, keycode: u32, state: KeyState) -> Result<()> {
        self.keys.fetch_add(1, Ordering::Relaxed);
        debug!(
            "inject key {} ({}) {:?}",
            keycode,
            keycodes::key_name(keycode),
            state
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_button_to_linux() {
        assert_eq!(PointerButton::Left.to_linux_button(), 0x110);
        assert_eq!(PointerButton::Right.to_linux_button(), 0x111);
        assert_eq!(PointerButton::Middle.to_linux_button(), 0x112);
    }

    #[test]
    fn test_button_masks_are_distinct() {
        let combined = PointerButton::ALL.iter().fold(0u8, |acc, b| acc | b.mask());
        assert_eq!(combined, 0b111);
    }

    #[test]
    fn test_key_state_evdev_values() {
        assert_eq!(KeyState::from_evdev_value(0), Some(KeyState::Released));
        assert_eq!(KeyState::from_evdev_value(1), Some(KeyState::Pressed));
        assert_eq!(KeyState::from_evdev_value(2), Some(KeyState::Repeat));
        assert_eq!(KeyState::from_evdev_value(7), None);

        for state in [KeyState::Released, KeyState::Pressed, KeyState::Repeat] {
            assert_eq!(KeyState::from_evdev_value(state.evdev_value()), Some(state));
        }
    }

    #[test]
    fn test_logging_injector_counts() {
        let injector = LoggingInjector::new();
        injector.move_relative(3, -2).unwrap();
        injector.move_relative(1, 1).unwrap();
        injector.button(PointerButton::Left, true).unwrap();
        injector.key(keycodes::KEY_UP, KeyState::Pressed).unwrap();

        assert_eq!(injector.counts(), (2, 1, 1));
    }
}

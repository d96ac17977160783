//! Keyboard arbitration
//!
//! Runs inside the hook context for every physical key transition and
//! decides whether a designated key drives pointer emulation or passes
//! through unchanged.
//!
//! # Bindings
//!
//! | Key | Action |
//! |-----|--------|
//! | W / A / S / D | Up / Left / Down / Right arrow |
//! | J / K / L | Left / Middle / Right pointer button |
//!
//! # Routing
//!
//! A designated key is remapped only while tracking is active, the mode is
//! pointer and no ctrl/alt/meta is held. Otherwise the native key is
//! suppressed and re-emitted unchanged through the injector, so every
//! consumer sees the same stream whichever way it was routed.
//!
//! A key's release and auto-repeat follow the route its press took. A key
//! pressed as a pointer button and released after the mode switched back
//! still releases the button. A release or repeat with no recorded press is
//! routed by the current bypass condition.

use crate::controller::shared::SharedState;
use crate::input::{keycodes, InputInjector, KeyState, PointerButton, Result};
use crate::keyboard::hook::{HookCallback, HookDecision, KeyEvent};
use crate::keyboard::typing::TypingMonitor;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// What a designated key does in pointer mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyBinding {
    /// Emit this arrow key instead
    Arrow(u32),
    /// Press/release this pointer button
    Button(PointerButton),
}

const BINDINGS: [(u32, KeyBinding); 7] = [
    (keycodes::KEY_W, KeyBinding::Arrow(keycodes::KEY_UP)),
    (keycodes::KEY_A, KeyBinding::Arrow(keycodes::KEY_LEFT)),
    (keycodes::KEY_S, KeyBinding::Arrow(keycodes::KEY_DOWN)),
    (keycodes::KEY_D, KeyBinding::Arrow(keycodes::KEY_RIGHT)),
    (keycodes::KEY_J, KeyBinding::Button(PointerButton::Left)),
    (keycodes::KEY_K, KeyBinding::Button(PointerButton::Middle)),
    (keycodes::KEY_L, KeyBinding::Button(PointerButton::Right)),
];

/// Binding for a designated key, with its slot in the routing mask
fn lookup(keycode: u32) -> Option<(usize, KeyBinding)> {
    BINDINGS
        .iter()
        .position(|(key, _)| *key == keycode)
        .map(|slot| (slot, BINDINGS[slot].1))
}

/// Binding for `keycode`, if it is a designated key
pub fn binding_for(keycode: u32) -> Option<KeyBinding> {
    lookup(keycode).map(|(_, binding)| binding)
}

// Bit per shortcut modifier, indexed by position in this table
const MODIFIERS: [u32; 6] = [
    keycodes::KEY_LEFTCTRL,
    keycodes::KEY_RIGHTCTRL,
    keycodes::KEY_LEFTALT,
    keycodes::KEY_RIGHTALT,
    keycodes::KEY_LEFTMETA,
    keycodes::KEY_RIGHTMETA,
];

/// Why a designated key was passed through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BypassReason {
    /// Tracking is stopped
    NotTracking,
    /// Ctrl, alt or meta held
    Modifier,
    /// Mode is keyboard
    KeyboardMode,
}

/// Key hook callback state
pub struct KeyboardArbiter {
    shared: Arc<SharedState>,
    injector: Arc<dyn InputInjector>,
    typing: TypingMonitor,
    modifiers: AtomicU8,
    // Designated keys whose press was remapped, by binding slot
    remapped: AtomicU8,
    // Designated keys whose press was passed through, by binding slot
    passed: AtomicU8,
}

impl KeyboardArbiter {
    /// Create an arbiter over the shared state and injector
    pub fn new(
        shared: Arc<SharedState>,
        injector: Arc<dyn InputInjector>,
        typing: TypingMonitor,
    ) -> Self {
        Self {
            shared,
            injector,
            typing,
            modifiers: AtomicU8::new(0),
            remapped: AtomicU8::new(0),
            passed: AtomicU8::new(0),
        }
    }

    /// Hook callback bound to this arbiter
    pub fn callback(self: &Arc<Self>) -> HookCallback {
        let arbiter = Arc::clone(self);
        Arc::new(move |event: &KeyEvent| arbiter.handle(event))
    }

    /// Typing monitor fed by this arbiter
    pub fn typing(&self) -> &TypingMonitor {
        &self.typing
    }

    /// Whether a shortcut modifier is currently held
    pub fn modifier_held(&self) -> bool {
        self.modifiers.load(Ordering::Acquire) != 0
    }

    /// Bypass condition for a newly pressed designated key
    pub fn bypass_reason(&self) -> Option<BypassReason> {
        if !self.shared.is_tracking() {
            Some(BypassReason::NotTracking)
        } else if self.modifier_held() {
            Some(BypassReason::Modifier)
        } else if !self.shared.mode().is_pointer() {
            Some(BypassReason::KeyboardMode)
        } else {
            None
        }
    }

    /// Handle one key transition. This is the hook callback.
    pub fn handle(&self, event: &KeyEvent) -> HookDecision {
        // Our own synthesized events must never be re-arbitrated
        if self.shared.is_synthesizing() {
            return HookDecision::Pass;
        }

        self.track_modifier(event);
        self.typing.observe(&self.shared, event, self.modifier_held());

        let Some((slot, binding)) = lookup(event.keycode) else {
            return HookDecision::Pass;
        };
        let bit = 1u8 << slot;

        let remap = match event.state {
            KeyState::Pressed => match self.bypass_reason() {
                Some(reason) => {
                    debug!(
                        "{} pressed, passthrough ({:?})",
                        keycodes::key_name(event.keycode),
                        reason
                    );
                    self.remapped.fetch_and(!bit, Ordering::AcqRel);
                    self.passed.fetch_or(bit, Ordering::AcqRel);
                    false
                }
                None => {
                    self.passed.fetch_and(!bit, Ordering::AcqRel);
                    self.remapped.fetch_or(bit, Ordering::AcqRel);
                    true
                }
            },
            KeyState::Repeat => {
                let remapped = self.remapped.load(Ordering::Acquire) & bit != 0;
                let passed = self.passed.load(Ordering::Acquire) & bit != 0;
                self.follow_press_route(remapped, passed)
            }
            KeyState::Released => {
                let remapped = self.remapped.fetch_and(!bit, Ordering::AcqRel) & bit != 0;
                let passed = self.passed.fetch_and(!bit, Ordering::AcqRel) & bit != 0;
                self.follow_press_route(remapped, passed)
            }
        };

        if remap {
            self.remap(binding, event);
        } else {
            self.passthrough(event);
        }

        HookDecision::Suppress
    }

    /// Route for a repeat or release. Without a recorded press (a duplicate
    /// release, or a key already down when the hook was installed) the
    /// current bypass condition decides, and the remap path is a no-op for
    /// a button that is not held.
    fn follow_press_route(&self, remapped: bool, passed: bool) -> bool {
        if remapped {
            true
        } else if passed {
            false
        } else {
            self.bypass_reason().is_none()
        }
    }

    /// Re-emit the native key unchanged
    fn passthrough(&self, event: &KeyEvent) {
        self.synthesize(keycodes::key_name(event.keycode), || {
            self.injector.key(event.keycode, event.state)
        });
    }

    fn remap(&self, binding: KeyBinding, event: &KeyEvent) {
        match binding {
            KeyBinding::Arrow(arrow) => {
                debug!(
                    "{} -> {} {:?}",
                    keycodes::key_name(event.keycode),
                    keycodes::key_name(arrow),
                    event.state
                );
                self.synthesize(keycodes::key_name(arrow), || {
                    self.injector.key(arrow, event.state)
                });
            }
            KeyBinding::Button(button) => match event.state {
                KeyState::Pressed => self.press_button(button, event),
                KeyState::Released => self.release_button(button),
                // Already held; the button has no repeat
                KeyState::Repeat => {}
            },
        }
    }

    fn press_button(&self, button: PointerButton, event: &KeyEvent) {
        let held = self.shared.held_buttons();
        if !held.try_press(button) {
            debug!("{} button already held", button);
            return;
        }

        let ok = self.synthesize("button press", || self.injector.button(button, true));
        if ok {
            self.shared.record_button_press(event.timestamp);
            debug!("{} button down", button);
        } else {
            // Not actually pressed, so a later release must not fire
            held.try_release(button);
        }
    }

    fn release_button(&self, button: PointerButton) {
        if !self.shared.held_buttons().try_release(button) {
            debug!("{} button already released", button);
            return;
        }
        if self.synthesize("button release", || self.injector.button(button, false)) {
            debug!("{} button up", button);
        }
    }

    /// Run `emit` under the synthesis guard. Returns whether it succeeded.
    fn synthesize<F>(&self, what: &str, emit: F) -> bool
    where
        F: FnOnce() -> Result<()>,
    {
        let _guard = match self.shared.begin_synthesis(what) {
            Ok(guard) => guard,
            Err(e) => {
                error!("{}; event dropped", e);
                return false;
            }
        };

        match emit() {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to synthesize {}: {}", what, e);
                false
            }
        }
    }

    fn track_modifier(&self, event: &KeyEvent) {
        let Some(slot) = MODIFIERS.iter().position(|k| *k == event.keycode) else {
            return;
        };
        let bit = 1u8 << slot;
        if event.state.is_down() {
            self.modifiers.fetch_or(bit, Ordering::AcqRel);
        } else {
            self.modifiers.fetch_and(!bit, Ordering::AcqRel);
        }
    }
}

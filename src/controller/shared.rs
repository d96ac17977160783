//! State shared between the update context and the hook context
//!
//! The two contexts run concurrently with no handoff between them. Every
//! flag they both touch lives here behind accessor methods:
//!
//! - tracking-active, mode and the synthesis guard are atomics; one tick or
//!   one key event of staleness is tolerated because every consumer is
//!   idempotent
//! - held buttons are a bitmask updated with `fetch_or`/`fetch_and`, which
//!   makes press and release exactly-once even if both contexts race
//! - timestamps are nanoseconds since a process-local epoch
//! - runtime-tunable settings sit behind a `RwLock` read once per tick
//!
//! Nothing here blocks except the settings lock, which the hook context
//! never takes.

use crate::gesture::{PointerMode, TriggerPolicy};
use crate::input::{InputError, PointerButton, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::time::{Duration, Instant};

/// Lowest accepted sensitivity
pub const MIN_SENSITIVITY: f64 = 1.0;
/// Highest accepted sensitivity
pub const MAX_SENSITIVITY: f64 = 50.0;

/// Settings the external control layer may change at runtime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlSettings {
    /// Index into the tracker's score vector
    pub gesture_index: usize,
    /// Trigger threshold T
    pub threshold: f32,
    /// Toggle or hold
    pub policy: TriggerPolicy,
    /// Sigmoid acceleration on/off
    pub acceleration: bool,
    /// Pointer gain, within [1, 50]
    pub sensitivity: f64,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            gesture_index: 3,
            threshold: 0.5,
            policy: TriggerPolicy::Toggle,
            acceleration: true,
            sensitivity: 35.0,
        }
    }
}

/// Clamp a requested sensitivity into the accepted range
pub fn clamp_sensitivity(value: f64) -> f64 {
    if value.is_nan() {
        return MIN_SENSITIVITY;
    }
    value.clamp(MIN_SENSITIVITY, MAX_SENSITIVITY)
}

/// Pointer buttons currently held down by synthesis
#[derive(Debug, Default)]
pub struct HeldButtons {
    mask: AtomicU8,
}

impl HeldButtons {
    /// Mark `button` held. Returns `false` if it already was.
    pub fn try_press(&self, button: PointerButton) -> bool {
        let bit = button.mask();
        self.mask.fetch_or(bit, Ordering::AcqRel) & bit == 0
    }

    /// Mark `button` released. Returns `false` if it was not held.
    pub fn try_release(&self, button: PointerButton) -> bool {
        let bit = button.mask();
        self.mask.fetch_and(!bit, Ordering::AcqRel) & bit != 0
    }

    /// Whether `button` is held
    pub fn is_held(&self, button: PointerButton) -> bool {
        self.mask.load(Ordering::Acquire) & button.mask() != 0
    }

    /// Clear the set, returning every button that was held
    pub fn take_all(&self) -> Vec<PointerButton> {
        let previous = self.mask.swap(0, Ordering::AcqRel);
        PointerButton::ALL
            .into_iter()
            .filter(|b| previous & b.mask() != 0)
            .collect()
    }

    /// Buttons currently held
    pub fn held(&self) -> Vec<PointerButton> {
        let mask = self.mask.load(Ordering::Acquire);
        PointerButton::ALL
            .into_iter()
            .filter(|b| mask & b.mask() != 0)
            .collect()
    }
}

/// Held while an event is being synthesized
///
/// Dropping the guard clears the flag.
#[derive(Debug)]
pub struct SynthesisGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for SynthesisGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Thread-safe state shared by both execution contexts
#[derive(Debug)]
pub struct SharedState {
    epoch: Instant,
    tracking_active: AtomicBool,
    pointer_mode: AtomicBool,
    synthesizing: AtomicBool,
    held_buttons: HeldButtons,
    // Nanoseconds since `epoch`, plus one. Zero means never.
    last_button_press: AtomicU64,
    last_typing: AtomicU64,
    settings: RwLock<ControlSettings>,
}

impl SharedState {
    /// Fresh state: tracking stopped, keyboard mode, nothing held
    pub fn new(settings: ControlSettings) -> Self {
        Self {
            epoch: Instant::now(),
            tracking_active: AtomicBool::new(false),
            pointer_mode: AtomicBool::new(false),
            synthesizing: AtomicBool::new(false),
            held_buttons: HeldButtons::default(),
            last_button_press: AtomicU64::new(0),
            last_typing: AtomicU64::new(0),
            settings: RwLock::new(settings),
        }
    }

    /// Whether the tracking subsystem is running
    pub fn is_tracking(&self) -> bool {
        self.tracking_active.load(Ordering::Acquire)
    }

    pub(crate) fn set_tracking(&self, active: bool) {
        self.tracking_active.store(active, Ordering::Release);
    }

    /// Current mode flag
    pub fn mode(&self) -> PointerMode {
        PointerMode::from_pointer_flag(self.pointer_mode.load(Ordering::Acquire))
    }

    pub(crate) fn set_mode(&self, mode: PointerMode) {
        self.pointer_mode.store(mode.is_pointer(), Ordering::Release);
    }

    /// Enter synthesis. Fails if a synthesis is already in progress.
    pub fn begin_synthesis(&self, what: &str) -> Result<SynthesisGuard<'_>> {
        self.synthesizing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| InputError::Reentrant(what.to_string()))?;
        Ok(SynthesisGuard {
            flag: &self.synthesizing,
        })
    }

    /// Whether a synthesis is in progress
    pub fn is_synthesizing(&self) -> bool {
        self.synthesizing.load(Ordering::Acquire)
    }

    /// Held pointer buttons
    pub fn held_buttons(&self) -> &HeldButtons {
        &self.held_buttons
    }

    /// Record a synthesized button press (starts the dead-time window)
    pub fn record_button_press(&self, at: Instant) {
        self.last_button_press.store(self.stamp(at), Ordering::Release);
    }

    /// Time of the last synthesized button press
    pub fn last_button_press(&self) -> Option<Instant> {
        self.instant(self.last_button_press.load(Ordering::Acquire))
    }

    /// Record a typing keystroke
    pub fn record_typing(&self, at: Instant) {
        self.last_typing.store(self.stamp(at), Ordering::Release);
    }

    /// Time of the last typing keystroke
    pub fn last_typing(&self) -> Option<Instant> {
        self.instant(self.last_typing.load(Ordering::Acquire))
    }

    /// Snapshot of the runtime settings
    pub fn settings(&self) -> ControlSettings {
        self.settings.read().clone()
    }

    /// Modify the runtime settings in place
    pub fn update_settings<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&mut ControlSettings) -> T,
    {
        f(&mut self.settings.write())
    }

    fn stamp(&self, at: Instant) -> u64 {
        let nanos = at.saturating_duration_since(self.epoch).as_nanos();
        u64::try_from(nanos).unwrap_or(u64::MAX - 1) + 1
    }

    fn instant(&self, stamp: u64) -> Option<Instant> {
        match stamp {
            0 => None,
            n => Some(self.epoch + Duration::from_nanos(n - 1)),
        }
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new(ControlSettings::default())
    }
}

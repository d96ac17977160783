//! Pointer controller
//!
//! Ties the engine together and exposes the control surface used by an
//! external settings layer.
//!
//! # Execution contexts
//!
//! ```text
//! update context (per tracker frame)         hook context (per key)
//! ──────────────────────────────────         ──────────────────────
//! update(frame)                              KeyboardArbiter::handle
//!   ├─ gesture score ─► GestureStateMachine    ├─ reads mode, tracking
//!   │                      │                   ├─ held-button press/release
//!   │                      ▼                   └─ typing timestamp
//!   │                  SharedState ◄───────────────┘
//!   └─ position ─► OneEuroFilter ─► VelocityEstimator ─► PointerDispatcher
//! ```
//!
//! The motion pipeline sits behind a mutex taken by every tick and by
//! start/stop, so a tick never sees a half-reset filter. The hook context
//! never takes it.

pub mod shared;

use crate::filter::{OneEuroFilter, OneEuroParams, Velocity, VelocityEstimator};
use crate::gesture::{GestureStateMachine, PointerMode, TriggerPolicy};
use crate::input::{InputInjector, PointerButton, Result};
use crate::keyboard::{HookCallback, KeyboardArbiter, TypingMonitor, DEFAULT_TYPING_DECAY};
use crate::pointer::{DispatchGate, DispatchOutcome, DispatcherConfig, PointerDispatcher, SuppressReason};
use crate::tracker::TrackerFrame;
use crate::transfer::{AccelParams, LinearCurve, SigmoidCurve, TransferCurve};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

pub use shared::{
    clamp_sensitivity, ControlSettings, HeldButtons, SharedState, SynthesisGuard,
    MAX_SENSITIVITY, MIN_SENSITIVITY,
};

/// Default step for sensitivity increase/decrease
pub const SENSITIVITY_STEP: f64 = 5.0;

/// Everything needed to build a controller
#[derive(Debug, Clone, Default)]
pub struct ControllerOptions {
    /// Adaptive filter tunables
    pub filter: OneEuroParams,
    /// Acceleration curve tunables
    pub acceleration: AccelParams,
    /// Dispatcher tunables
    pub pointer: DispatcherConfig,
    /// Typing warning decay window
    pub typing_decay: Option<Duration>,
    /// Initial runtime settings
    pub settings: ControlSettings,
}

/// Read-only status snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControllerStatus {
    /// Tracking subsystem running
    pub tracking_active: bool,
    /// Current mode
    pub mode: PointerMode,
    /// Recent typing while in pointer mode
    pub typing_warning: bool,
    /// Buttons currently held by synthesis
    pub held_buttons: Vec<PointerButton>,
    /// Runtime settings
    pub settings: ControlSettings,
}

/// What one update tick did
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// Mode after gesture evaluation
    pub mode: PointerMode,
    /// Velocity computed this tick, if any
    pub velocity: Option<Velocity>,
    /// Dispatcher result
    pub outcome: DispatchOutcome,
}

struct MotionPipeline {
    filter: OneEuroFilter,
    velocity: VelocityEstimator,
    gesture: GestureStateMachine,
    dispatcher: PointerDispatcher,
    sigmoid: SigmoidCurve,
}

impl MotionPipeline {
    fn reset_motion(&mut self) {
        self.filter.reset();
        self.velocity.reset();
        self.dispatcher.clear_remainder();
    }
}

/// Real-time pointer control engine
pub struct PointerController {
    shared: Arc<SharedState>,
    injector: Arc<dyn InputInjector>,
    arbiter: Arc<KeyboardArbiter>,
    pipeline: Mutex<MotionPipeline>,
}

impl PointerController {
    /// Create a controller. Tracking starts stopped, in keyboard mode.
    pub fn new(options: ControllerOptions, injector: Arc<dyn InputInjector>) -> Self {
        let mut settings = options.settings;
        settings.sensitivity = clamp_sensitivity(settings.sensitivity);

        let shared = Arc::new(SharedState::new(settings));
        let typing = TypingMonitor::new(options.typing_decay.unwrap_or(DEFAULT_TYPING_DECAY));
        let arbiter = Arc::new(KeyboardArbiter::new(
            Arc::clone(&shared),
            Arc::clone(&injector),
            typing,
        ));

        let pipeline = MotionPipeline {
            filter: OneEuroFilter::new(options.filter),
            velocity: VelocityEstimator::new(),
            gesture: GestureStateMachine::new(),
            dispatcher: PointerDispatcher::new(options.pointer),
            sigmoid: SigmoidCurve::new(options.acceleration),
        };

        Self {
            shared,
            injector,
            arbiter,
            pipeline: Mutex::new(pipeline),
        }
    }

    /// Shared state
    pub fn shared(&self) -> &Arc<SharedState> {
        &self.shared
    }

    /// Keyboard arbiter for the hook context
    pub fn arbiter(&self) -> &Arc<KeyboardArbiter> {
        &self.arbiter
    }

    /// Hook callback for a [`HookManager`](crate::keyboard::HookManager)
    pub fn hook_callback(&self) -> HookCallback {
        self.arbiter.callback()
    }

    /// Process one tracker frame now
    pub fn update(&self, frame: &TrackerFrame) -> TickReport {
        self.update_at(frame, Instant::now())
    }

    /// Process one tracker frame at `now`
    pub fn update_at(&self, frame: &TrackerFrame, now: Instant) -> TickReport {
        let mut guard = self.pipeline.lock();
        let pipeline = &mut *guard;

        if !self.shared.is_tracking() {
            return TickReport {
                mode: self.shared.mode(),
                velocity: None,
                outcome: DispatchOutcome::Suppressed(SuppressReason::NotTracking),
            };
        }

        let settings = self.shared.settings();

        match frame.score(settings.gesture_index) {
            Some(score) => {
                let mode = pipeline.gesture.evaluate(
                    self.shared.mode(),
                    score,
                    settings.threshold,
                    settings.policy,
                );
                self.shared.set_mode(mode);
            }
            None => trace!("no score at index {}, mode unchanged", settings.gesture_index),
        }
        let mode = self.shared.mode();

        let Some(sample) = frame.position else {
            return TickReport {
                mode,
                velocity: None,
                outcome: DispatchOutcome::Idle,
            };
        };

        let filtered = pipeline.filter.filter(sample.magnitude(), sample.timestamp);
        if filtered.stale {
            trace!("timestamp {:.6} did not advance, frame skipped", sample.timestamp);
            return TickReport {
                mode,
                velocity: None,
                outcome: DispatchOutcome::Idle,
            };
        }
        let Some(velocity) = pipeline.velocity.update(&sample, filtered.alpha) else {
            trace!("first sample after reset, seeding");
            return TickReport {
                mode,
                velocity: None,
                outcome: DispatchOutcome::Idle,
            };
        };

        let curve: &dyn TransferCurve = if settings.acceleration {
            &pipeline.sigmoid
        } else {
            &LinearCurve
        };
        let gate = DispatchGate {
            tracking: true,
            mode,
            last_button_press: self.shared.last_button_press(),
            now,
        };
        let outcome = pipeline.dispatcher.dispatch(
            self.injector.as_ref(),
            curve,
            velocity,
            settings.sensitivity,
            &gate,
        );

        TickReport {
            mode,
            velocity: Some(velocity),
            outcome,
        }
    }

    /// Start (or restart) tracking. Discards all filter history.
    pub fn start_tracking(&self) {
        let mut pipeline = self.pipeline.lock();
        pipeline.reset_motion();
        self.shared.set_tracking(true);
        info!("Tracking started ({} mode)", self.shared.mode());
    }

    /// Stop tracking and release every held button
    ///
    /// Returns the buttons that were released.
    pub fn stop_tracking(&self) -> Vec<PointerButton> {
        let _pipeline = self.pipeline.lock();
        self.shared.set_tracking(false);

        let released = self.shared.held_buttons().take_all();
        for button in &released {
            if let Err(e) = self.injector.button(*button, false) {
                warn!("Failed to release {} button on stop: {}", button, e);
            }
        }

        info!(
            "Tracking stopped ({} held button(s) released)",
            released.len()
        );
        released
    }

    /// Select which score drives the mode
    pub fn set_gesture_index(&self, index: usize) {
        self.shared.update_settings(|s| s.gesture_index = index);
        debug!("Gesture index set to {}", index);
    }

    /// Set the trigger threshold, clamped to [0, 1]. NaN is ignored.
    pub fn set_threshold(&self, threshold: f32) {
        if threshold.is_nan() {
            warn!("Ignoring NaN threshold");
            return;
        }
        let threshold = threshold.clamp(0.0, 1.0);
        self.shared.update_settings(|s| s.threshold = threshold);
        debug!("Threshold set to {:.2}", threshold);
    }

    /// Select the trigger policy. Clears the toggle latch.
    pub fn set_policy(&self, policy: TriggerPolicy) {
        let mut pipeline = self.pipeline.lock();
        pipeline.gesture.clear_latch();
        self.shared.update_settings(|s| s.policy = policy);
        info!("Trigger policy set to {}", policy);
    }

    /// Enable or disable the acceleration curve
    pub fn set_acceleration(&self, enabled: bool) {
        self.shared.update_settings(|s| s.acceleration = enabled);
        debug!(
            "Acceleration {}",
            if enabled { "enabled" } else { "disabled" }
        );
    }

    /// Set the sensitivity, clamped to [1, 50]. Returns the applied value.
    pub fn set_sensitivity(&self, sensitivity: f64) -> f64 {
        let applied = clamp_sensitivity(sensitivity);
        self.shared.update_settings(|s| s.sensitivity = applied);
        debug!("Sensitivity set to {}", applied);
        applied
    }

    /// Raise the sensitivity by `step`. Returns the applied value.
    pub fn increase_sensitivity(&self, step: f64) -> f64 {
        self.step_sensitivity(step.abs())
    }

    /// Lower the sensitivity by `step`. Returns the applied value.
    pub fn decrease_sensitivity(&self, step: f64) -> f64 {
        self.step_sensitivity(-step.abs())
    }

    // Read, step and clamp under one write lock so concurrent steps all land
    fn step_sensitivity(&self, delta: f64) -> f64 {
        let applied = self.shared.update_settings(|s| {
            s.sensitivity = clamp_sensitivity(s.sensitivity + delta);
            s.sensitivity
        });
        debug!("Sensitivity stepped to {}", applied);
        applied
    }

    /// One press and release of `button`
    ///
    /// Returns `Ok(false)` without emitting anything if the button is
    /// already held by the hook.
    pub fn click(&self, button: PointerButton) -> Result<bool> {
        self.click_at(button, Instant::now())
    }

    /// [`click`](Self::click) with an explicit press time
    pub fn click_at(&self, button: PointerButton, now: Instant) -> Result<bool> {
        let held = self.shared.held_buttons();
        if !held.try_press(button) {
            debug!("click: {} button already held", button);
            return Ok(false);
        }

        if let Err(e) = self.injector.button(button, true) {
            held.try_release(button);
            return Err(e);
        }
        self.shared.record_button_press(now);

        let released = held.try_release(button);
        if released {
            self.injector.button(button, false)?;
        }
        debug!("click: {} button", button);
        Ok(true)
    }

    /// Status snapshot at `now`
    pub fn status_at(&self, now: Instant) -> ControllerStatus {
        ControllerStatus {
            tracking_active: self.shared.is_tracking(),
            mode: self.shared.mode(),
            typing_warning: self.arbiter.typing().is_warning_at(&self.shared, now),
            held_buttons: self.shared.held_buttons().held(),
            settings: self.shared.settings(),
        }
    }

    /// Status snapshot now
    pub fn status(&self) -> ControllerStatus {
        self.status_at(Instant::now())
    }
}

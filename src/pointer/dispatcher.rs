//! Pointer dispatcher
//!
//! Turns one tick's velocity into relative pointer motion:
//!
//! ```text
//! velocity ─► transfer curve ─► mirror x ─► accumulator ─► two half moves
//! ```
//!
//! Motion is suppressed while tracking is stopped, while the mode is
//! keyboard, and for a dead time after the last synthesized button press
//! so a click lands where the pointer was aimed.

use crate::filter::Velocity;
use crate::gesture::PointerMode;
use crate::input::InputInjector;
use crate::transfer::{displacement, TransferCurve};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{trace, warn};

/// Dispatcher tunables (`[pointer]` section)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// Motion suppressed for this long after a button press (ms)
    #[serde(default = "default_dead_time_ms")]
    pub dead_time_ms: u64,

    /// Pause between the two half moves (ms). 0 disables the pause.
    #[serde(default = "default_split_delay_ms")]
    pub split_delay_ms: u64,

    /// Mirror the horizontal axis (camera image is mirrored)
    #[serde(default = "default_mirror_x")]
    pub mirror_x: bool,
}

fn default_dead_time_ms() -> u64 {
    150
}
fn default_split_delay_ms() -> u64 {
    10
}
fn default_mirror_x() -> bool {
    true
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            dead_time_ms: default_dead_time_ms(),
            split_delay_ms: default_split_delay_ms(),
            mirror_x: default_mirror_x(),
        }
    }
}

impl DispatcherConfig {
    /// Dead time as a duration
    pub fn dead_time(&self) -> Duration {
        Duration::from_millis(self.dead_time_ms)
    }

    /// Split delay as a duration
    pub fn split_delay(&self) -> Duration {
        Duration::from_millis(self.split_delay_ms)
    }
}

/// Why a tick produced no motion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    /// Tracking is stopped
    NotTracking,
    /// Captured keys are routed to the keyboard
    KeyboardMode,
    /// Within the dead time after a button press
    DeadTime,
}

/// Result of one dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Pointer moved by the total of the emitted half moves
    Moved {
        /// Horizontal pixels
        dx: i32,
        /// Vertical pixels
        dy: i32,
    },
    /// Motion was gated off
    Suppressed(SuppressReason),
    /// Displacement rounded to nothing this tick
    Idle,
    /// The injector rejected a move
    Failed,
}

/// Gate inputs read from shared state for one tick
#[derive(Debug, Clone, Copy)]
pub struct DispatchGate {
    /// Tracking-active flag
    pub tracking: bool,
    /// Mode flag
    pub mode: PointerMode,
    /// Last synthesized button press
    pub last_button_press: Option<Instant>,
    /// Time of this tick
    pub now: Instant,
}

/// Issues relative pointer motion for the update context
#[derive(Debug)]
pub struct PointerDispatcher {
    config: DispatcherConfig,
    accum_x: f64,
    accum_y: f64,
}

impl PointerDispatcher {
    /// Create a dispatcher
    pub fn new(config: DispatcherConfig) -> Self {
        Self {
            config,
            accum_x: 0.0,
            accum_y: 0.0,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Check the gate without moving
    pub fn check_gate(&self, gate: &DispatchGate) -> Option<SuppressReason> {
        if !gate.tracking {
            return Some(SuppressReason::NotTracking);
        }
        if !gate.mode.is_pointer() {
            return Some(SuppressReason::KeyboardMode);
        }
        if let Some(pressed) = gate.last_button_press {
            if gate.now.saturating_duration_since(pressed) < self.config.dead_time() {
                return Some(SuppressReason::DeadTime);
            }
        }
        None
    }

    /// Dispatch one tick of motion
    pub fn dispatch(
        &mut self,
        injector: &dyn InputInjector,
        curve: &dyn TransferCurve,
        velocity: Velocity,
        sensitivity: f64,
        gate: &DispatchGate,
    ) -> DispatchOutcome {
        if let Some(reason) = self.check_gate(gate) {
            self.clear_remainder();
            trace!("dispatch suppressed: {:?}", reason);
            return DispatchOutcome::Suppressed(reason);
        }

        let mut dx = displacement(curve, velocity.vx, sensitivity);
        let dy = displacement(curve, velocity.vy, sensitivity);
        if self.config.mirror_x {
            dx = -dx;
        }
        if !dx.is_finite() || !dy.is_finite() {
            return DispatchOutcome::Idle;
        }

        let first = self.take_step(dx / 2.0, dy / 2.0);
        let second = self.take_step(dx / 2.0, dy / 2.0);

        let mut moved = (0, 0);
        for (i, (sx, sy)) in [first, second].into_iter().enumerate() {
            if sx == 0 && sy == 0 {
                continue;
            }
            if i == 1 && moved != (0, 0) && self.config.split_delay_ms > 0 {
                std::thread::sleep(self.config.split_delay());
            }
            if let Err(e) = injector.move_relative(sx, sy) {
                warn!("Pointer move ({}, {}) failed: {}", sx, sy, e);
                self.clear_remainder();
                return DispatchOutcome::Failed;
            }
            moved.0 += sx;
            moved.1 += sy;
        }

        if moved == (0, 0) {
            return DispatchOutcome::Idle;
        }

        trace!(
            "dispatch v=({:.3}, {:.3}) -> ({}, {})",
            velocity.vx,
            velocity.vy,
            moved.0,
            moved.1
        );
        DispatchOutcome::Moved {
            dx: moved.0,
            dy: moved.1,
        }
    }

    /// Drop any carried sub-pixel motion
    pub fn clear_remainder(&mut self) {
        self.accum_x = 0.0;
        self.accum_y = 0.0;
    }

    fn take_step(&mut self, dx: f64, dy: f64) -> (i32, i32) {
        self.accum_x += dx;
        self.accum_y += dy;

        let step_x = self.accum_x.trunc();
        let step_y = self.accum_y.trunc();
        self.accum_x -= step_x;
        self.accum_y -= step_y;

        (saturate(step_x), saturate(step_y))
    }
}

fn saturate(v: f64) -> i32 {
    v.clamp(i32::MIN as f64, i32::MAX as f64) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{InputError, MockInputInjector};
    use crate::transfer::LinearCurve;
    use mockall::predicate::eq;

    fn dispatcher() -> PointerDispatcher {
        PointerDispatcher::new(DispatcherConfig {
            split_delay_ms: 0,
            mirror_x: false,
            ..Default::default()
        })
    }

    fn open_gate(now: Instant) -> DispatchGate {
        DispatchGate {
            tracking: true,
            mode: PointerMode::PointerActive,
            last_button_press: None,
            now,
        }
    }

    #[test]
    fn test_default_config() {
        let config = DispatcherConfig::default();
        assert_eq!(config.dead_time(), Duration::from_millis(150));
        assert_eq!(config.split_delay(), Duration::from_millis(10));
        assert!(config.mirror_x);
    }

    #[test]
    fn test_emits_two_half_moves() {
        let mut injector = MockInputInjector::new();
        injector
            .expect_move_relative()
            .with(eq(5), eq(-5))
            .times(2)
            .returning(|_, _| Ok(()));

        let mut d = dispatcher();
        let outcome = d.dispatch(
            &injector,
            &LinearCurve,
            Velocity { vx: 1.0, vy: -1.0 },
            10.0,
            &open_gate(Instant::now()),
        );
        assert_eq!(outcome, DispatchOutcome::Moved { dx: 10, dy: -10 });
    }

    #[test]
    fn test_no_motion_when_gated() {
        let injector = MockInputInjector::new();
        let mut d = dispatcher();
        let now = Instant::now();
        let v = Velocity { vx: 3.0, vy: 3.0 };

        let mut gate = open_gate(now);
        gate.tracking = false;
        assert_eq!(
            d.dispatch(&injector, &LinearCurve, v, 10.0, &gate),
            DispatchOutcome::Suppressed(SuppressReason::NotTracking)
        );

        let mut gate = open_gate(now);
        gate.mode = PointerMode::KeyboardActive;
        assert_eq!(
            d.dispatch(&injector, &LinearCurve, v, 10.0, &gate),
            DispatchOutcome::Suppressed(SuppressReason::KeyboardMode)
        );
    }

    #[test]
    fn test_dead_time_after_button_press() {
        let mut injector = MockInputInjector::new();
        injector
            .expect_move_relative()
            .times(2)
            .returning(|_, _| Ok(()));

        let mut d = dispatcher();
        let pressed = Instant::now();
        let v = Velocity { vx: 2.0, vy: 0.0 };

        for ms in [0, 50, 149] {
            let mut gate = open_gate(pressed + Duration::from_millis(ms));
            gate.last_button_press = Some(pressed);
            assert_eq!(
                d.dispatch(&injector, &LinearCurve, v, 10.0, &gate),
                DispatchOutcome::Suppressed(SuppressReason::DeadTime)
            );
        }

        let mut gate = open_gate(pressed + Duration::from_millis(150));
        gate.last_button_press = Some(pressed);
        assert_eq!(
            d.dispatch(&injector, &LinearCurve, v, 10.0, &gate),
            DispatchOutcome::Moved { dx: 20, dy: 0 }
        );
    }

    #[test]
    fn test_sub_pixel_motion_accumulates() {
        let mut injector = MockInputInjector::new();
        injector
            .expect_move_relative()
            .with(eq(1), eq(0))
            .times(1)
            .returning(|_, _| Ok(()));

        let mut d = dispatcher();
        let gate = open_gate(Instant::now());
        let v = Velocity { vx: 0.03, vy: 0.0 };

        // 0.3 px per tick: nothing until the carry reaches a whole pixel
        let outcomes: Vec<_> = (0..4)
            .map(|_| d.dispatch(&injector, &LinearCurve, v, 10.0, &gate))
            .collect();
        assert_eq!(
            outcomes,
            vec![
                DispatchOutcome::Idle,
                DispatchOutcome::Idle,
                DispatchOutcome::Idle,
                DispatchOutcome::Moved { dx: 1, dy: 0 },
            ]
        );
    }

    #[test]
    fn test_mirror_x() {
        let mut injector = MockInputInjector::new();
        injector
            .expect_move_relative()
            .with(eq(-2), eq(2))
            .times(2)
            .returning(|_, _| Ok(()));

        let mut d = PointerDispatcher::new(DispatcherConfig {
            split_delay_ms: 0,
            ..Default::default()
        });
        let outcome = d.dispatch(
            &injector,
            &LinearCurve,
            Velocity { vx: 0.4, vy: 0.4 },
            10.0,
            &open_gate(Instant::now()),
        );
        assert_eq!(outcome, DispatchOutcome::Moved { dx: -4, dy: 4 });
    }

    #[test]
    fn test_injection_failure_is_reported_not_fatal() {
        let mut injector = MockInputInjector::new();
        let mut calls = 0;
        injector.expect_move_relative().returning(move |_, _| {
            calls += 1;
            if calls == 1 {
                Err(InputError::InjectionFailed("device gone".into()))
            } else {
                Ok(())
            }
        });

        let mut d = dispatcher();
        let gate = open_gate(Instant::now());
        let v = Velocity { vx: 1.0, vy: 1.0 };

        assert_eq!(
            d.dispatch(&injector, &LinearCurve, v, 10.0, &gate),
            DispatchOutcome::Failed
        );
        assert_eq!(
            d.dispatch(&injector, &LinearCurve, v, 10.0, &gate),
            DispatchOutcome::Moved { dx: 10, dy: 10 }
        );
    }
}

//! # face-pointer
//!
//! Hands-free pointer control engine for Linux.
//!
//! Turns an upstream tracker's per-frame head position and gesture scores
//! into relative pointer motion, and arbitrates a global keyboard hook so
//! a small set of keys doubles as arrow keys and mouse buttons while the
//! pointer is active.
//!
//! # Architecture
//!
//! ```text
//! face-pointer
//!   ├─> Tracker frames (position + gesture scores, replay or stdin)
//!   │     └─> PointerController (update thread)
//!   │           ├─> OneEuroFilter ──> VelocityEstimator
//!   │           ├─> GestureStateMachine ──> PointerMode
//!   │           └─> PointerDispatcher ──> TransferCurve ──> InputInjector
//!   ├─> Key hook (evdev grab or manual delivery, hook context)
//!   │     └─> KeyboardArbiter ──> TypingMonitor
//!   │           └─> InputInjector (arrows, buttons, bypass re-emission)
//!   └─> SharedState (atomics + settings lock shared by both contexts)
//! ```
//!
//! # Data Flow
//!
//! **Motion Path:** Tracker → Filter → Velocity → Curve → Dispatcher → uinput
//!
//! **Key Path:** Keyboard → Hook → Arbiter → (suppress + remap | pass) → uinput

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Configuration file and CLI overrides
pub mod config;

/// Pointer controller and shared state
///
/// Owns the motion pipeline and the keyboard arbiter, and exposes the
/// control surface (tracking, policy, sensitivity, clicks, status).
pub mod controller;

/// Adaptive smoothing and velocity estimation
pub mod filter;

/// Gesture-driven pointer/keyboard mode switching
pub mod gesture;

/// Input injection and key identities
pub mod input;

/// Global key hook and arbitration
pub mod keyboard;

/// Linux OS boundary (uinput, evdev)
pub mod platform;

/// Velocity to pointer motion
pub mod pointer;

/// Upstream tracker boundary
pub mod tracker;

/// Velocity transfer curves
pub mod transfer;

/// Utility functions
pub mod utils;

pub use config::Config;
pub use controller::PointerController;

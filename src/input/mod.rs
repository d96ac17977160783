//! Input Injection and Key Identity
//!
//! The boundary between the engine and the host input stack.
//!
//! # Architecture
//!
//! ```text
//! PointerDispatcher ──┐
//!                     ├──> InputInjector ──> uinput virtual device
//! KeyboardArbiter  ───┘         │
//!                               └──> LoggingInjector (--dry-run)
//! ```
//!
//! Keys are identified by Linux evdev codes ([`keycodes`]). Errors are
//! classified so per-event injection failures are skipped while device and
//! hook setup failures propagate.

pub mod error;
pub mod injector;
pub mod keycodes;

pub use error::{classify_error, recovery_action, ErrorType, InputError, RecoveryAction, Result};
pub use injector::{InputInjector, KeyState, LoggingInjector, PointerButton};

#[cfg(test)]
pub use injector::MockInputInjector;

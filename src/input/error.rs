//! Input Handling Error Types
//!
//! Error handling for pointer/key injection and the global key hook.
//!
//! Failures fall into two classes. Per-event injection failures are logged
//! and skipped so one missed synthesis never disables the control path.
//! Device and hook setup failures are fatal for the component that hit them.

use thiserror::Error;

/// Result type for input operations
pub type Result<T> = std::result::Result<T, InputError>;

/// Input module error types
#[derive(Error, Debug)]
pub enum InputError {
    /// Injecting a synthesized event into the host failed
    #[error("Input injection failed: {0}")]
    InjectionFailed(String),

    /// Opening or creating an input device failed
    #[error("Input device error ({path}): {reason}")]
    DeviceError {
        /// Device path or name
        path: String,
        /// Failure description
        reason: String,
    },

    /// Grabbing a physical keyboard for exclusive access failed
    #[error("Failed to grab keyboard {0}: is another program holding it?")]
    GrabFailed(String),

    /// A hook backend is already installed on this manager
    #[error("A key hook is already installed")]
    HookAlreadyInstalled,

    /// Hook thread could not be started or joined
    #[error("Key hook error: {0}")]
    HookError(String),

    /// The synthesis guard was already held when a new synthesis started
    #[error("Re-entrant synthesis detected while emitting {0}")]
    Reentrant(String),

    /// Unknown keycode
    #[error("Unknown keycode: {0}")]
    UnknownKeycode(u32),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error classification for recovery strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    /// Per-event injection errors
    Injection,
    /// Device open/create/grab errors
    Device,
    /// Hook lifecycle errors
    Hook,
    /// Re-entrancy guard violations
    Reentrancy,
    /// Translation errors
    Translation,
}

/// Classify error for recovery strategy selection
pub fn classify_error(error: &InputError) -> ErrorType {
    match error {
        InputError::InjectionFailed(_) | InputError::Io(_) => ErrorType::Injection,

        InputError::DeviceError { .. } | InputError::GrabFailed(_) => ErrorType::Device,

        InputError::HookAlreadyInstalled | InputError::HookError(_) => ErrorType::Hook,

        InputError::Reentrant(_) => ErrorType::Reentrancy,

        InputError::UnknownKeycode(_) => ErrorType::Translation,
    }
}

/// Recovery action to take after error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Drop this event and continue with the next one
    Skip,

    /// Fail and propagate error
    Fail,
}

/// Determine recovery action for error
pub fn recovery_action(error: &InputError) -> RecoveryAction {
    match classify_error(error) {
        ErrorType::Injection | ErrorType::Translation | ErrorType::Reentrancy => {
            RecoveryAction::Skip
        }
        ErrorType::Device | ErrorType::Hook => RecoveryAction::Fail,
    }
}

impl InputError {
    /// Whether the event loop that hit this error should keep running
    pub fn is_recoverable(&self) -> bool {
        recovery_action(self) != RecoveryAction::Fail
    }
}

//! Utility Functions
//!
//! User-friendly error formatting for the binary.
//!
//! ## Error Formatting
//!
//! The [`errors`] module turns fatal startup errors into messages with
//! troubleshooting hints:
//!
//! ```rust
//! use face_pointer::utils::format_user_error;
//!
//! let error = anyhow::anyhow!("Input device error (/dev/uinput): Permission denied");
//! eprintln!("{}", format_user_error(&error));
//! ```
//!
//! Error categories with context-aware help:
//! - uinput errors → module loading, device permissions
//! - Keyboard errors → input group membership, competing grabs
//! - Recording errors → expected line format
//! - Config errors → file location, syntax, value ranges

pub mod errors;

pub use errors::format_user_error;

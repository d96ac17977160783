//! Pointer output
//!
//! Rate-limited relative pointer motion driven by the update context.

mod dispatcher;

pub use dispatcher::{
    DispatchGate, DispatchOutcome, DispatcherConfig, PointerDispatcher, SuppressReason,
};

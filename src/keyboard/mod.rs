//! Global keyboard arbitration
//!
//! ```text
//! physical key ─► KeyHookBackend ─► HookManager callback
//!                                        │
//!                                        ▼
//!                                 KeyboardArbiter ─► TypingMonitor
//!                                        │
//!                        ┌───────────────┼────────────────┐
//!                        ▼               ▼                ▼
//!                   passthrough     arrow keys      pointer buttons
//!                        └───────────────┴────────────────┘
//!                                        ▼
//!                                  InputInjector
//! ```

pub mod arbiter;
pub mod hook;
pub mod typing;

pub use arbiter::{binding_for, BypassReason, KeyBinding, KeyboardArbiter};
pub use hook::{
    HookCallback, HookDecision, HookManager, KeyEvent, KeyHookBackend, ManualHookBackend,
    ManualHookHandle,
};
pub use typing::{TypingMonitor, DEFAULT_TYPING_DECAY};

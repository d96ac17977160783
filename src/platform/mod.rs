//! Host OS boundary
//!
//! Linux implementations of the injection surface and the global key
//! hook, built on evdev and uinput:
//!
//! | Concern | Type | Kernel interface |
//! |---------|------|------------------|
//! | Pointer motion, buttons, keys | [`UinputInjector`] | `/dev/uinput` |
//! | Global key hook | [`EvdevGrabHook`] | `/dev/input/event*` + `EVIOCGRAB` |

#[cfg(target_os = "linux")]
mod evdev_hook;
#[cfg(target_os = "linux")]
mod uinput;

#[cfg(target_os = "linux")]
pub use evdev_hook::{find_keyboard, EvdevGrabHook};
#[cfg(target_os = "linux")]
pub use uinput::UinputInjector;

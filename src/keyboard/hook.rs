//! Global key hook lifecycle
//!
//! A [`HookManager`] owns exactly one bound callback and at most one
//! installed [`KeyHookBackend`]. The backend is the OS-specific part: it
//! observes every physical key transition system-wide and invokes the
//! callback from its own context (the hook context), then acts on the
//! returned [`HookDecision`].
//!
//! ```text
//! physical key ─► backend ─► callback(&KeyEvent) ─► Pass | Suppress
//! ```
//!
//! The callback must never block: the host may serialize all key delivery
//! behind it.

use crate::input::{InputError, KeyState, Result};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// One physical key transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// evdev key code
    pub keycode: u32,
    /// Transition
    pub state: KeyState,
    /// When the transition was observed
    pub timestamp: Instant,
}

impl KeyEvent {
    /// Event observed now
    pub fn new(keycode: u32, state: KeyState) -> Self {
        Self::at(keycode, state, Instant::now())
    }

    /// Event observed at `timestamp`
    pub fn at(keycode: u32, state: KeyState, timestamp: Instant) -> Self {
        Self {
            keycode,
            state,
            timestamp,
        }
    }
}

/// What the backend should do with the native event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookDecision {
    /// Deliver the native event unchanged
    Pass,
    /// Swallow the native event (anything needed was synthesized)
    Suppress,
}

/// Callback invoked once per key transition in the hook context
pub type HookCallback = Arc<dyn Fn(&KeyEvent) -> HookDecision + Send + Sync>;

/// OS-specific global key hook
#[cfg_attr(test, mockall::automock)]
pub trait KeyHookBackend: Send {
    /// Start delivering key transitions to `callback`
    fn install(&mut self, callback: HookCallback) -> Result<()>;

    /// Stop delivering key transitions. Must be safe to call when not installed.
    fn uninstall(&mut self) -> Result<()>;

    /// Backend name for logging
    fn name(&self) -> String;
}

/// Owns the hook callback and the active backend
pub struct HookManager {
    callback: HookCallback,
    backend: Option<Box<dyn KeyHookBackend>>,
}

impl HookManager {
    /// Create a manager bound to `callback`
    pub fn new(callback: HookCallback) -> Self {
        Self {
            callback,
            backend: None,
        }
    }

    /// Install `backend`. Fails if one is already installed.
    pub fn install(&mut self, mut backend: Box<dyn KeyHookBackend>) -> Result<()> {
        if self.backend.is_some() {
            return Err(InputError::HookAlreadyInstalled);
        }

        backend.install(Arc::clone(&self.callback))?;
        info!("Key hook installed ({})", backend.name());
        self.backend = Some(backend);
        Ok(())
    }

    /// Uninstall the active backend, if any
    pub fn uninstall(&mut self) -> Result<()> {
        let Some(mut backend) = self.backend.take() else {
            return Ok(());
        };

        backend.uninstall()?;
        info!("Key hook removed ({})", backend.name());
        Ok(())
    }

    /// Whether a backend is active
    pub fn is_installed(&self) -> bool {
        self.backend.is_some()
    }

    /// Invoke the bound callback directly
    pub fn dispatch(&self, event: &KeyEvent) -> HookDecision {
        (self.callback)(event)
    }
}

impl Drop for HookManager {
    fn drop(&mut self) {
        if let Err(e) = self.uninstall() {
            warn!("Failed to remove key hook on drop: {}", e);
        }
    }
}

/// Caller-driven backend
///
/// Key transitions are delivered through a [`ManualHookHandle`] from
/// whatever thread owns it. Used for recording replay and tests.
pub struct ManualHookBackend {
    slot: Arc<RwLock<Option<HookCallback>>>,
}

impl ManualHookBackend {
    /// Create a backend and the handle that feeds it
    pub fn new() -> (Self, ManualHookHandle) {
        let slot = Arc::new(RwLock::new(None));
        (
            Self {
                slot: Arc::clone(&slot),
            },
            ManualHookHandle { slot },
        )
    }
}

impl KeyHookBackend for ManualHookBackend {
    fn install(&mut self, callback: HookCallback) -> Result<()> {
        *self.slot.write() = Some(callback);
        Ok(())
    }

    fn uninstall(&mut self) -> Result<()> {
        self.slot.write().take();
        Ok(())
    }

    fn name(&self) -> String {
        "manual".to_string()
    }
}

/// Delivers key transitions into a [`ManualHookBackend`]
#[derive(Clone)]
pub struct ManualHookHandle {
    slot: Arc<RwLock<Option<HookCallback>>>,
}

impl ManualHookHandle {
    /// Deliver one event. Returns `None` when no hook is installed.
    pub fn deliver(&self, event: &KeyEvent) -> Option<HookDecision> {
        // Clone out so the callback never runs under the lock
        let callback = self.slot.read().clone()?;
        let decision = callback(event);
        debug!(
            "manual hook: key {} {:?} -> {:?}",
            event.keycode, event.state, decision
        );
        Some(decision)
    }

    /// Whether the backend currently has a callback
    pub fn is_installed(&self) -> bool {
        self.slot.read().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::keycodes::KEY_J;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_callback() -> (HookCallback, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let callback: HookCallback = Arc::new(move |_event: &KeyEvent| {
            seen.fetch_add(1, Ordering::SeqCst);
            HookDecision::Suppress
        });
        (callback, count)
    }

    #[test]
    fn test_manual_backend_delivers_while_installed() {
        let (callback, count) = counting_callback();
        let mut manager = HookManager::new(callback);
        let (backend, handle) = ManualHookBackend::new();

        let event = KeyEvent::new(KEY_J, KeyState::Pressed);
        assert_eq!(handle.deliver(&event), None);

        manager.install(Box::new(backend)).unwrap();
        assert!(manager.is_installed());
        assert_eq!(handle.deliver(&event), Some(HookDecision::Suppress));

        manager.uninstall().unwrap();
        assert!(!handle.is_installed());
        assert_eq!(handle.deliver(&event), None);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_second_install_rejected() {
        let (callback, _) = counting_callback();
        let mut manager = HookManager::new(callback);

        let (first, _h1) = ManualHookBackend::new();
        let (second, h2) = ManualHookBackend::new();
        manager.install(Box::new(first)).unwrap();

        let err = manager.install(Box::new(second)).unwrap_err();
        assert!(matches!(err, InputError::HookAlreadyInstalled));
        assert!(!h2.is_installed());
    }

    #[test]
    fn test_uninstall_is_idempotent() {
        let (callback, _) = counting_callback();
        let mut manager = HookManager::new(callback);
        assert!(manager.uninstall().is_ok());

        let (backend, _handle) = ManualHookBackend::new();
        manager.install(Box::new(backend)).unwrap();
        assert!(manager.uninstall().is_ok());
        assert!(manager.uninstall().is_ok());
    }

    #[test]
    fn test_drop_uninstalls_backend() {
        let mut backend = MockKeyHookBackend::new();
        backend.expect_install().times(1).returning(|_| Ok(()));
        backend.expect_uninstall().times(1).returning(|| Ok(()));
        backend.expect_name().returning(|| "mock".to_string());

        let (callback, _) = counting_callback();
        let mut manager = HookManager::new(callback);
        manager.install(Box::new(backend)).unwrap();
        drop(manager);
    }

    #[test]
    fn test_failed_install_leaves_manager_empty() {
        let mut backend = MockKeyHookBackend::new();
        backend
            .expect_install()
            .returning(|_| Err(InputError::GrabFailed("/dev/input/event3".into())));
        backend.expect_uninstall().never();

        let (callback, _) = counting_callback();
        let mut manager = HookManager::new(callback);
        assert!(manager.install(Box::new(backend)).is_err());
        assert!(!manager.is_installed());
    }
}

//! evdev keyboard grab hook
//!
//! Takes exclusive access to one physical keyboard (`EVIOCGRAB`) so no
//! other consumer sees its events, then runs a reader thread that acts as
//! the hook context. Keys the callback passes are re-emitted through the
//! injector; suppressed keys are dropped, the callback having already
//! synthesized whatever replaces them.

use crate::input::{keycodes, InputError, InputInjector, KeyState, Result};
use crate::keyboard::{HookCallback, HookDecision, KeyEvent, KeyHookBackend};
use evdev::{Device, EventType, KeyCode};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

// Reader sleep when the device has nothing queued
const POLL_INTERVAL: Duration = Duration::from_millis(2);

/// Find the first device that looks like a full keyboard
pub fn find_keyboard() -> Result<PathBuf> {
    evdev::enumerate()
        .find(|(_, device)| {
            device.supported_keys().is_some_and(|keys| {
                keys.contains(KeyCode::KEY_A)
                    && keys.contains(KeyCode::KEY_ENTER)
                    && keys.contains(KeyCode::KEY_SPACE)
            })
        })
        .map(|(path, device)| {
            info!(
                "Using keyboard {} ({})",
                path.display(),
                device.name().unwrap_or("unnamed")
            );
            path
        })
        .ok_or_else(|| InputError::DeviceError {
            path: "/dev/input".to_string(),
            reason: "no keyboard found (is the user in the 'input' group?)".to_string(),
        })
}

/// Global key hook over a grabbed evdev keyboard
pub struct EvdevGrabHook {
    path: PathBuf,
    passthrough: Arc<dyn InputInjector>,
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl EvdevGrabHook {
    /// Hook the keyboard at `path`, re-emitting passed keys via `passthrough`
    pub fn new(path: impl AsRef<Path>, passthrough: Arc<dyn InputInjector>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            passthrough,
            running: Arc::new(AtomicBool::new(false)),
            thread: None,
        }
    }

    fn open(&self) -> Result<Device> {
        let display = self.path.display().to_string();
        let mut device = Device::open(&self.path).map_err(|e| InputError::DeviceError {
            path: display.clone(),
            reason: e.to_string(),
        })?;

        device
            .grab()
            .map_err(|_| InputError::GrabFailed(display.clone()))?;
        device.set_nonblocking(true).map_err(|e| InputError::DeviceError {
            path: display,
            reason: e.to_string(),
        })?;

        Ok(device)
    }
}

fn reader_loop(
    mut device: Device,
    callback: HookCallback,
    passthrough: Arc<dyn InputInjector>,
    running: Arc<AtomicBool>,
) {
    while running.load(Ordering::Acquire) {
        let events = match device.fetch_events() {
            Ok(events) => events,
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                thread::sleep(POLL_INTERVAL);
                continue;
            }
            Err(e) => {
                error!("Keyboard read failed, stopping hook: {}", e);
                break;
            }
        };

        for ev in events {
            if ev.event_type() != EventType::KEY {
                continue;
            }
            let Some(state) = KeyState::from_evdev_value(ev.value()) else {
                continue;
            };

            let event = KeyEvent::new(u32::from(ev.code()), state);
            if callback(&event) != HookDecision::Pass {
                continue;
            }
            match passthrough.key(event.keycode, state) {
                Ok(()) => {}
                Err(e) if e.is_recoverable() => warn!(
                    "Failed to forward {} ({}): {}",
                    event.keycode,
                    keycodes::key_name(event.keycode),
                    e
                ),
                Err(e) => {
                    error!("Passthrough device lost, stopping hook: {}", e);
                    running.store(false, Ordering::Release);
                    break;
                }
            }
        }
    }

    if let Err(e) = device.ungrab() {
        debug!("ungrab failed: {}", e);
    }
    running.store(false, Ordering::Release);
}

impl KeyHookBackend for EvdevGrabHook {
    fn install(&mut self, callback: HookCallback) -> Result<()> {
        if self.thread.is_some() {
            return Err(InputError::HookAlreadyInstalled);
        }

        let device = self.open()?;
        self.running.store(true, Ordering::Release);

        let running = Arc::clone(&self.running);
        let passthrough = Arc::clone(&self.passthrough);
        let handle = thread::Builder::new()
            .name("key-hook".to_string())
            .spawn(move || reader_loop(device, callback, passthrough, running))
            .map_err(|e| {
                self.running.store(false, Ordering::Release);
                InputError::HookError(format!("failed to spawn reader thread: {}", e))
            })?;

        self.thread = Some(handle);
        Ok(())
    }

    fn uninstall(&mut self) -> Result<()> {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.thread.take() {
            handle
                .join()
                .map_err(|_| InputError::HookError("reader thread panicked".to_string()))?;
        }
        Ok(())
    }

    fn name(&self) -> String {
        format!("evdev grab {}", self.path.display())
    }
}

impl Drop for EvdevGrabHook {
    fn drop(&mut self) {
        if let Err(e) = self.uninstall() {
            warn!("Failed to release keyboard grab: {}", e);
        }
    }
}

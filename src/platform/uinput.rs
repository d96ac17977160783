//! uinput virtual device injector
//!
//! One virtual device carries everything the engine synthesizes: relative
//! pointer motion, the three pointer buttons and every keyboard key up to
//! `KEY_MAX` (for passthrough of whatever the grabbed keyboard sends). Each call is written as one batch terminated by
//! `SYN_REPORT`.

use crate::input::keycodes;
use crate::input::{InputError, InputInjector, KeyState, PointerButton, Result};
use evdev::uinput::VirtualDevice;
use evdev::{AttributeSet, EventType, InputEvent, KeyCode, RelativeAxisCode, SynchronizationCode};
use parking_lot::Mutex;
use tracing::{debug, info};

/// Injector backed by a uinput virtual device
pub struct UinputInjector {
    device: Mutex<VirtualDevice>,
    name: String,
}

impl UinputInjector {
    /// Create the virtual device. Needs write access to `/dev/uinput`.
    pub fn new(name: &str) -> Result<Self> {
        let device_error = |e: std::io::Error| InputError::DeviceError {
            path: "/dev/uinput".to_string(),
            reason: e.to_string(),
        };

        let mut keys = AttributeSet::<KeyCode>::new();
        for code in keycodes::injectable_keys() {
            keys.insert(KeyCode::new(code as u16));
        }
        for button in PointerButton::ALL {
            keys.insert(KeyCode::new(button.to_linux_button() as u16));
        }

        let mut axes = AttributeSet::<RelativeAxisCode>::new();
        axes.insert(RelativeAxisCode::REL_X);
        axes.insert(RelativeAxisCode::REL_Y);

        let device = VirtualDevice::builder()
            .map_err(device_error)?
            .name(name)
            .with_keys(&keys)
            .map_err(device_error)?
            .with_relative_axes(&axes)
            .map_err(device_error)?
            .build()
            .map_err(device_error)?;

        info!("Created uinput device '{}'", name);

        Ok(Self {
            device: Mutex::new(device),
            name: name.to_string(),
        })
    }

    /// Device name
    pub fn name(&self) -> &str {
        &self.name
    }

    fn emit(&self, events: &[InputEvent]) -> Result<()> {
        self.device
            .lock()
            .emit(events)
            .map_err(|e| InputError::InjectionFailed(e.to_string()))
    }
}

fn syn_report() -> InputEvent {
    InputEvent::new(
        EventType::SYNCHRONIZATION.0,
        SynchronizationCode::SYN_REPORT.0,
        0,
    )
}

impl InputInjector for UinputInjector {
    fn move_relative(&self, dx: i32, dy: i32) -> Result<()> {
        let mut events = Vec::with_capacity(3);
        if dx != 0 {
            events.push(InputEvent::new(
                EventType::RELATIVE.0,
                RelativeAxisCode::REL_X.0,
                dx,
            ));
        }
        if dy != 0 {
            events.push(InputEvent::new(
                EventType::RELATIVE.0,
                RelativeAxisCode::REL_Y.0,
                dy,
            ));
        }
        if events.is_empty() {
            return Ok(());
        }
        events.push(syn_report());
        self.emit(&events)
    }

    fn button(&self, button: PointerButton, pressed: bool) -> Result<()> {
        debug!("uinput button {} {}", button, if pressed { "down" } else { "up" });
        self.emit(&[
            InputEvent::new(
                EventType::KEY.0,
                button.to_linux_button() as u16,
                i32::from(pressed),
            ),
            syn_report(),
        ])
    }

    fn key(&self, keycode: u32, state: KeyState) -> Result<()> {
        if !keycodes::is_injectable_key(keycode) {
            return Err(InputError::UnknownKeycode(keycode));
        }
        self.emit(&[
            InputEvent::new(EventType::KEY.0, keycode as u16, state.evdev_value()),
            syn_report(),
        ])
    }
}

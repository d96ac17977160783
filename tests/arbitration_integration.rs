//! Key arbitration through an installed hook

mod common;

use common::{Injected, RecordingInjector};
use face_pointer::controller::{ControllerOptions, PointerController};
use face_pointer::input::{keycodes, InputError, InputInjector, KeyState, PointerButton, Result};
use face_pointer::keyboard::{
    HookDecision, HookManager, KeyEvent, ManualHookBackend, ManualHookHandle,
};
use face_pointer::tracker::TrackerFrame;
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;

struct Harness {
    controller: Arc<PointerController>,
    hook: HookManager,
    handle: ManualHookHandle,
}

impl Harness {
    fn new(injector: Arc<dyn InputInjector>) -> Self {
        let controller = Arc::new(PointerController::new(
            ControllerOptions::default(),
            injector,
        ));
        let mut hook = HookManager::new(controller.hook_callback());
        let (backend, handle) = ManualHookBackend::new();
        hook.install(Box::new(backend)).unwrap();
        controller.start_tracking();

        Self {
            controller,
            hook,
            handle,
        }
    }

    fn gesture(&self, score: f32) {
        self.controller
            .update(&TrackerFrame::scores_only(vec![0.0, 0.0, 0.0, score]));
    }

    fn press(&self, keycode: u32) -> HookDecision {
        self.send(keycode, KeyState::Pressed)
    }

    fn release(&self, keycode: u32) -> HookDecision {
        self.send(keycode, KeyState::Released)
    }

    fn send(&self, keycode: u32, state: KeyState) -> HookDecision {
        self.handle
            .deliver(&KeyEvent::new(keycode, state))
            .expect("hook installed")
    }
}

#[test]
fn test_keyboard_mode_reemits_native_keys() {
    let injector = RecordingInjector::new();
    let harness = Harness::new(injector.clone());

    assert_eq!(harness.press(keycodes::KEY_W), HookDecision::Suppress);
    assert_eq!(harness.release(keycodes::KEY_W), HookDecision::Suppress);
    assert_eq!(
        injector.events(),
        vec![
            Injected::Key(keycodes::KEY_W, KeyState::Pressed),
            Injected::Key(keycodes::KEY_W, KeyState::Released),
        ]
    );
}

#[test]
fn test_pointer_mode_remaps_movement_keys() {
    let injector = RecordingInjector::new();
    let harness = Harness::new(injector.clone());
    harness.gesture(0.9);

    let expected = [
        (keycodes::KEY_W, keycodes::KEY_UP),
        (keycodes::KEY_A, keycodes::KEY_LEFT),
        (keycodes::KEY_S, keycodes::KEY_DOWN),
        (keycodes::KEY_D, keycodes::KEY_RIGHT),
    ];
    for (key, arrow) in expected {
        injector.clear();
        assert_eq!(harness.press(key), HookDecision::Suppress);
        assert_eq!(harness.send(key, KeyState::Repeat), HookDecision::Suppress);
        assert_eq!(harness.release(key), HookDecision::Suppress);
        assert_eq!(
            injector.events(),
            vec![
                Injected::Key(arrow, KeyState::Pressed),
                Injected::Key(arrow, KeyState::Repeat),
                Injected::Key(arrow, KeyState::Released),
            ]
        );
    }
}

#[test]
fn test_button_keys_press_once() {
    let injector = RecordingInjector::new();
    let harness = Harness::new(injector.clone());
    harness.gesture(0.9);

    let buttons = [
        (keycodes::KEY_J, PointerButton::Left),
        (keycodes::KEY_K, PointerButton::Middle),
        (keycodes::KEY_L, PointerButton::Right),
    ];
    for (key, button) in buttons {
        injector.clear();
        harness.press(key);
        harness.send(key, KeyState::Repeat);
        harness.press(key);
        harness.release(key);
        harness.release(key);
        assert_eq!(
            injector.events(),
            vec![
                Injected::Button(button, true),
                Injected::Button(button, false),
            ]
        );
    }
}

#[test]
fn test_other_keys_pass_untouched() {
    let injector = RecordingInjector::new();
    let harness = Harness::new(injector.clone());
    harness.gesture(0.9);

    assert_eq!(harness.press(keycodes::KEY_Q), HookDecision::Pass);
    assert_eq!(harness.release(keycodes::KEY_Q), HookDecision::Pass);
    assert!(injector.events().is_empty());
}

#[test]
fn test_modifier_bypasses_remap() {
    let injector = RecordingInjector::new();
    let harness = Harness::new(injector.clone());
    harness.gesture(0.9);

    assert_eq!(harness.press(keycodes::KEY_LEFTCTRL), HookDecision::Pass);
    assert_eq!(harness.press(keycodes::KEY_S), HookDecision::Suppress);
    assert_eq!(
        injector.events(),
        vec![Injected::Key(keycodes::KEY_S, KeyState::Pressed)]
    );
}

#[test]
fn test_release_follows_press_route_across_mode_change() {
    let injector = RecordingInjector::new();
    let harness = Harness::new(injector.clone());
    harness.gesture(0.9);

    harness.press(keycodes::KEY_W);
    // Drop below threshold, then toggle back to keyboard
    harness.gesture(0.1);
    harness.gesture(0.9);
    assert!(!harness.controller.status().mode.is_pointer());

    harness.release(keycodes::KEY_W);
    assert_eq!(
        injector.events(),
        vec![
            Injected::Key(keycodes::KEY_UP, KeyState::Pressed),
            Injected::Key(keycodes::KEY_UP, KeyState::Released),
        ]
    );
}

#[test]
fn test_not_tracking_bypasses_remap() {
    let injector = RecordingInjector::new();
    let harness = Harness::new(injector.clone());
    harness.gesture(0.9);
    harness.controller.stop_tracking();

    harness.press(keycodes::KEY_D);
    assert_eq!(
        injector.events(),
        vec![Injected::Key(keycodes::KEY_D, KeyState::Pressed)]
    );
}

/// Feeds every synthesized key straight back into the hook, like an OS
/// hook that sees injected events
#[derive(Default)]
struct LoopbackInjector {
    handle: Mutex<Option<ManualHookHandle>>,
    nested: Mutex<Vec<HookDecision>>,
    keys: Mutex<Vec<(u32, KeyState)>>,
}

impl InputInjector for LoopbackInjector {
    fn move_relative(&self, _dx: i32, _dy: i32) -> Result<()> {
        Ok(())
    }

    fn button(&self, _button: PointerButton, _pressed: bool) -> Result<()> {
        Ok(())
    }

    fn key(&self, keycode: u32, state: KeyState) -> Result<()> {
        self.keys.lock().push((keycode, state));
        let handle = self.handle.lock().clone();
        if let Some(handle) = handle {
            if let Some(decision) = handle.deliver(&KeyEvent::new(keycode, state)) {
                self.nested.lock().push(decision);
            }
        }
        Ok(())
    }
}

#[test]
fn test_synthesized_keys_are_not_rearbitrated() {
    let injector = Arc::new(LoopbackInjector::default());
    let harness = Harness::new(injector.clone());
    *injector.handle.lock() = Some(harness.handle.clone());
    harness.gesture(0.9);

    assert_eq!(harness.press(keycodes::KEY_W), HookDecision::Suppress);

    assert_eq!(*injector.nested.lock(), vec![HookDecision::Pass]);
    assert_eq!(
        *injector.keys.lock(),
        vec![(keycodes::KEY_UP, KeyState::Pressed)]
    );
    assert!(!harness.controller.shared().is_synthesizing());
}

#[test]
fn test_second_install_rejected() {
    let injector = RecordingInjector::new();
    let mut harness = Harness::new(injector);

    let (backend, _handle) = ManualHookBackend::new();
    let err = harness.hook.install(Box::new(backend)).unwrap_err();
    assert!(matches!(err, InputError::HookAlreadyInstalled));

    // The first hook still delivers
    assert!(harness.handle.is_installed());
}

#[test]
fn test_uninstall_stops_delivery() {
    let injector = RecordingInjector::new();
    let mut harness = Harness::new(injector);

    harness.hook.uninstall().unwrap();
    harness.hook.uninstall().unwrap();
    assert!(!harness.hook.is_installed());
    assert!(harness
        .handle
        .deliver(&KeyEvent::new(keycodes::KEY_W, KeyState::Pressed))
        .is_none());
}

#[test]
fn test_concurrent_hook_and_update_contexts() {
    let injector = RecordingInjector::new();
    let harness = Harness::new(injector.clone());
    harness.gesture(0.9);

    let handle = harness.handle.clone();
    let keys = thread::spawn(move || {
        for _ in 0..200 {
            handle.deliver(&KeyEvent::new(keycodes::KEY_J, KeyState::Pressed));
            handle.deliver(&KeyEvent::new(keycodes::KEY_J, KeyState::Released));
        }
    });

    for _ in 0..200 {
        harness.gesture(0.9);
    }
    keys.join().unwrap();

    let events = injector.events();
    let presses = events
        .iter()
        .filter(|e| **e == Injected::Button(PointerButton::Left, true))
        .count();
    let releases = events
        .iter()
        .filter(|e| **e == Injected::Button(PointerButton::Left, false))
        .count();
    assert_eq!(presses, 200);
    assert_eq!(presses, releases);
    assert!(harness.controller.status().held_buttons.is_empty());
}

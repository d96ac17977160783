//! Controller behaviour through the public API

mod common;

use common::{Injected, RecordingInjector};
use face_pointer::controller::{ControllerOptions, PointerController, SENSITIVITY_STEP};
use face_pointer::gesture::{PointerMode, TriggerPolicy};
use face_pointer::input::{keycodes, KeyState, PointerButton};
use face_pointer::keyboard::{HookDecision, HookManager, KeyEvent, ManualHookBackend};
use face_pointer::pointer::{DispatchOutcome, SuppressReason};
use face_pointer::tracker::{PositionSample, TrackerFrame};
use std::sync::Arc;
use std::time::{Duration, Instant};

const DT: f64 = 1.0 / 30.0;

fn controller(injector: &Arc<RecordingInjector>) -> PointerController {
    let mut options = ControllerOptions::default();
    options.pointer.split_delay_ms = 0;
    PointerController::new(options, injector.clone())
}

fn frame(x: f64, y: f64, t: f64, score: f32) -> TrackerFrame {
    TrackerFrame::new(PositionSample::new(x, y, t), vec![0.0, 0.0, 0.0, score])
}

/// Enter pointer mode with one seeding frame at the origin of the path
fn enter_pointer_mode(controller: &PointerController, now: Instant) {
    controller.start_tracking();
    let report = controller.update_at(&frame(100.0, 100.0, 0.0, 0.9), now);
    assert_eq!(report.mode, PointerMode::PointerActive);
    assert_eq!(report.outcome, DispatchOutcome::Idle);
}

#[test]
fn test_no_motion_before_tracking_starts() {
    let injector = RecordingInjector::new();
    let controller = controller(&injector);

    let report = controller.update(&frame(100.0, 100.0, 0.0, 0.9));
    assert_eq!(
        report.outcome,
        DispatchOutcome::Suppressed(SuppressReason::NotTracking)
    );
    assert_eq!(report.mode, PointerMode::KeyboardActive);
    assert!(injector.events().is_empty());
}

#[test]
fn test_keyboard_mode_suppresses_motion() {
    let injector = RecordingInjector::new();
    let controller = controller(&injector);
    controller.start_tracking();

    let now = Instant::now();
    controller.update_at(&frame(100.0, 100.0, 0.0, 0.1), now);
    let report = controller.update_at(&frame(130.0, 100.0, DT, 0.1), now);

    assert_eq!(report.mode, PointerMode::KeyboardActive);
    assert!(report.velocity.is_some());
    assert_eq!(
        report.outcome,
        DispatchOutcome::Suppressed(SuppressReason::KeyboardMode)
    );
    assert!(injector.moves().is_empty());
}

#[test]
fn test_pointer_motion_is_mirrored_and_split() {
    let injector = RecordingInjector::new();
    let controller = controller(&injector);
    let now = Instant::now();
    enter_pointer_mode(&controller, now);

    let report = controller.update_at(&frame(110.0, 100.0, DT, 0.9), now);
    let DispatchOutcome::Moved { dx, dy } = report.outcome else {
        panic!("Expected motion, got {:?}", report.outcome);
    };

    // Head moved right, pointer moves left
    assert!(dx < 0);
    assert_eq!(dy, 0);

    let moves = injector.moves();
    assert_eq!(moves.len(), 2);
    assert_eq!(moves[0].0 + moves[1].0, dx);
    assert!((moves[0].0 - moves[1].0).abs() <= 1);
}

#[test]
fn test_dead_time_after_click() {
    let injector = RecordingInjector::new();
    let controller = controller(&injector);
    let now = Instant::now();
    enter_pointer_mode(&controller, now);

    assert!(controller.click_at(PointerButton::Left, now).unwrap());
    assert_eq!(
        injector.events(),
        vec![
            Injected::Button(PointerButton::Left, true),
            Injected::Button(PointerButton::Left, false),
        ]
    );
    injector.clear();

    let report = controller.update_at(
        &frame(110.0, 100.0, DT, 0.9),
        now + Duration::from_millis(50),
    );
    assert_eq!(
        report.outcome,
        DispatchOutcome::Suppressed(SuppressReason::DeadTime)
    );
    assert!(injector.moves().is_empty());

    let report = controller.update_at(
        &frame(130.0, 100.0, 2.0 * DT, 0.9),
        now + Duration::from_millis(150),
    );
    assert!(matches!(report.outcome, DispatchOutcome::Moved { .. }));
    assert!(!injector.moves().is_empty());
}

#[test]
fn test_failed_move_then_recovery() {
    let injector = RecordingInjector::new();
    let controller = controller(&injector);
    let now = Instant::now();
    enter_pointer_mode(&controller, now);

    injector.set_fail_moves(true);
    let report = controller.update_at(&frame(110.0, 100.0, DT, 0.9), now);
    assert_eq!(report.outcome, DispatchOutcome::Failed);

    injector.set_fail_moves(false);
    let report = controller.update_at(&frame(130.0, 100.0, 2.0 * DT, 0.9), now);
    assert!(matches!(report.outcome, DispatchOutcome::Moved { .. }));
}

#[test]
fn test_restart_discards_filter_history() {
    let injector = RecordingInjector::new();
    let controller = controller(&injector);
    let now = Instant::now();
    enter_pointer_mode(&controller, now);
    controller.update_at(&frame(110.0, 100.0, DT, 0.9), now);

    controller.stop_tracking();
    controller.start_tracking();

    // First sample after a restart only seeds
    let report = controller.update_at(&frame(400.0, 400.0, 5.0, 0.9), now);
    assert_eq!(report.velocity, None);
    assert_eq!(report.outcome, DispatchOutcome::Idle);
    assert_eq!(report.mode, PointerMode::PointerActive);
}

#[test]
fn test_hold_policy_hysteresis() {
    let injector = RecordingInjector::new();
    let controller = controller(&injector);
    controller.set_policy(TriggerPolicy::Hold);
    controller.start_tracking();

    let scores = [(0.6, true), (0.4, true), (0.26, true), (0.24, false)];
    for (score, pointer) in scores {
        let report = controller.update(&TrackerFrame::scores_only(vec![0.0, 0.0, 0.0, score]));
        assert_eq!(report.mode.is_pointer(), pointer, "score {}", score);
    }
}

#[test]
fn test_stop_releases_buttons_held_by_hook() {
    let injector = RecordingInjector::new();
    let controller = controller(&injector);
    let mut hook = HookManager::new(controller.hook_callback());
    let (backend, handle) = ManualHookBackend::new();
    hook.install(Box::new(backend)).unwrap();

    enter_pointer_mode(&controller, Instant::now());
    let decision = handle
        .deliver(&KeyEvent::new(keycodes::KEY_J, KeyState::Pressed))
        .unwrap();
    assert_eq!(decision, HookDecision::Suppress);
    assert_eq!(controller.status().held_buttons, vec![PointerButton::Left]);

    let released = controller.stop_tracking();
    assert_eq!(released, vec![PointerButton::Left]);
    assert!(controller.status().held_buttons.is_empty());

    // The physical release after stop finds nothing left to release
    handle.deliver(&KeyEvent::new(keycodes::KEY_J, KeyState::Released));
    assert_eq!(
        injector.events(),
        vec![
            Injected::Button(PointerButton::Left, true),
            Injected::Button(PointerButton::Left, false),
        ]
    );
}

#[test]
fn test_click_skipped_while_hook_holds_button() {
    let injector = RecordingInjector::new();
    let controller = controller(&injector);
    let hook = controller.hook_callback();

    enter_pointer_mode(&controller, Instant::now());
    hook(&KeyEvent::new(keycodes::KEY_L, KeyState::Pressed));
    injector.clear();

    assert!(!controller.click(PointerButton::Right).unwrap());
    assert!(injector.events().is_empty());
}

#[test]
fn test_typing_warning_decays() {
    let injector = RecordingInjector::new();
    let controller = controller(&injector);
    let hook = controller.hook_callback();
    let now = Instant::now();
    enter_pointer_mode(&controller, now);

    let t0 = Instant::now();
    let decision = hook(&KeyEvent::at(keycodes::KEY_Q, KeyState::Pressed, t0));
    assert_eq!(decision, HookDecision::Pass);

    assert!(controller.status_at(t0 + Duration::from_millis(50)).typing_warning);
    assert!(!controller.status_at(t0 + Duration::from_millis(100)).typing_warning);
}

#[test]
fn test_shortcuts_do_not_raise_typing_warning() {
    let injector = RecordingInjector::new();
    let controller = controller(&injector);
    let hook = controller.hook_callback();
    enter_pointer_mode(&controller, Instant::now());

    let t0 = Instant::now();
    hook(&KeyEvent::at(keycodes::KEY_LEFTCTRL, KeyState::Pressed, t0));
    hook(&KeyEvent::at(keycodes::KEY_Q, KeyState::Pressed, t0));

    assert!(!controller.status_at(t0).typing_warning);
}

#[test]
fn test_sensitivity_steps_are_clamped() {
    let injector = RecordingInjector::new();
    let controller = controller(&injector);

    let mut applied = 0.0;
    for _ in 0..5 {
        applied = controller.increase_sensitivity(SENSITIVITY_STEP);
    }
    assert_eq!(applied, 50.0);

    assert_eq!(controller.decrease_sensitivity(100.0), 1.0);
    assert_eq!(controller.set_sensitivity(12.5), 12.5);
    assert_eq!(controller.status().settings.sensitivity, 12.5);
}

#[test]
fn test_status_serializes() {
    let injector = RecordingInjector::new();
    let controller = controller(&injector);
    controller.start_tracking();

    let json = serde_json::to_value(controller.status()).unwrap();
    assert_eq!(json["tracking_active"], true);
    assert_eq!(json["mode"], "keyboard_active");
    assert_eq!(json["settings"]["policy"], "toggle");
}

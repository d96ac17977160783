//! Shared helpers for integration tests

#![allow(dead_code)]

use face_pointer::input::{InputError, InputInjector, KeyState, PointerButton, Result};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One event the engine asked the host to emit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Injected {
    Move(i32, i32),
    Button(PointerButton, bool),
    Key(u32, KeyState),
}

/// Injector that records everything in order
#[derive(Default)]
pub struct RecordingInjector {
    events: Mutex<Vec<Injected>>,
    fail_moves: AtomicBool,
}

impl RecordingInjector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<Injected> {
        self.events.lock().clone()
    }

    pub fn moves(&self) -> Vec<(i32, i32)> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                Injected::Move(dx, dy) => Some((*dx, *dy)),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    pub fn set_fail_moves(&self, fail: bool) {
        self.fail_moves.store(fail, Ordering::SeqCst);
    }
}

impl InputInjector for RecordingInjector {
    fn move_relative(&self, dx: i32, dy: i32) -> Result<()> {
        if self.fail_moves.load(Ordering::SeqCst) {
            return Err(InputError::InjectionFailed("move rejected".to_string()));
        }
        self.events.lock().push(Injected::Move(dx, dy));
        Ok(())
    }

    fn button(&self, button: PointerButton, pressed: bool) -> Result<()> {
        self.events.lock().push(Injected::Button(button, pressed));
        Ok(())
    }

    fn key(&self, keycode: u32, state: KeyState) -> Result<()> {
        self.events.lock().push(Injected::Key(keycode, state));
        Ok(())
    }
}

//! Linux evdev key codes
//!
//! Keys are identified by their evdev codes everywhere in the crate. Only
//! the codes the arbitration layer and the typing monitor care about are
//! named here.

use std::ops::RangeInclusive;

// Primary keys
/// Escape
pub const KEY_ESC: u32 = 1;
/// Digit 1
pub const KEY_1: u32 = 2;
/// Digit 0
pub const KEY_0: u32 = 11;
/// Backspace
pub const KEY_BACKSPACE: u32 = 14;
/// Tab
pub const KEY_TAB: u32 = 15;
/// Q
pub const KEY_Q: u32 = 16;
/// W, remapped to Up
pub const KEY_W: u32 = 17;
/// E
pub const KEY_E: u32 = 18;
/// Enter
pub const KEY_ENTER: u32 = 28;
/// Left Ctrl
pub const KEY_LEFTCTRL: u32 = 29;
/// A, remapped to Left
pub const KEY_A: u32 = 30;
/// S, remapped to Down
pub const KEY_S: u32 = 31;
/// D, remapped to Right
pub const KEY_D: u32 = 32;
/// F
pub const KEY_F: u32 = 33;
/// H
pub const KEY_H: u32 = 35;
/// J, remapped to the left button
pub const KEY_J: u32 = 36;
/// K, remapped to the middle button
pub const KEY_K: u32 = 37;
/// L, remapped to the right button
pub const KEY_L: u32 = 38;
/// Left Shift
pub const KEY_LEFTSHIFT: u32 = 42;
/// Z
pub const KEY_Z: u32 = 44;
/// M
pub const KEY_M: u32 = 50;
/// Right Shift
pub const KEY_RIGHTSHIFT: u32 = 54;
/// Left Alt
pub const KEY_LEFTALT: u32 = 56;
/// Space
pub const KEY_SPACE: u32 = 57;
/// Caps Lock
pub const KEY_CAPSLOCK: u32 = 58;

// Function keys
/// F1
pub const KEY_F1: u32 = 59;
/// F10
pub const KEY_F10: u32 = 68;
/// Num Lock
pub const KEY_NUMLOCK: u32 = 69;
/// Scroll Lock
pub const KEY_SCROLLLOCK: u32 = 70;
/// F11
pub const KEY_F11: u32 = 87;
/// F12
pub const KEY_F12: u32 = 88;

// Extended keys
/// Right Ctrl
pub const KEY_RIGHTCTRL: u32 = 97;
/// SysRq / Print Screen
pub const KEY_SYSRQ: u32 = 99;
/// Right Alt / AltGr
pub const KEY_RIGHTALT: u32 = 100;
/// Home
pub const KEY_HOME: u32 = 102;
/// Up arrow
pub const KEY_UP: u32 = 103;
/// Page Up
pub const KEY_PAGEUP: u32 = 104;
/// Left arrow
pub const KEY_LEFT: u32 = 105;
/// Right arrow
pub const KEY_RIGHT: u32 = 106;
/// End
pub const KEY_END: u32 = 107;
/// Down arrow
pub const KEY_DOWN: u32 = 108;
/// Page Down
pub const KEY_PAGEDOWN: u32 = 109;
/// Insert
pub const KEY_INSERT: u32 = 110;
/// Delete
pub const KEY_DELETE: u32 = 111;
/// Mute
pub const KEY_MUTE: u32 = 113;
/// Volume down
pub const KEY_VOLUMEDOWN: u32 = 114;
/// Volume up
pub const KEY_VOLUMEUP: u32 = 115;
/// Pause
pub const KEY_PAUSE: u32 = 119;
/// Left Meta
pub const KEY_LEFTMETA: u32 = 125;
/// Right Meta
pub const KEY_RIGHTMETA: u32 = 126;
/// Compose / Menu
pub const KEY_COMPOSE: u32 = 127;

// Media keys
/// Next track
pub const KEY_NEXTSONG: u32 = 163;
/// Play/Pause
pub const KEY_PLAYPAUSE: u32 = 164;
/// Previous track
pub const KEY_PREVIOUSSONG: u32 = 165;
/// Stop
pub const KEY_STOPCD: u32 = 166;

/// Highest key code the kernel defines
pub const KEY_MAX: u32 = 0x2ff;

// Button blocks inside the key code space: mouse, joystick, gamepad and
// digitizer buttons, then the trigger-happy range. A device advertising
// these is classified as a pointer, tablet or joystick.
const BUTTON_CODES: [RangeInclusive<u32>; 2] = [0x100..=0x15f, 0x2c0..=0x2ff];

// Pointer buttons
/// Left pointer button
pub const BTN_LEFT: u32 = 0x110;
/// Right pointer button
pub const BTN_RIGHT: u32 = 0x111;
/// Middle pointer button
pub const BTN_MIDDLE: u32 = 0x112;

/// Whether `keycode` is a keyboard key the virtual device can re-emit.
/// Covers every key up to [`KEY_MAX`], including the extended block
/// (Fn, brightness, macro keys) above 0x160, but no button codes.
pub fn is_injectable_key(keycode: u32) -> bool {
    (1..=KEY_MAX).contains(&keycode) && !BUTTON_CODES.iter().any(|r| r.contains(&keycode))
}

/// Every key code registered on the virtual keyboard
pub fn injectable_keys() -> impl Iterator<Item = u32> {
    (1..=KEY_MAX).filter(|code| is_injectable_key(*code))
}

/// Ctrl, Alt and Meta on either side. A key pressed while one of these is
/// held is a shortcut and bypasses arbitration.
pub fn is_shortcut_modifier(keycode: u32) -> bool {
    matches!(
        keycode,
        KEY_LEFTCTRL | KEY_RIGHTCTRL | KEY_LEFTALT | KEY_RIGHTALT | KEY_LEFTMETA | KEY_RIGHTMETA
    )
}

/// Keys that never count as text typing for the conflict monitor.
pub fn is_control_key(keycode: u32) -> bool {
    matches!(
        keycode,
        // Keys captured for pointer emulation, plus E
        KEY_W | KEY_A | KEY_S | KEY_D | KEY_J | KEY_K | KEY_L | KEY_E
            // Modifiers
            | KEY_LEFTCTRL | KEY_RIGHTCTRL
            | KEY_LEFTALT | KEY_RIGHTALT
            | KEY_LEFTSHIFT | KEY_RIGHTSHIFT
            | KEY_LEFTMETA | KEY_RIGHTMETA
            // Editing and locks
            | KEY_ENTER | KEY_TAB | KEY_CAPSLOCK | KEY_ESC | KEY_COMPOSE
            | KEY_NUMLOCK | KEY_SCROLLLOCK | KEY_SYSRQ | KEY_PAUSE | KEY_INSERT
            | KEY_BACKSPACE | KEY_DELETE
            // Navigation
            | KEY_UP | KEY_DOWN | KEY_LEFT | KEY_RIGHT
            | KEY_HOME | KEY_END | KEY_PAGEUP | KEY_PAGEDOWN
            // Media
            | KEY_VOLUMEUP | KEY_VOLUMEDOWN | KEY_MUTE
            | KEY_PLAYPAUSE | KEY_STOPCD | KEY_NEXTSONG | KEY_PREVIOUSSONG
    ) || is_function_key(keycode)
}

/// F1 through F12
pub fn is_function_key(keycode: u32) -> bool {
    (KEY_F1..=KEY_F10).contains(&keycode) || keycode == KEY_F11 || keycode == KEY_F12
}

/// Human-readable name for log output
pub fn key_name(keycode: u32) -> &'static str {
    match keycode {
        KEY_W => "W",
        KEY_A => "A",
        KEY_S => "S",
        KEY_D => "D",
        KEY_J => "J",
        KEY_K => "K",
        KEY_L => "L",
        KEY_E => "E",
        KEY_UP => "Up",
        KEY_DOWN => "Down",
        KEY_LEFT => "Left",
        KEY_RIGHT => "Right",
        KEY_LEFTCTRL | KEY_RIGHTCTRL => "Ctrl",
        KEY_LEFTALT | KEY_RIGHTALT => "Alt",
        KEY_LEFTMETA | KEY_RIGHTMETA => "Meta",
        KEY_LEFTSHIFT | KEY_RIGHTSHIFT => "Shift",
        KEY_SPACE => "Space",
        KEY_ENTER => "Enter",
        BTN_LEFT => "BTN_LEFT",
        BTN_RIGHT => "BTN_RIGHT",
        BTN_MIDDLE => "BTN_MIDDLE",
        _ => "other",
    }
}

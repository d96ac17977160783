//! User-Friendly Error Formatting
//!
//! Turns fatal startup errors into messages with troubleshooting hints
//! for the common Linux input permission problems.

use std::fmt::Write;

/// Format error for user consumption
///
/// Takes technical error and produces user-friendly message with
/// troubleshooting steps and context.
pub fn format_user_error(error: &anyhow::Error) -> String {
    let mut output = String::new();

    writeln!(&mut output).ok();
    writeln!(
        &mut output,
        "╔════════════════════════════════════════════════════════════╗"
    )
    .ok();
    writeln!(
        &mut output,
        "║                     ERROR                                  ║"
    )
    .ok();
    writeln!(
        &mut output,
        "╚════════════════════════════════════════════════════════════╝"
    )
    .ok();
    writeln!(&mut output).ok();

    // Match against the whole context chain, not just the outermost message
    let error_msg = format!("{:#}", error);

    if error_msg.contains("uinput") {
        format_uinput_error(&mut output);
    } else if error_msg.contains("grab") || error_msg.contains("keyboard") {
        format_keyboard_error(&mut output);
    } else if error_msg.contains("recording") {
        format_recording_error(&mut output);
    } else if error_msg.contains("config") {
        format_config_error(&mut output);
    } else {
        format_generic_error(&mut output, &error.to_string());
    }

    writeln!(&mut output).ok();
    writeln!(
        &mut output,
        "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━"
    )
    .ok();
    writeln!(&mut output, "Technical Details:").ok();
    writeln!(&mut output).ok();
    writeln!(&mut output, "{}", error_msg).ok();
    writeln!(&mut output).ok();
    writeln!(
        &mut output,
        "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━"
    )
    .ok();
    writeln!(&mut output, "Need Help?").ok();
    writeln!(
        &mut output,
        "  - Run with --verbose for detailed logs: face-pointer -vv"
    )
    .ok();
    writeln!(
        &mut output,
        "  - Try --dry-run to exercise the engine without devices"
    )
    .ok();

    output
}

fn format_uinput_error(output: &mut String) {
    writeln!(output, "Virtual Input Device Error").ok();
    writeln!(output).ok();
    writeln!(output, "Could not create the uinput virtual device.").ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. uinput module not loaded").ok();
    writeln!(output, "     → Run: sudo modprobe uinput").ok();
    writeln!(output).ok();
    writeln!(output, "  2. No write access to /dev/uinput").ok();
    writeln!(output, "     → Check: ls -l /dev/uinput").ok();
    writeln!(
        output,
        "     → Add a udev rule: KERNEL==\"uinput\", GROUP=\"input\", MODE=\"0660\""
    )
    .ok();
    writeln!(output, "     → Add your user: sudo usermod -aG input $USER").ok();
    writeln!(output, "     → Log out and log back in").ok();
}

fn format_keyboard_error(output: &mut String) {
    writeln!(output, "Keyboard Access Error").ok();
    writeln!(output).ok();
    writeln!(output, "Could not open or grab the physical keyboard.").ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. No read access to /dev/input/event*").ok();
    writeln!(output, "     → Add your user: sudo usermod -aG input $USER").ok();
    writeln!(output, "     → Log out and log back in").ok();
    writeln!(output).ok();
    writeln!(output, "  2. Another program holds an exclusive grab").ok();
    writeln!(
        output,
        "     → Stop key remappers (keyd, kmonad, interception-tools)"
    )
    .ok();
    writeln!(output).ok();
    writeln!(output, "  3. Wrong device selected").ok();
    writeln!(output, "     → List devices: ls -l /dev/input/by-id/").ok();
    writeln!(output, "     → Pass one explicitly: --keyboard /dev/input/eventN").ok();
}

fn format_recording_error(output: &mut String) {
    writeln!(output, "Tracker Recording Error").ok();
    writeln!(output).ok();
    writeln!(output, "Could not read the tracker recording.").ok();
    writeln!(output).ok();
    writeln!(output, "Expected one JSON object per line, for example:").ok();
    writeln!(output).ok();
    writeln!(
        output,
        "  {{\"t\": 0.033, \"x\": 312.0, \"y\": 240.5, \"scores\": [0.0, 0.0, 0.0, 0.7]}}"
    )
    .ok();
    writeln!(output, "  {{\"t\": 0.500, \"key\": 36, \"state\": \"pressed\"}}").ok();
    writeln!(output).ok();
    writeln!(output, "Blank lines and lines starting with # are ignored.").ok();
}

fn format_config_error(output: &mut String) {
    writeln!(output, "Configuration Error").ok();
    writeln!(output).ok();
    writeln!(output, "Problem with configuration file.").ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Configuration file not found").ok();
    writeln!(
        output,
        "     → Default location: ~/.config/face-pointer/config.toml"
    )
    .ok();
    writeln!(
        output,
        "     → Or specify: face-pointer --config /path/to/config.toml"
    )
    .ok();
    writeln!(output).ok();
    writeln!(output, "  2. Invalid TOML syntax").ok();
    writeln!(output, "     → Check for typos, missing quotes, etc.").ok();
    writeln!(output).ok();
    writeln!(output, "  3. Value out of range").ok();
    writeln!(output, "     → pointer.sensitivity must be 1 to 50").ok();
    writeln!(output, "     → gesture.threshold must be 0 to 1").ok();
}

fn format_generic_error(output: &mut String, error: &str) {
    writeln!(output, "Runtime Error").ok();
    writeln!(output).ok();
    writeln!(output, "Error: {}", error).ok();
}

//! Configuration type definitions

use crate::gesture::TriggerPolicy;
use crate::pointer::DispatcherConfig;
use crate::transfer::AccelParams;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Acceleration curve configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccelerationConfig {
    /// Apply the sigmoid curve (false = constant unit gain)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Speed at which the gain reaches one half
    #[serde(default = "default_center")]
    pub center: f64,

    /// Steepness of the transition
    #[serde(default = "default_slope")]
    pub slope: f64,
}

fn default_true() -> bool {
    true
}

fn default_center() -> f64 {
    AccelParams::default().center
}

fn default_slope() -> f64 {
    AccelParams::default().slope
}

impl Default for AccelerationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            center: default_center(),
            slope: default_slope(),
        }
    }
}

impl AccelerationConfig {
    /// Curve parameters
    pub fn params(&self) -> AccelParams {
        AccelParams {
            center: self.center,
            slope: self.slope,
        }
    }
}

/// Pointer output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointerConfig {
    /// Pointer gain, 1 to 50
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f64,

    /// Motion suppressed for this long after a button press (ms)
    #[serde(default = "default_dead_time_ms")]
    pub dead_time_ms: u64,

    /// Pause between the two half moves of a tick (ms). 0 disables it.
    #[serde(default = "default_split_delay_ms")]
    pub split_delay_ms: u64,

    /// Mirror the horizontal axis
    #[serde(default = "default_true")]
    pub mirror_x: bool,
}

fn default_sensitivity() -> f64 {
    35.0
}

fn default_dead_time_ms() -> u64 {
    DispatcherConfig::default().dead_time_ms
}

fn default_split_delay_ms() -> u64 {
    DispatcherConfig::default().split_delay_ms
}

impl Default for PointerConfig {
    fn default() -> Self {
        Self {
            sensitivity: default_sensitivity(),
            dead_time_ms: default_dead_time_ms(),
            split_delay_ms: default_split_delay_ms(),
            mirror_x: true,
        }
    }
}

impl PointerConfig {
    /// Dispatcher part of this section
    pub fn dispatcher(&self) -> DispatcherConfig {
        DispatcherConfig {
            dead_time_ms: self.dead_time_ms,
            split_delay_ms: self.split_delay_ms,
            mirror_x: self.mirror_x,
        }
    }
}

/// Gesture trigger configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureConfig {
    /// Index into the tracker's score vector
    #[serde(default = "default_gesture_index")]
    pub index: usize,

    /// Trigger threshold, 0 to 1
    #[serde(default = "default_threshold")]
    pub threshold: f32,

    /// "toggle" or "hold"
    #[serde(default)]
    pub policy: TriggerPolicy,
}

fn default_gesture_index() -> usize {
    3
}

fn default_threshold() -> f32 {
    0.5
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            index: default_gesture_index(),
            threshold: default_threshold(),
            policy: TriggerPolicy::default(),
        }
    }
}

/// Keyboard hook configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyboardConfig {
    /// Keyboard to grab (None = first full keyboard found)
    #[serde(default)]
    pub device: Option<PathBuf>,

    /// Typing warning decay window (ms)
    #[serde(default = "default_typing_decay_ms")]
    pub typing_decay_ms: u64,

    /// Name of the uinput virtual device
    #[serde(default = "default_virtual_device_name")]
    pub virtual_device_name: String,
}

fn default_typing_decay_ms() -> u64 {
    100
}

fn default_virtual_device_name() -> String {
    "face-pointer virtual input".to_string()
}

impl Default for KeyboardConfig {
    fn default() -> Self {
        Self {
            device: None,
            typing_decay_ms: default_typing_decay_ms(),
            virtual_device_name: default_virtual_device_name(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level ("trace", "debug", "info", "warn", "error")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format ("pretty", "compact", "json")
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Log file (None = console only)
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_file: None,
        }
    }
}

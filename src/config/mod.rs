//! Configuration management
//!
//! Handles loading, validation, and merging of configuration from:
//! - TOML files
//! - CLI arguments
//!
//! Every section is optional; missing sections and keys fall back to
//! defaults.

use crate::controller::{ControlSettings, ControllerOptions, MAX_SENSITIVITY, MIN_SENSITIVITY};
use crate::filter::OneEuroParams;
use crate::gesture::TriggerPolicy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub mod types;

pub use types::*;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Adaptive filter configuration
    #[serde(default)]
    pub filter: OneEuroParams,
    /// Acceleration curve configuration
    #[serde(default)]
    pub acceleration: AccelerationConfig,
    /// Pointer output configuration
    #[serde(default)]
    pub pointer: PointerConfig,
    /// Gesture trigger configuration
    #[serde(default)]
    pub gesture: GestureConfig,
    /// Keyboard hook configuration
    #[serde(default)]
    pub keyboard: KeyboardConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Trigger policy
    pub policy: Option<TriggerPolicy>,
    /// Trigger threshold
    pub threshold: Option<f32>,
    /// Score index
    pub gesture_index: Option<usize>,
    /// Pointer gain
    pub sensitivity: Option<f64>,
    /// Disable acceleration
    pub no_accel: bool,
    /// Keyboard to grab
    pub keyboard: Option<PathBuf>,
}

impl Config {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, else the default location if it exists, else defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => match default_config_path() {
                Some(path) if path.exists() => Self::load(path),
                _ => Ok(Self::default_config()),
            },
        }
    }

    /// Create default configuration
    pub fn default_config() -> Self {
        Config {
            filter: OneEuroParams::default(),
            acceleration: AccelerationConfig::default(),
            pointer: PointerConfig::default(),
            gesture: GestureConfig::default(),
            keyboard: KeyboardConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        // Filter cutoffs must be positive for α to stay in (0, 1]
        if !positive(self.filter.min_cutoff) {
            anyhow::bail!("filter.min_cutoff must be > 0 (got {})", self.filter.min_cutoff);
        }
        if !positive(self.filter.d_cutoff) {
            anyhow::bail!("filter.d_cutoff must be > 0 (got {})", self.filter.d_cutoff);
        }
        if !self.filter.beta.is_finite() || self.filter.beta < 0.0 {
            anyhow::bail!("filter.beta must be >= 0 (got {})", self.filter.beta);
        }

        if !positive(self.acceleration.slope) {
            anyhow::bail!(
                "acceleration.slope must be > 0 (got {})",
                self.acceleration.slope
            );
        }
        if !self.acceleration.center.is_finite() {
            anyhow::bail!("acceleration.center must be finite");
        }

        if !(MIN_SENSITIVITY..=MAX_SENSITIVITY).contains(&self.pointer.sensitivity) {
            anyhow::bail!(
                "pointer.sensitivity ({}) must be between {} and {}",
                self.pointer.sensitivity,
                MIN_SENSITIVITY,
                MAX_SENSITIVITY
            );
        }

        if !(0.0..=1.0).contains(&self.gesture.threshold) {
            anyhow::bail!(
                "gesture.threshold ({}) must be between 0 and 1",
                self.gesture.threshold
            );
        }

        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Invalid log level: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "pretty" | "compact" | "json" => {}
            _ => anyhow::bail!("Invalid log format: {}", self.logging.format),
        }

        Ok(())
    }

    /// Override config with CLI arguments
    pub fn with_overrides(mut self, overrides: &ConfigOverrides) -> Self {
        if let Some(policy) = overrides.policy {
            self.gesture.policy = policy;
        }
        if let Some(threshold) = overrides.threshold {
            self.gesture.threshold = threshold;
        }
        if let Some(index) = overrides.gesture_index {
            self.gesture.index = index;
        }
        if let Some(sensitivity) = overrides.sensitivity {
            self.pointer.sensitivity = sensitivity;
        }
        if overrides.no_accel {
            self.acceleration.enabled = false;
        }
        if let Some(device) = &overrides.keyboard {
            self.keyboard.device = Some(device.clone());
        }

        self
    }

    /// Initial runtime settings
    pub fn control_settings(&self) -> ControlSettings {
        ControlSettings {
            gesture_index: self.gesture.index,
            threshold: self.gesture.threshold,
            policy: self.gesture.policy,
            acceleration: self.acceleration.enabled,
            sensitivity: self.pointer.sensitivity,
        }
    }

    /// Options for building a [`PointerController`](crate::controller::PointerController)
    pub fn controller_options(&self) -> ControllerOptions {
        ControllerOptions {
            filter: self.filter,
            acceleration: self.acceleration.params(),
            pointer: self.pointer.dispatcher(),
            typing_decay: Some(Duration::from_millis(self.keyboard.typing_decay_ms)),
            settings: self.control_settings(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// `$XDG_CONFIG_HOME/face-pointer/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("face-pointer").join("config.toml"))
}

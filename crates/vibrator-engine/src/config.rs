//! Engine configuration.
//!
//! Every field has a default, so an empty file (or none at all) yields a
//! working configuration. Files are read as YAML (`.yaml`, `.yml`) or JSON
//! (`.json`) by extension.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use vibrator_calibration::MIN_ON_OFF_INTERVAL_US;
use vibrator_errors::HapticError;

/// Longest completion guard accepted by [`VibratorConfig::validate`].
pub const MAX_COMPLETION_GUARD_MS: u64 = 10_000;

/// Rejected configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl From<ConfigError> for HapticError {
    fn from(err: ConfigError) -> Self {
        HapticError::IllegalArgument(err.to_string())
    }
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VibratorConfig {
    pub timing: TimingConfig,
    /// Minimum interval between on/off transitions pushed at startup
    pub min_on_off_interval_us: u32,
    pub logging: LoggingConfig,
}

/// Completion wait timing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Extra time past an effect's duration before the wait gives up
    pub completion_guard_ms: u64,
    /// How long the wait looks for playback to start
    pub haptic_state_timeout_ms: u64,
    /// Granularity at which the wait checks for cancellation
    pub poll_slice_ms: u64,
    /// How long a stop waits for the actuator to report idle
    pub stop_settle_timeout_ms: u64,
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives, overridden by `RUST_LOG`
    pub filter: String,
    pub with_thread_names: bool,
    pub ansi: bool,
}

impl Default for VibratorConfig {
    fn default() -> Self {
        Self {
            timing: TimingConfig::default(),
            min_on_off_interval_us: MIN_ON_OFF_INTERVAL_US,
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            completion_guard_ms: 100,
            haptic_state_timeout_ms: 20,
            poll_slice_ms: 10,
            stop_settle_timeout_ms: 50,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "vibrator_engine=debug,info".to_string(),
            with_thread_names: true,
            ansi: false,
        }
    }
}

impl TimingConfig {
    pub fn completion_guard(&self) -> Duration {
        Duration::from_millis(self.completion_guard_ms)
    }

    pub fn haptic_state_timeout(&self) -> Duration {
        Duration::from_millis(self.haptic_state_timeout_ms)
    }

    pub fn poll_slice(&self) -> Duration {
        Duration::from_millis(self.poll_slice_ms)
    }

    pub fn stop_settle_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_settle_timeout_ms)
    }
}

impl VibratorConfig {
    /// Load and validate a configuration file.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        let config: VibratorConfig = match extension.as_deref() {
            Some("yaml" | "yml") => serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?,
            Some("json") => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?,
            _ => bail!("Unsupported config format: {}", path.display()),
        };

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timing.poll_slice_ms == 0 {
            return Err(ConfigError::invalid("timing.poll_slice_ms", "must be non-zero"));
        }
        if self.timing.completion_guard_ms > MAX_COMPLETION_GUARD_MS {
            return Err(ConfigError::invalid(
                "timing.completion_guard_ms",
                format!(
                    "{} exceeds {MAX_COMPLETION_GUARD_MS}",
                    self.timing.completion_guard_ms
                ),
            ));
        }
        if self.logging.filter.trim().is_empty() {
            return Err(ConfigError::invalid("logging.filter", "must not be empty"));
        }
        if self.min_on_off_interval_us == 0 {
            warn!("Minimum on/off interval is zero; back-to-back effects may glitch");
        }
        Ok(())
    }
}

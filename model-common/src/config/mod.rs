//! Platform configuration loading.
//!
//! Describes the timer hardware the models run on and the compiled-in model
//! instance counts.  Every field is optional; anything missing falls back to
//! the nRF RTC defaults.
//!
//! The expected YAML structure is:
//! ```yaml
//! timer:
//!   tick_hz: 32768
//!   min_timeout_ticks: 5
//!   max_timeout_ticks: 16777215
//!   counter_bits: 24
//! models:
//!   light_lightness_instance_count: 1
//!   light_lc_instance_count: 1
//!   light_ctl_instance_count: 1
//! ```

use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

use crate::clock::counter_mask;
use crate::metadata::ModelMetadata;
use crate::timer::hardware::{
    DEFAULT_MAX_TIMEOUT_TICKS, DEFAULT_MIN_TIMEOUT_TICKS, DEFAULT_TICK_HZ,
};
use crate::timer::TimerLimits;

/// Default counter width (nRF RTC).
pub const DEFAULT_COUNTER_BITS: u32 = 24;

// ── Private YAML deserialization types ────────────────────────────────────────

/// Top-level wrapper that maps directly onto the YAML file layout.
///
/// This is kept private – callers work with [`ModelConfig`] instead.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ModelConfigFile {
    #[serde(default)]
    timer: TimerSection,
    #[serde(default)]
    models: ModelMetadata,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct TimerSection {
    tick_hz: u32,
    min_timeout_ticks: u32,
    max_timeout_ticks: u32,
    counter_bits: u32,
}

impl Default for TimerSection {
    fn default() -> Self {
        Self {
            tick_hz: DEFAULT_TICK_HZ,
            min_timeout_ticks: DEFAULT_MIN_TIMEOUT_TICKS,
            max_timeout_ticks: DEFAULT_MAX_TIMEOUT_TICKS,
            counter_bits: DEFAULT_COUNTER_BITS,
        }
    }
}

// ── Public data structures ────────────────────────────────────────────────────

/// Validated platform configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelConfig {
    /// Hardware timer limits and tick rate.
    pub limits: TimerLimits,

    /// Width of the tick counter in bits.
    pub counter_bits: u32,

    /// Compiled-in model instance counts.
    pub models: ModelMetadata,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::from_file(ModelConfigFile::default())
    }
}

impl ModelConfig {
    /// Parses and validates the YAML file at `path`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened, the YAML is
    /// structurally invalid, or the values describe an impossible timer.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading model configuration from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open configuration file: {}", path.display()))?;

        Self::from_yaml_str(&content)
            .with_context(|| format!("Invalid configuration file: {}", path.display()))
    }

    /// Parses and validates a YAML document.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        // An empty document deserialises to `()`, not to an empty map.
        let file: ModelConfigFile = if content.trim().is_empty() {
            ModelConfigFile::default()
        } else {
            serde_yaml::from_str(content).context("Failed to parse YAML")?
        };

        let config = Self::from_file(file);
        config.validate()?;

        debug!(
            tick_hz = config.limits.tick_hz,
            min_timeout_ticks = config.limits.min_timeout_ticks,
            max_timeout_ticks = config.limits.max_timeout_ticks,
            counter_bits = config.counter_bits,
            "timer configuration"
        );
        debug!(models = ?config.models, "model instance counts");

        Ok(config)
    }

    /// Mask matching [`counter_bits`](Self::counter_bits).
    pub fn counter_mask(&self) -> u32 {
        counter_mask(self.counter_bits)
    }

    fn from_file(file: ModelConfigFile) -> Self {
        Self {
            limits: TimerLimits {
                min_timeout_ticks: file.timer.min_timeout_ticks,
                max_timeout_ticks: file.timer.max_timeout_ticks,
                tick_hz: file.timer.tick_hz,
            },
            counter_bits: file.timer.counter_bits,
            models: file.models,
        }
    }

    fn validate(&self) -> Result<()> {
        let l = &self.limits;
        ensure!(l.tick_hz > 0, "timer.tick_hz must be non-zero");
        ensure!(
            l.min_timeout_ticks > 0,
            "timer.min_timeout_ticks must be non-zero"
        );
        ensure!(
            (1..=32).contains(&self.counter_bits),
            "timer.counter_bits must be within 1..=32, got {}",
            self.counter_bits
        );
        ensure!(
            u64::from(l.max_timeout_ticks) > 2 * u64::from(l.min_timeout_ticks),
            "timer.max_timeout_ticks ({}) must exceed twice min_timeout_ticks ({})",
            l.max_timeout_ticks,
            l.min_timeout_ticks
        );
        ensure!(
            l.max_timeout_ticks <= self.counter_mask(),
            "timer.max_timeout_ticks ({}) does not fit a {}-bit counter",
            l.max_timeout_ticks,
            self.counter_bits
        );
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

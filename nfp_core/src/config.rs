//! Configuration file support for the fertility engine.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/nfp/config.toml`.
//! The defaults are the protocol constants; changing them changes the rules.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Engine configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub temperature: TemperatureConfig,

    #[serde(default)]
    pub mucus: MucusConfig,

    #[serde(default)]
    pub cycle_start: CycleStartConfig,

    #[serde(default)]
    pub watchdog: WatchdogConfig,
}

/// Temperature shift parameters
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TemperatureConfig {
    #[serde(default = "default_baseline_readings")]
    pub baseline_readings: usize,

    #[serde(default = "default_elevated_readings")]
    pub elevated_readings: usize,

    /// Degrees above the coverline the last elevated reading must reach
    #[serde(default = "default_elevation_threshold")]
    pub elevation_threshold: f64,
}

impl Default for TemperatureConfig {
    fn default() -> Self {
        Self {
            baseline_readings: default_baseline_readings(),
            elevated_readings: default_elevated_readings(),
            elevation_threshold: default_elevation_threshold(),
        }
    }
}

/// Mucus peak parameters
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MucusConfig {
    #[serde(default = "default_post_peak_days")]
    pub post_peak_days: u32,

    #[serde(default = "default_min_mucus_observations")]
    pub min_observations: usize,
}

impl Default for MucusConfig {
    fn default() -> Self {
        Self {
            post_peak_days: default_post_peak_days(),
            min_observations: default_min_mucus_observations(),
        }
    }
}

/// Pre-ovulatory infertile window parameters
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CycleStartConfig {
    #[serde(default = "default_five_day_default")]
    pub five_day_default: u32,

    #[serde(default = "default_minus_eight_offset")]
    pub minus_eight_offset: u32,

    #[serde(default = "default_minus_twenty_offset")]
    pub minus_twenty_offset: u32,

    /// Cycles of history needed before Minus-8 replaces Five-Day
    #[serde(default = "default_calibration_cycles")]
    pub calibration_cycles: u32,

    /// An elevation on or before this day switches to Minus-8 early
    #[serde(default = "default_early_elevation_day")]
    pub early_elevation_day: u32,
}

impl Default for CycleStartConfig {
    fn default() -> Self {
        Self {
            five_day_default: default_five_day_default(),
            minus_eight_offset: default_minus_eight_offset(),
            minus_twenty_offset: default_minus_twenty_offset(),
            calibration_cycles: default_calibration_cycles(),
            early_elevation_day: default_early_elevation_day(),
        }
    }
}

/// Cycle length watchdogs
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WatchdogConfig {
    #[serde(default = "default_long_cycle_day")]
    pub long_cycle_day: u32,

    #[serde(default = "default_amenorrhea_day")]
    pub amenorrhea_day: u32,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            long_cycle_day: default_long_cycle_day(),
            amenorrhea_day: default_amenorrhea_day(),
        }
    }
}

// Default value functions
fn default_baseline_readings() -> usize {
    6
}

fn default_elevated_readings() -> usize {
    3
}

fn default_elevation_threshold() -> f64 {
    0.2
}

fn default_post_peak_days() -> u32 {
    3
}

fn default_min_mucus_observations() -> usize {
    2
}

fn default_five_day_default() -> u32 {
    5
}

fn default_minus_eight_offset() -> u32 {
    8
}

fn default_minus_twenty_offset() -> u32 {
    20
}

fn default_calibration_cycles() -> u32 {
    12
}

fn default_early_elevation_day() -> u32 {
    12
}

fn default_long_cycle_day() -> u32 {
    60
}

fn default_amenorrhea_day() -> u32 {
    90
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        match Self::default_config_path() {
            Some(config_path) if config_path.exists() => Self::load_from(&config_path),
            other => {
                tracing::info!("No config file found at {:?}, using defaults", other);
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|base| base.join("nfp").join("config.toml"))
    }

    /// Save the configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Reject parameter combinations the evaluators cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.temperature.baseline_readings == 0 {
            return Err(Error::Config("baseline_readings must be at least 1".into()));
        }
        if self.temperature.elevated_readings == 0 {
            return Err(Error::Config("elevated_readings must be at least 1".into()));
        }
        let threshold = self.temperature.elevation_threshold;
        if threshold.is_nan() || threshold < 0.0 {
            return Err(Error::Config(format!(
                "elevation_threshold must be non-negative, got {}",
                threshold
            )));
        }
        if self.watchdog.long_cycle_day >= self.watchdog.amenorrhea_day {
            return Err(Error::Config(format!(
                "long_cycle_day ({}) must be before amenorrhea_day ({})",
                self.watchdog.long_cycle_day, self.watchdog.amenorrhea_day
            )));
        }
        Ok(())
    }
}

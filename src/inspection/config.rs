//! Rig configuration
//!
//! Reference regions, thresholds, channel list and timing for a capture session,
//! loaded from TOML. Every section is optional and falls back to the defaults.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::inspection::common::error::{InspectionError, Result};
use crate::inspection::frame::Region;
use crate::inspection::illumination::Channel;
use crate::inspection::persist::TiffCompression;
use crate::inspection::quality::QcThresholds;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigConfig {
    /// Channels in capture order
    pub channels: Vec<Channel>,
    pub thresholds: QcThresholds,
    pub regions: RegionConfig,
    pub calibration: CalibrationConfig,
    pub capture: CaptureConfig,
}

/// White and black reference tiles, each as `[x1, y1, x2, y2]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    pub white: Vec<Region>,
    pub black: Vec<Region>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    pub max_iterations: usize,
    /// Exposure applied when the session starts, in microseconds
    pub initial_exposure_us: f64,
    /// LED warm-up before calibration frames are taken
    pub settle_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Delay between lighting a channel and exposing, for the LED output to stabilise
    pub settle_ms: u64,
    pub output_directory: PathBuf,
    pub save_raw: bool,
    pub save_normalized: bool,
    pub compression: TiffCompression,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            white: vec![
                Region { x1: 100, y1: 100, x2: 150, y2: 150 },
                Region { x1: 1000, y1: 100, x2: 1050, y2: 150 },
            ],
            black: vec![
                Region { x1: 100, y1: 800, x2: 150, y2: 850 },
                Region { x1: 1000, y1: 800, x2: 1050, y2: 850 },
            ],
        }
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            max_iterations: 12,
            initial_exposure_us: 5000.0,
            settle_ms: 300,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            settle_ms: 1200,
            output_directory: PathBuf::from("captures"),
            save_raw: true,
            save_normalized: true,
            compression: TiffCompression::None,
        }
    }
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            channels: vec![Channel(1), Channel(2), Channel(3)],
            thresholds: QcThresholds::default(),
            regions: RegionConfig::default(),
            calibration: CalibrationConfig::default(),
            capture: CaptureConfig::default(),
        }
    }
}

impl CalibrationConfig {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

impl CaptureConfig {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

impl RigConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: RigConfig = toml::from_str(contents)
            .map_err(|e| InspectionError::Config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a TOML config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            InspectionError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&contents)?;
        info!(path = %path.display(), "Loaded rig configuration");
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| InspectionError::Config(format!("failed to serialize config: {}", e)))?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Checks everything that can be checked without a frame. Region bounds are
    /// checked against the first calibration frame instead.
    pub fn validate(&self) -> Result<()> {
        if self.regions.white.is_empty() {
            return Err(InspectionError::EmptyRegionSet("white"));
        }
        if self.regions.black.is_empty() {
            return Err(InspectionError::EmptyRegionSet("black"));
        }
        if self.channels.is_empty() {
            return Err(InspectionError::Config("no illumination channels configured".to_string()));
        }
        let unique: BTreeSet<_> = self.channels.iter().collect();
        if unique.len() != self.channels.len() {
            return Err(InspectionError::Config("duplicate illumination channel".to_string()));
        }
        if self.calibration.max_iterations == 0 {
            return Err(InspectionError::Config("max_iterations must be at least 1".to_string()));
        }
        if !(self.calibration.initial_exposure_us > 0.0) {
            return Err(InspectionError::Config("initial exposure must be positive".to_string()));
        }

        let t = &self.thresholds;
        if !(t.max_value > 0.0) {
            return Err(InspectionError::Config("max_value must be positive".to_string()));
        }
        if !(t.saturation_fraction > 0.0 && t.saturation_fraction <= 1.0) {
            return Err(InspectionError::Config("saturation_fraction must be in (0, 1]".to_string()));
        }
        if !(0.0..t.max_value).contains(&t.target_white) {
            return Err(InspectionError::Config("target_white must lie below max_value".to_string()));
        }
        for (name, value) in [
            ("white_tolerance", t.white_tolerance),
            ("dynamic_range_min", t.dynamic_range_min),
            ("white_std_max", t.white_std_max),
            ("black_std_max", t.black_std_max),
            ("drift_fraction_max", t.drift_fraction_max),
        ] {
            if !(value >= 0.0) {
                return Err(InspectionError::Config(format!("{} must be non-negative", name)));
            }
        }
        Ok(())
    }
}

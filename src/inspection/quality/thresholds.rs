//! QC threshold configuration

use serde::{Deserialize, Serialize};

use crate::inspection::frame::BitDepth;

/// Fixed thresholds for calibration targets and capture QC.
///
/// Intensity-valued fields are in raw counts of the frame's bit depth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QcThresholds {
    /// Bit-depth ceiling (255 for Mono8)
    pub max_value: f64,
    /// Target white-patch mean during calibration
    pub target_white: f64,
    /// Allowed +/- deviation from `target_white` during calibration
    pub white_tolerance: f64,
    /// Minimum white-minus-black mean
    pub dynamic_range_min: f64,
    /// Fraction of `max_value` treated as saturated
    pub saturation_fraction: f64,
    /// White patch std above this suggests dirt, glare or shadow
    pub white_std_max: f64,
    /// Black patch std above this suggests stray light or contamination
    pub black_std_max: f64,
    /// Allowed relative white drift against the calibration baseline
    pub drift_fraction_max: f64,
}

impl Default for QcThresholds {
    fn default() -> Self {
        Self {
            max_value: 255.0,
            target_white: 180.0,
            white_tolerance: 5.0,
            dynamic_range_min: 30.0,
            saturation_fraction: 0.98,
            white_std_max: 8.0,
            black_std_max: 8.0,
            drift_fraction_max: 0.10,
        }
    }
}

impl QcThresholds {
    pub fn builder() -> QcThresholdsBuilder {
        QcThresholdsBuilder::default()
    }

    /// Defaults rescaled from Mono8 counts to `bit_depth`.
    pub fn for_bit_depth(bit_depth: BitDepth) -> Self {
        let mono8 = Self::default();
        let scale = bit_depth.max_value() / mono8.max_value;
        Self {
            max_value: bit_depth.max_value(),
            target_white: mono8.target_white * scale,
            white_tolerance: mono8.white_tolerance * scale,
            dynamic_range_min: mono8.dynamic_range_min * scale,
            white_std_max: mono8.white_std_max * scale,
            black_std_max: mono8.black_std_max * scale,
            ..mono8
        }
    }

    /// Intensity at which the white patch counts as saturated.
    pub fn saturation_level(&self) -> f64 {
        self.saturation_fraction * self.max_value
    }
}

/// Builder for QcThresholds
#[derive(Default)]
pub struct QcThresholdsBuilder {
    bit_depth: Option<BitDepth>,
    max_value: Option<f64>,
    target_white: Option<f64>,
    white_tolerance: Option<f64>,
    dynamic_range_min: Option<f64>,
    saturation_fraction: Option<f64>,
    white_std_max: Option<f64>,
    black_std_max: Option<f64>,
    drift_fraction_max: Option<f64>,
}

impl QcThresholdsBuilder {
    /// Starts from the defaults for `bit_depth` instead of Mono8.
    pub fn bit_depth(mut self, bit_depth: BitDepth) -> Self {
        self.bit_depth = Some(bit_depth);
        self
    }

    pub fn max_value(mut self, max_value: f64) -> Self {
        self.max_value = Some(max_value);
        self
    }

    pub fn target_white(mut self, target: f64) -> Self {
        self.target_white = Some(target);
        self
    }

    pub fn white_tolerance(mut self, tolerance: f64) -> Self {
        self.white_tolerance = Some(tolerance);
        self
    }

    pub fn dynamic_range_min(mut self, min: f64) -> Self {
        self.dynamic_range_min = Some(min);
        self
    }

    pub fn saturation_fraction(mut self, fraction: f64) -> Self {
        self.saturation_fraction = Some(fraction);
        self
    }

    pub fn white_std_max(mut self, max: f64) -> Self {
        self.white_std_max = Some(max);
        self
    }

    pub fn black_std_max(mut self, max: f64) -> Self {
        self.black_std_max = Some(max);
        self
    }

    pub fn drift_fraction_max(mut self, max: f64) -> Self {
        self.drift_fraction_max = Some(max);
        self
    }

    pub fn build(self) -> QcThresholds {
        let default = match self.bit_depth {
            Some(bit_depth) => QcThresholds::for_bit_depth(bit_depth),
            None => QcThresholds::default(),
        };
        QcThresholds {
            max_value: self.max_value.unwrap_or(default.max_value),
            target_white: self.target_white.unwrap_or(default.target_white),
            white_tolerance: self.white_tolerance.unwrap_or(default.white_tolerance),
            dynamic_range_min: self.dynamic_range_min.unwrap_or(default.dynamic_range_min),
            saturation_fraction: self.saturation_fraction.unwrap_or(default.saturation_fraction),
            white_std_max: self.white_std_max.unwrap_or(default.white_std_max),
            black_std_max: self.black_std_max.unwrap_or(default.black_std_max),
            drift_fraction_max: self.drift_fraction_max.unwrap_or(default.drift_fraction_max),
        }
    }
}

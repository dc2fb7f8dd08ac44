//! Calibration result types

use serde::{Deserialize, Serialize};

/// Exposure and reference intensities recorded for one illumination channel.
///
/// Used as the drift reference for every later capture on that channel until the
/// channel is recalibrated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationBaseline {
    /// Exposure setpoint in microseconds
    pub exposure_us: f64,
    /// Mean intensity over the white regions
    pub white_mean: f64,
    /// Mean intensity over the black regions
    pub black_mean: f64,
}

/// What a calibration run produced and how it got there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationOutcome {
    pub baseline: CalibrationBaseline,
    /// Whether the targets were met. An unconverged baseline is still usable.
    pub converged: bool,
    /// Iterations consumed, including those lost to incomplete frames
    pub iterations: usize,
    /// How many of those iterations got an incomplete frame
    pub incomplete_frames: usize,
}

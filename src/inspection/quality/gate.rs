use std::fmt;

use tracing::{debug, info, instrument, warn};

use crate::inspection::calibration::CalibrationBaseline;
use crate::inspection::common::error::Result;
use crate::inspection::frame::{Frame, Region};
use crate::inspection::quality::thresholds::QcThresholds;
use crate::inspection::stats::{region_stats, validate_regions, RegionStats};

/// Baseline white means at or below this are treated as undefined for drift.
const MIN_BASELINE_WHITE: f64 = 1e-3;

/// Advisory finding about a capture. None of these are fatal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QualityWarning {
    /// Relative change of the white mean against the baseline (0.25 = 25%).
    Drift { fraction: f64 },
    Saturation { white_mean: f64, level: f64 },
    LowDynamicRange { range: f64 },
    NoisyWhite { std: f64 },
    NoisyBlack { std: f64 },
}

impl fmt::Display for QualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualityWarning::Drift { fraction } => write!(
                f,
                "White drift {:.1}% vs calibration. Lighting/exposure changed.",
                fraction * 100.0
            ),
            QualityWarning::Saturation { .. } => {
                write!(f, "White reference near saturation. Reduce exposure/gain.")
            }
            QualityWarning::LowDynamicRange { range } => write!(
                f,
                "Dynamic range too low (Iw - Ib = {:.1}). Lighting too weak or references too similar.",
                range
            ),
            QualityWarning::NoisyWhite { std } => write!(
                f,
                "White patch std {:.1} too high. Tile may be dirty or has glare/shadow.",
                std
            ),
            QualityWarning::NoisyBlack { std } => write!(
                f,
                "Black patch std {:.1} too high. Stray light or contamination on black tile.",
                std
            ),
        }
    }
}

/// Statistics and findings for one capture.
#[derive(Debug, Clone, PartialEq)]
pub struct QualityReport {
    pub white: RegionStats,
    pub black: RegionStats,
    pub warnings: Vec<QualityWarning>,
}

impl QualityReport {
    pub fn dynamic_range(&self) -> f64 {
        self.white.mean - self.black.mean
    }

    /// No warnings fired.
    pub fn is_ok(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Runs every QC check against `frame` and returns the warnings in check order:
/// drift, saturation, dynamic range, white noise, black noise.
pub fn evaluate(
    frame: &Frame,
    white_regions: &[Region],
    black_regions: &[Region],
    thresholds: &QcThresholds,
    baseline: &CalibrationBaseline,
) -> Result<Vec<QualityWarning>> {
    inspect(frame, white_regions, black_regions, thresholds, baseline).map(|r| r.warnings)
}

/// Like [`evaluate`], but also hands back the region statistics it measured.
#[instrument(skip_all, fields(width = frame.width, height = frame.height))]
pub fn inspect(
    frame: &Frame,
    white_regions: &[Region],
    black_regions: &[Region],
    thresholds: &QcThresholds,
    baseline: &CalibrationBaseline,
) -> Result<QualityReport> {
    validate_regions(white_regions, black_regions, frame.width, frame.height)?;

    let white = region_stats(frame, white_regions);
    let black = region_stats(frame, black_regions);
    debug!(
        white_mean = white.mean,
        black_mean = black.mean,
        white_std = white.std,
        black_std = black.std,
        "Capture stats"
    );

    let warnings = check(&white, &black, thresholds, baseline);
    if warnings.is_empty() {
        info!("QC OK");
    }
    for warning in &warnings {
        warn!("{}", warning);
    }

    Ok(QualityReport {
        white,
        black,
        warnings,
    })
}

fn check(
    white: &RegionStats,
    black: &RegionStats,
    thresholds: &QcThresholds,
    baseline: &CalibrationBaseline,
) -> Vec<QualityWarning> {
    let mut warnings = Vec::new();

    if baseline.white_mean > MIN_BASELINE_WHITE {
        let fraction = (white.mean - baseline.white_mean).abs() / baseline.white_mean;
        if fraction > thresholds.drift_fraction_max {
            warnings.push(QualityWarning::Drift { fraction });
        }
    }

    let level = thresholds.saturation_level();
    if white.mean > level {
        warnings.push(QualityWarning::Saturation {
            white_mean: white.mean,
            level,
        });
    }

    let range = white.mean - black.mean;
    if range < thresholds.dynamic_range_min {
        warnings.push(QualityWarning::LowDynamicRange { range });
    }

    if white.std > thresholds.white_std_max {
        warnings.push(QualityWarning::NoisyWhite { std: white.std });
    }
    if black.std > thresholds.black_std_max {
        warnings.push(QualityWarning::NoisyBlack { std: black.std });
    }

    warnings
}

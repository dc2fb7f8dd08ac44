use tracing::{debug, info, instrument, warn};

use crate::inspection::calibration::types::{CalibrationBaseline, CalibrationOutcome};
use crate::inspection::common::error::{InspectionError, Result};
use crate::inspection::frame::{checked_exposure_range, BitDepth, Capture, FrameSource, Region};
use crate::inspection::quality::QcThresholds;
use crate::inspection::stats::{region_stats, validate_regions, RegionStats};

/// Step applied when the white patch is at or past saturation.
const SATURATED_STEP: f64 = 0.7;
/// Step applied when the white patch is brighter than the target.
const BRIGHT_STEP: f64 = 0.9;
/// Step applied when the white patch is too dark or the range is too small.
const DARK_STEP: f64 = 1.3;

/// Adjusts the source's exposure until the white patch hits its target band with
/// enough separation from the black patch and no saturation.
///
/// Starts from whatever exposure the source currently has. Each iteration captures
/// one frame; incomplete frames use up the iteration and are skipped. Regions are
/// validated against the first complete frame and a mismatch aborts the run.
///
/// Running out of iterations is not an error: the last exposure and means are
/// returned with `converged == false`. The caller must have the channel lit.
#[instrument(skip(source, white_regions, black_regions, thresholds))]
pub fn calibrate<S: FrameSource + ?Sized>(
    source: &mut S,
    white_regions: &[Region],
    black_regions: &[Region],
    thresholds: &QcThresholds,
    max_iterations: usize,
) -> Result<CalibrationOutcome> {
    if white_regions.is_empty() {
        return Err(InspectionError::EmptyRegionSet("white"));
    }
    if black_regions.is_empty() {
        return Err(InspectionError::EmptyRegionSet("black"));
    }

    let (min_exposure, max_exposure) = checked_exposure_range(&*source)?;

    let mut exposure = source.exposure()?;
    info!("Starting exposure: {:.1} us", exposure);

    let mut format: Option<(usize, usize, BitDepth)> = None;
    let mut last: Option<(RegionStats, RegionStats)> = None;
    let mut incomplete_frames = 0;

    for iteration in 0..max_iterations {
        let frame = match source.capture()? {
            Capture::Frame(frame) => frame,
            Capture::Incomplete => {
                warn!(iteration, "Failed to capture image during calibration");
                incomplete_frames += 1;
                continue;
            }
        };

        match format {
            None => {
                validate_regions(white_regions, black_regions, frame.width, frame.height)?;
                format = Some((frame.width, frame.height, frame.bit_depth));
            }
            Some((width, height, bit_depth)) => {
                if frame.bit_depth != bit_depth {
                    return Err(InspectionError::BitDepthMismatch {
                        expected: bit_depth,
                        found: frame.bit_depth,
                    });
                }
                if frame.width != width || frame.height != height {
                    return Err(InspectionError::InvalidFrame(format!(
                        "frame size changed mid-run from {}x{} to {}x{}",
                        width, height, frame.width, frame.height
                    )));
                }
            }
        }

        let white = region_stats(&frame, white_regions);
        let black = region_stats(&frame, black_regions);
        info!(
            "Iter {}: Iw={:.1}, Ib={:.1}, std_w={:.1}, std_b={:.1}, exp={:.1} us",
            iteration, white.mean, black.mean, white.std, black.std, exposure
        );
        last = Some((white, black));

        if on_target(&white, &black, thresholds) {
            info!("Calibration target reached");
            return Ok(CalibrationOutcome {
                baseline: CalibrationBaseline {
                    exposure_us: exposure,
                    white_mean: white.mean,
                    black_mean: black.mean,
                },
                converged: true,
                iterations: iteration + 1,
                incomplete_frames,
            });
        }

        exposure = next_exposure(exposure, white.mean, thresholds).clamp(min_exposure, max_exposure);
        debug!(exposure, "Applying exposure");
        source.set_exposure(exposure)?;
    }

    let Some((white, black)) = last else {
        return Err(InspectionError::NoUsableFrame {
            attempts: max_iterations,
        });
    };

    warn!("Calibration loop ended without convergence");
    Ok(CalibrationOutcome {
        baseline: CalibrationBaseline {
            exposure_us: exposure,
            white_mean: white.mean,
            black_mean: black.mean,
        },
        converged: false,
        iterations: max_iterations,
        incomplete_frames,
    })
}

fn on_target(white: &RegionStats, black: &RegionStats, thresholds: &QcThresholds) -> bool {
    (white.mean - thresholds.target_white).abs() <= thresholds.white_tolerance
        && white.mean - black.mean >= thresholds.dynamic_range_min
        && white.mean < thresholds.saturation_level()
}

/// Proposed exposure before clamping to the device range.
pub(super) fn next_exposure(exposure: f64, white_mean: f64, thresholds: &QcThresholds) -> f64 {
    if white_mean >= thresholds.saturation_level() {
        exposure * SATURATED_STEP
    } else if white_mean > thresholds.target_white {
        exposure * BRIGHT_STEP
    } else {
        exposure * DARK_STEP
    }
}

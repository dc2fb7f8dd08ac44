//! Reference-region statistics shared by calibration and quality control.

use crate::inspection::common::error::{InspectionError, Result};
use crate::inspection::frame::{Frame, Region};

/// Mean and standard deviation of one region set.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RegionStats {
    pub mean: f64,
    pub std: f64,
}

/// Checks both region sets are non-empty and inside a `width` x `height` frame.
pub fn validate_regions(
    white_regions: &[Region],
    black_regions: &[Region],
    width: usize,
    height: usize,
) -> Result<()> {
    if white_regions.is_empty() {
        return Err(InspectionError::EmptyRegionSet("white"));
    }
    if black_regions.is_empty() {
        return Err(InspectionError::EmptyRegionSet("black"));
    }
    for region in white_regions.iter().chain(black_regions) {
        if !region.fits(width, height) {
            return Err(InspectionError::RegionOutOfBounds {
                region: *region,
                width,
                height,
            });
        }
    }
    Ok(())
}

/// Statistics over a region set.
///
/// Each region contributes its own mean and (population) standard deviation, and
/// the set reports the plain average of those, so a small patch weighs as much as
/// a large one. Regions must already be validated against the frame.
pub(crate) fn region_stats(frame: &Frame, regions: &[Region]) -> RegionStats {
    if regions.is_empty() {
        return RegionStats::default();
    }
    let (mean_sum, std_sum) = regions
        .iter()
        .map(|region| patch_stats(frame, region))
        .fold((0.0, 0.0), |(m, s), patch| (m + patch.mean, s + patch.std));
    let n = regions.len() as f64;
    RegionStats {
        mean: mean_sum / n,
        std: std_sum / n,
    }
}

fn patch_stats(frame: &Frame, region: &Region) -> RegionStats {
    let area = region.area() as f64;

    let sum: f64 = patch_values(frame, region).map(f64::from).sum();
    let mean = sum / area;
    let sq_dev: f64 = patch_values(frame, region)
        .map(|v| {
            let d = f64::from(v) - mean;
            d * d
        })
        .sum();

    RegionStats {
        mean,
        std: (sq_dev / area).sqrt(),
    }
}

fn patch_values<'a>(frame: &'a Frame, region: &'a Region) -> impl Iterator<Item = u16> + 'a {
    (region.y1..region.y2)
        .flat_map(move |y| frame.row_segment(y, region.x1, region.x2).iter().copied())
}

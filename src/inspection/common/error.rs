use thiserror::Error;

use crate::inspection::frame::{BitDepth, Region};
use crate::inspection::illumination::Channel;

#[derive(Error, Debug)]
pub enum InspectionError {
    #[error("ROI {region} is out of image bounds (w={width}, h={height}); update the white/black regions to match the reference tiles")]
    RegionOutOfBounds {
        region: Region,
        width: usize,
        height: usize,
    },

    #[error("No {0} regions configured")]
    EmptyRegionSet(&'static str),

    #[error("Degenerate region {0}: expected x1 < x2 and y1 < y2")]
    InvalidRegion(Region),

    #[error("Frame bit depth changed mid-run: expected {expected:?}, found {found:?}")]
    BitDepthMismatch {
        expected: BitDepth,
        found: BitDepth,
    },

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("No complete frame captured in {attempts} calibration attempts")]
    NoUsableFrame { attempts: usize },

    #[error("Device error: {0}")]
    Device(String),

    #[error("Unknown illumination channel {0}")]
    UnknownChannel(Channel),

    #[error("Channel {0} has no calibration baseline")]
    NotCalibrated(Channel),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl InspectionError {
    /// Configuration errors are fatal for the run and are never retried.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            InspectionError::RegionOutOfBounds { .. }
                | InspectionError::EmptyRegionSet(_)
                | InspectionError::InvalidRegion(_)
                | InspectionError::Config(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, InspectionError>;

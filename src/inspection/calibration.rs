//! Exposure auto-calibration against white and black reference patches.

mod calibrator;
pub mod types;

#[cfg(test)]
mod tests;

pub use calibrator::calibrate;
pub use types::{CalibrationBaseline, CalibrationOutcome};

//! Capture quality control
//!
//! Thresholds, the per-capture quality gate, and reference-based intensity
//! normalization.

mod gate;
mod normalize;
pub mod thresholds;


pub use gate::{evaluate, inspect, QualityReport, QualityWarning};
pub use normalize::{normalize, NormalizedFrame};
pub use thresholds::{QcThresholds, QcThresholdsBuilder};

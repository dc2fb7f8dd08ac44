//! Capture session orchestration
//!
//! Runs the rig sequence: calibrate each illumination channel once, then light
//! each channel in turn, capture, check quality against its baseline, normalize
//! and save.

mod sequencer;
mod timing;


pub use sequencer::{CaptureRecord, CaptureSession, CapturedFrame};
pub use timing::{SessionTimings, StepTiming, Timer};

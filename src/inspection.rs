//! Reference-patch exposure calibration and capture quality control
//!
//! This module drives a camera's exposure until a white and a black reference
//! patch sit in their target bands, then checks every later capture against that
//! baseline for drift, saturation, dynamic range and noise. Device access is kept
//! behind the `FrameSource` and `IlluminationController` traits.

pub mod common;
pub mod frame;
pub mod stats;
pub mod calibration;
pub mod quality;
pub mod illumination;
pub mod persist;
pub mod session;
pub mod config;

pub use common::{
    InspectionError,
    Result,
};

pub use frame::{
    BitDepth,
    Capture,
    Frame,
    FrameSource,
    Region,
    SyntheticFrameSource,
    SyntheticScene,
};

pub use stats::{
    validate_regions,
    RegionStats,
};

pub use calibration::{
    calibrate,
    CalibrationBaseline,
    CalibrationOutcome,
};

pub use quality::{
    evaluate,
    inspect,
    normalize,
    NormalizedFrame,
    QcThresholds,
    QcThresholdsBuilder,
    QualityReport,
    QualityWarning,
};

pub use illumination::{
    Channel,
    ChannelGuard,
    IlluminationController,
    RelayBank,
};

pub use persist::{
    FrameWriter,
    TiffCompression,
    TiffFrameWriter,
};

pub use session::{
    CaptureRecord,
    CapturedFrame,
    CaptureSession,
    SessionTimings,
};

pub use config::RigConfig;

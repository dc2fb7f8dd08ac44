use crate::inspection::common::error::{InspectionError, Result};
use crate::inspection::frame::types::Frame;

/// Outcome of a single acquisition.
#[derive(Debug, Clone)]
pub enum Capture {
    /// A complete frame.
    Frame(Frame),
    /// The driver delivered an incomplete or missing buffer. Transient.
    Incomplete,
}

/// Camera seam. Exposure values are in microseconds.
///
/// `capture` blocks until the device returns a buffer or times out. Hard device
/// failures come back as `Err`; a recoverable short read is `Ok(Capture::Incomplete)`.
pub trait FrameSource {
    fn capture(&mut self) -> Result<Capture>;
    fn exposure_range(&self) -> Result<(f64, f64)>;
    fn exposure(&self) -> Result<f64>;
    fn set_exposure(&mut self, exposure_us: f64) -> Result<()>;
}

impl<S: FrameSource + ?Sized> FrameSource for &mut S {
    fn capture(&mut self) -> Result<Capture> {
        (**self).capture()
    }

    fn exposure_range(&self) -> Result<(f64, f64)> {
        (**self).exposure_range()
    }

    fn exposure(&self) -> Result<f64> {
        (**self).exposure()
    }

    fn set_exposure(&mut self, exposure_us: f64) -> Result<()> {
        (**self).set_exposure(exposure_us)
    }
}

/// Device exposure range, rejected as a device error when it is inverted or NaN.
pub fn checked_exposure_range<S: FrameSource + ?Sized>(source: &S) -> Result<(f64, f64)> {
    let (min, max) = source.exposure_range()?;
    if !(min <= max) {
        return Err(InspectionError::Device(format!(
            "invalid exposure range [{}, {}]",
            min, max
        )));
    }
    Ok((min, max))
}

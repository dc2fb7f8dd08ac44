//! Frame acquisition module
//!
//! Grayscale frames, reference regions, and the `FrameSource` seam the camera
//! driver plugs into.

mod source;
mod synthetic;
pub mod types;


pub use source::{checked_exposure_range, Capture, FrameSource};
pub use synthetic::{SyntheticFrameSource, SyntheticScene};
pub use types::{BitDepth, Frame, Region};

//! Image persistence
//!
//! Raw and normalized captures are written as grayscale TIFF.

mod tiff_writer;
pub mod types;
mod writer;


pub use tiff_writer::TiffFrameWriter;
pub use types::TiffCompression;
pub use writer::FrameWriter;

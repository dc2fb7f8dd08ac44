use std::io::Write;

use crate::inspection::common::error::Result;
use crate::inspection::frame::Frame;
use crate::inspection::quality::NormalizedFrame;

pub trait FrameWriter {
    fn write_frame(&self, frame: &Frame, output: &mut dyn Write) -> Result<()>;
    fn write_normalized(&self, frame: &NormalizedFrame, output: &mut dyn Write) -> Result<()>;

    /// File extension used for saved captures, without the dot.
    fn extension(&self) -> &'static str;
}

use std::io::{Cursor, Write};

use tiff::encoder::colortype::{ColorType, Gray16, Gray8};
use tiff::encoder::compression::DeflateLevel;
use tiff::encoder::{Compression, TiffEncoder, TiffValue};
use tracing::debug;

use crate::inspection::common::error::{InspectionError, Result};
use crate::inspection::frame::{BitDepth, Frame};
use crate::inspection::persist::types::TiffCompression;
use crate::inspection::persist::writer::FrameWriter;
use crate::inspection::quality::NormalizedFrame;

/// Writes Mono8 frames as Gray8, Mono16 frames as Gray16, and normalized
/// frames as Gray8 scaled by 255.
#[derive(Debug, Clone, Copy, Default)]
pub struct TiffFrameWriter {
    pub compression: TiffCompression,
}

impl TiffFrameWriter {
    pub fn new(compression: TiffCompression) -> Self {
        Self { compression }
    }

    fn encode<C>(&self, width: usize, height: usize, data: &[C::Inner], output: &mut dyn Write) -> Result<()>
    where
        C: ColorType,
        [C::Inner]: TiffValue,
    {
        debug!("Encoding TIFF image: {}x{}", width, height);

        let compression = match self.compression {
            TiffCompression::None => Compression::Uncompressed,
            TiffCompression::Lzw => Compression::Lzw,
            TiffCompression::Deflate => Compression::Deflate(DeflateLevel::Balanced),
        };

        let mut buffer = Vec::new();
        TiffEncoder::new(Cursor::new(&mut buffer))
            .map_err(|e| InspectionError::Encode(e.to_string()))?
            .with_compression(compression)
            .write_image::<C>(width as u32, height as u32, data)
            .map_err(|e| InspectionError::Encode(e.to_string()))?;

        output.write_all(&buffer)?;
        Ok(())
    }
}

impl FrameWriter for TiffFrameWriter {
    fn write_frame(&self, frame: &Frame, output: &mut dyn Write) -> Result<()> {
        match frame.bit_depth {
            BitDepth::Mono8 => {
                let data: Vec<u8> = frame.data.iter().map(|&v| v as u8).collect();
                self.encode::<Gray8>(frame.width, frame.height, &data, output)
            }
            BitDepth::Mono16 => self.encode::<Gray16>(frame.width, frame.height, &frame.data, output),
        }
    }

    fn write_normalized(&self, frame: &NormalizedFrame, output: &mut dyn Write) -> Result<()> {
        self.encode::<Gray8>(frame.width, frame.height, &frame.to_gray8(), output)
    }

    fn extension(&self) -> &'static str {
        "tiff"
    }
}

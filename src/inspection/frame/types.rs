//! Frame and region types

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::inspection::common::error::{InspectionError, Result};

/// Pixel format of a grayscale frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BitDepth {
    /// 8 bits per sample, 0-255
    Mono8,
    /// 16 bits per sample, 0-65535
    Mono16,
}

impl BitDepth {
    /// Largest representable sample value.
    pub fn max_value(self) -> f64 {
        match self {
            BitDepth::Mono8 => u8::MAX as f64,
            BitDepth::Mono16 => u16::MAX as f64,
        }
    }
}

/// One acquired grayscale image, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Width of the frame in pixels
    pub width: usize,
    /// Height of the frame in pixels
    pub height: usize,
    /// Sample format reported by the source
    pub bit_depth: BitDepth,
    /// Samples, `width * height` of them; Mono8 values stay below 256
    pub data: Vec<u16>,
}

impl Frame {
    pub fn new(width: usize, height: usize, bit_depth: BitDepth, data: Vec<u16>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(InspectionError::InvalidFrame(format!(
                "zero-sized frame {}x{}",
                width, height
            )));
        }
        if data.len() != width * height {
            return Err(InspectionError::InvalidFrame(format!(
                "expected {} samples for {}x{}, got {}",
                width * height,
                width,
                height,
                data.len()
            )));
        }
        if bit_depth == BitDepth::Mono8 {
            if let Some(&v) = data.iter().find(|&&v| v > u8::MAX as u16) {
                return Err(InspectionError::InvalidFrame(format!(
                    "sample {} exceeds the Mono8 range",
                    v
                )));
            }
        }
        Ok(Self {
            width,
            height,
            bit_depth,
            data,
        })
    }

    /// Frame with every sample set to `value`.
    pub fn filled(width: usize, height: usize, bit_depth: BitDepth, value: u16) -> Result<Self> {
        Self::new(width, height, bit_depth, vec![value; width * height])
    }

    /// Samples of row `y` between `x1` (inclusive) and `x2` (exclusive).
    pub fn row_segment(&self, y: usize, x1: usize, x2: usize) -> &[u16] {
        let start = y * self.width;
        &self.data[start + x1..start + x2]
    }

    /// Writes `value` into every pixel of `region`. The region must fit the frame.
    pub fn fill_region(&mut self, region: &Region, value: u16) {
        for y in region.y1..region.y2 {
            let start = y * self.width;
            self.data[start + region.x1..start + region.x2].fill(value);
        }
    }
}

/// Axis-aligned rectangle `[x1, x2) x [y1, y2)` in pixel coordinates.
///
/// Serialized as `[x1, y1, x2, y2]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "[usize; 4]", into = "[usize; 4]")]
pub struct Region {
    pub x1: usize,
    pub y1: usize,
    pub x2: usize,
    pub y2: usize,
}

impl Region {
    pub fn new(x1: usize, y1: usize, x2: usize, y2: usize) -> Result<Self> {
        let region = Self { x1, y1, x2, y2 };
        if x1 >= x2 || y1 >= y2 {
            return Err(InspectionError::InvalidRegion(region));
        }
        Ok(region)
    }

    /// Whether the region lies inside a `width` x `height` frame.
    pub fn fits(&self, width: usize, height: usize) -> bool {
        self.x1 < self.x2 && self.x2 <= width && self.y1 < self.y2 && self.y2 <= height
    }

    pub fn width(&self) -> usize {
        self.x2 - self.x1
    }

    pub fn height(&self) -> usize {
        self.y2 - self.y1
    }

    pub fn area(&self) -> usize {
        self.width() * self.height()
    }
}

impl TryFrom<[usize; 4]> for Region {
    type Error = InspectionError;

    fn try_from([x1, y1, x2, y2]: [usize; 4]) -> Result<Self> {
        Region::new(x1, y1, x2, y2)
    }
}

impl From<Region> for [usize; 4] {
    fn from(r: Region) -> Self {
        [r.x1, r.y1, r.x2, r.y2]
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.x1, self.y1, self.x2, self.y2)
    }
}

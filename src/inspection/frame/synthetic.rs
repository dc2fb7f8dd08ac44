//! Deterministic stand-in for a camera looking at the reference tray.
//!
//! Each pixel follows a linear sensor response,
//! `counts = reflectance * exposure_us * responsivity + dark_offset`, clamped to the
//! bit depth. A small fixed-pattern ripple gives the patches a non-zero spread.

use tracing::debug;

use crate::inspection::common::error::{InspectionError, Result};
use crate::inspection::frame::source::{Capture, FrameSource};
use crate::inspection::frame::types::{BitDepth, Frame, Region};

/// Geometry and photometry of the simulated tray.
#[derive(Debug, Clone)]
pub struct SyntheticScene {
    pub width: usize,
    pub height: usize,
    pub bit_depth: BitDepth,
    pub white_regions: Vec<Region>,
    pub black_regions: Vec<Region>,
    pub white_reflectance: f64,
    pub black_reflectance: f64,
    pub background_reflectance: f64,
    /// Counts per microsecond of exposure at reflectance 1.0
    pub responsivity: f64,
    pub dark_offset: f64,
    /// Peak amplitude of the +/- fixed-pattern ripple, in counts
    pub ripple: f64,
}

impl Default for SyntheticScene {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 960,
            bit_depth: BitDepth::Mono8,
            white_regions: vec![
                Region { x1: 100, y1: 100, x2: 150, y2: 150 },
                Region { x1: 1000, y1: 100, x2: 1050, y2: 150 },
            ],
            black_regions: vec![
                Region { x1: 100, y1: 800, x2: 150, y2: 850 },
                Region { x1: 1000, y1: 800, x2: 1050, y2: 850 },
            ],
            white_reflectance: 0.9,
            black_reflectance: 0.05,
            background_reflectance: 0.4,
            responsivity: 0.02,
            dark_offset: 4.0,
            ripple: 1.0,
        }
    }
}

pub struct SyntheticFrameSource {
    scene: SyntheticScene,
    exposure_us: f64,
    exposure_range: (f64, f64),
    incomplete_every: Option<usize>,
    pending_failures: usize,
    captures: usize,
}

impl SyntheticFrameSource {
    pub fn new(scene: SyntheticScene, initial_exposure_us: f64) -> Result<Self> {
        for region in scene.white_regions.iter().chain(&scene.black_regions) {
            if !region.fits(scene.width, scene.height) {
                return Err(InspectionError::RegionOutOfBounds {
                    region: *region,
                    width: scene.width,
                    height: scene.height,
                });
            }
        }
        Ok(Self {
            scene,
            exposure_us: initial_exposure_us,
            exposure_range: (10.0, 30_000.0),
            incomplete_every: None,
            pending_failures: 0,
            captures: 0,
        })
    }

    pub fn with_exposure_range(mut self, min: f64, max: f64) -> Self {
        self.exposure_range = (min, max);
        self.exposure_us = self.exposure_us.clamp(min, max);
        self
    }

    /// Every `n`-th capture reports `Capture::Incomplete`.
    pub fn with_incomplete_every(mut self, n: usize) -> Self {
        self.incomplete_every = (n > 0).then_some(n);
        self
    }

    /// Lets callers change lighting between captures, e.g. to provoke drift.
    pub fn scene_mut(&mut self) -> &mut SyntheticScene {
        &mut self.scene
    }

    /// The next `n` captures report `Capture::Incomplete`.
    pub fn fail_next(&mut self, n: usize) {
        self.pending_failures = n;
    }

    fn counts(&self, reflectance: f64, x: usize, y: usize) -> u16 {
        let ripple = match (x + y) % 3 {
            0 => -self.scene.ripple,
            1 => 0.0,
            _ => self.scene.ripple,
        };
        let value = reflectance * self.exposure_us * self.scene.responsivity
            + self.scene.dark_offset
            + ripple;
        value.round().clamp(0.0, self.scene.bit_depth.max_value()) as u16
    }

    fn render(&self) -> Result<Frame> {
        let scene = &self.scene;
        let mut data = Vec::with_capacity(scene.width * scene.height);
        for y in 0..scene.height {
            for x in 0..scene.width {
                data.push(self.counts(scene.background_reflectance, x, y));
            }
        }
        let mut frame = Frame::new(scene.width, scene.height, scene.bit_depth, data)?;
        for (regions, reflectance) in [
            (&scene.white_regions, scene.white_reflectance),
            (&scene.black_regions, scene.black_reflectance),
        ] {
            for region in regions {
                for y in region.y1..region.y2 {
                    for x in region.x1..region.x2 {
                        frame.data[y * scene.width + x] = self.counts(reflectance, x, y);
                    }
                }
            }
        }
        Ok(frame)
    }
}

impl FrameSource for SyntheticFrameSource {
    fn capture(&mut self) -> Result<Capture> {
        self.captures += 1;
        if self.pending_failures > 0 {
            self.pending_failures -= 1;
            return Ok(Capture::Incomplete);
        }
        if let Some(n) = self.incomplete_every {
            if self.captures % n == 0 {
                debug!(capture = self.captures, "Simulating incomplete frame");
                return Ok(Capture::Incomplete);
            }
        }
        Ok(Capture::Frame(self.render()?))
    }

    fn exposure_range(&self) -> Result<(f64, f64)> {
        Ok(self.exposure_range)
    }

    fn exposure(&self) -> Result<f64> {
        Ok(self.exposure_us)
    }

    fn set_exposure(&mut self, exposure_us: f64) -> Result<()> {
        let (min, max) = self.exposure_range;
        if !(min..=max).contains(&exposure_us) {
            return Err(InspectionError::Device(format!(
                "exposure {:.1} us outside [{:.1}, {:.1}]",
                exposure_us, min, max
            )));
        }
        self.exposure_us = exposure_us;
        Ok(())
    }
}

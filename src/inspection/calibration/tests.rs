use std::collections::VecDeque;

use crate::inspection::calibration::calibrate;
use crate::inspection::calibration::calibrator::next_exposure;
use crate::inspection::common::error::{InspectionError, Result};
use crate::inspection::frame::{
    BitDepth, Capture, Frame, FrameSource, Region, SyntheticFrameSource, SyntheticScene,
};
use crate::inspection::quality::{evaluate, QcThresholds};

const WIDTH: usize = 40;
const HEIGHT: usize = 30;

fn white_regions() -> Vec<Region> {
    vec![Region::new(2, 2, 8, 8).unwrap(), Region::new(30, 2, 36, 8).unwrap()]
}

fn black_regions() -> Vec<Region> {
    vec![Region::new(2, 20, 8, 26).unwrap()]
}

fn reference_frame(white: u16, black: u16) -> Frame {
    let mut frame = Frame::filled(WIDTH, HEIGHT, BitDepth::Mono8, 90).unwrap();
    for region in white_regions() {
        frame.fill_region(&region, white);
    }
    for region in black_regions() {
        frame.fill_region(&region, black);
    }
    frame
}

/// Replays queued captures; once the queue is empty the last frame repeats.
struct ScriptedSource {
    captures: VecDeque<Capture>,
    last: Option<Frame>,
    exposure: f64,
    range: (f64, f64),
    applied: Vec<f64>,
    capture_count: usize,
}

impl ScriptedSource {
    fn new(captures: Vec<Capture>, exposure: f64) -> Self {
        Self {
            captures: captures.into(),
            last: None,
            exposure,
            range: (10.0, 30_000.0),
            applied: Vec::new(),
            capture_count: 0,
        }
    }

    fn frames(frames: Vec<Frame>, exposure: f64) -> Self {
        Self::new(frames.into_iter().map(Capture::Frame).collect(), exposure)
    }
}

impl FrameSource for ScriptedSource {
    fn capture(&mut self) -> Result<Capture> {
        self.capture_count += 1;
        match self.captures.pop_front() {
            Some(Capture::Frame(frame)) => {
                self.last = Some(frame.clone());
                Ok(Capture::Frame(frame))
            }
            Some(Capture::Incomplete) => Ok(Capture::Incomplete),
            None => Ok(self.last.clone().map(Capture::Frame).unwrap_or(Capture::Incomplete)),
        }
    }

    fn exposure_range(&self) -> Result<(f64, f64)> {
        Ok(self.range)
    }

    fn exposure(&self) -> Result<f64> {
        Ok(self.exposure)
    }

    fn set_exposure(&mut self, exposure_us: f64) -> Result<()> {
        self.exposure = exposure_us;
        self.applied.push(exposure_us);
        Ok(())
    }
}

#[test]
fn test_converges_on_first_frame_without_touching_exposure() {
    let mut source = ScriptedSource::frames(vec![reference_frame(180, 20)], 5000.0);

    let outcome = calibrate(&mut source, &white_regions(), &black_regions(), &QcThresholds::default(), 12).unwrap();

    assert!(outcome.converged);
    assert_eq!(outcome.iterations, 1);
    assert_eq!(outcome.baseline.exposure_us, 5000.0);
    assert_eq!(outcome.baseline.white_mean, 180.0);
    assert_eq!(outcome.baseline.black_mean, 20.0);
    assert!(source.applied.is_empty());
}

#[test]
fn test_saturated_white_cuts_exposure_hard() {
    let mut source = ScriptedSource::frames(
        vec![reference_frame(250, 20), reference_frame(180, 20)],
        1000.0,
    );

    let outcome = calibrate(&mut source, &white_regions(), &black_regions(), &QcThresholds::default(), 12).unwrap();

    assert!(outcome.converged);
    assert_eq!(outcome.iterations, 2);
    assert_eq!(source.applied.len(), 1);
    assert!((source.applied[0] - 700.0).abs() < 1e-9);
    assert!((outcome.baseline.exposure_us - 700.0).abs() < 1e-9);
}

#[test]
fn test_bright_white_decreases_gently() {
    let mut source = ScriptedSource::frames(
        vec![reference_frame(200, 20), reference_frame(181, 20)],
        1000.0,
    );

    calibrate(&mut source, &white_regions(), &black_regions(), &QcThresholds::default(), 12).unwrap();

    assert!((source.applied[0] - 900.0).abs() < 1e-9);
}

#[test]
fn test_dark_white_increases_exposure() {
    let mut source = ScriptedSource::frames(
        vec![reference_frame(100, 20), reference_frame(178, 20)],
        1000.0,
    );

    calibrate(&mut source, &white_regions(), &black_regions(), &QcThresholds::default(), 12).unwrap();

    assert!((source.applied[0] - 1300.0).abs() < 1e-9);
}

#[test]
fn test_low_dynamic_range_blocks_convergence() {
    // White on target but black too close to it
    let mut source = ScriptedSource::frames(vec![reference_frame(180, 170)], 1000.0);

    let outcome = calibrate(&mut source, &white_regions(), &black_regions(), &QcThresholds::default(), 3).unwrap();

    assert!(!outcome.converged);
    // 180 is not above target, so the rule increases exposure
    assert!((source.applied[0] - 1300.0).abs() < 1e-9);
}

#[test]
fn test_step_selection() {
    let thresholds = QcThresholds::default();
    // Saturation level is 0.98 * 255 = 249.9
    assert!((next_exposure(100.0, 250.0, &thresholds) - 70.0).abs() < 1e-9);
    assert!((next_exposure(100.0, thresholds.saturation_level(), &thresholds) - 70.0).abs() < 1e-9);
    assert!((next_exposure(100.0, 249.0, &thresholds) - 90.0).abs() < 1e-9);
    assert!((next_exposure(100.0, 180.0, &thresholds) - 130.0).abs() < 1e-9);
    assert!((next_exposure(100.0, 0.0, &thresholds) - 130.0).abs() < 1e-9);
}

#[test]
fn test_exposure_clamped_to_device_range() {
    let mut dark = ScriptedSource::frames(vec![reference_frame(50, 5)], 25_000.0);
    let outcome = calibrate(&mut dark, &white_regions(), &black_regions(), &QcThresholds::default(), 4).unwrap();
    assert!(dark.applied.iter().all(|&e| (10.0..=30_000.0).contains(&e)));
    assert_eq!(outcome.baseline.exposure_us, 30_000.0);

    let mut bright = ScriptedSource::frames(vec![reference_frame(255, 5)], 12.0);
    let outcome = calibrate(&mut bright, &white_regions(), &black_regions(), &QcThresholds::default(), 4).unwrap();
    assert!(bright.applied.iter().all(|&e| (10.0..=30_000.0).contains(&e)));
    assert_eq!(outcome.baseline.exposure_us, 10.0);
}

#[test]
fn test_exhausted_iterations_return_last_values() {
    let mut source = ScriptedSource::frames(vec![reference_frame(100, 20)], 100.0);

    let outcome = calibrate(&mut source, &white_regions(), &black_regions(), &QcThresholds::default(), 3).unwrap();

    assert!(!outcome.converged);
    assert_eq!(outcome.iterations, 3);
    assert_eq!(outcome.baseline.white_mean, 100.0);
    assert_eq!(outcome.baseline.black_mean, 20.0);
    assert_eq!(source.applied.len(), 3);
    assert!((outcome.baseline.exposure_us - 100.0 * 1.3 * 1.3 * 1.3).abs() < 1e-9);
}

#[test]
fn test_incomplete_frame_consumes_an_iteration() {
    let mut source = ScriptedSource::new(
        vec![Capture::Incomplete, Capture::Frame(reference_frame(180, 20))],
        5000.0,
    );

    let outcome = calibrate(&mut source, &white_regions(), &black_regions(), &QcThresholds::default(), 12).unwrap();

    assert!(outcome.converged);
    assert_eq!(outcome.iterations, 2);
    assert_eq!(outcome.incomplete_frames, 1);
    assert!(source.applied.is_empty());
}

#[test]
fn test_incomplete_frames_can_exhaust_budget() {
    let mut source = ScriptedSource::new(
        vec![Capture::Incomplete, Capture::Incomplete, Capture::Frame(reference_frame(180, 20))],
        5000.0,
    );

    let result = calibrate(&mut source, &white_regions(), &black_regions(), &QcThresholds::default(), 2);

    assert!(matches!(result, Err(InspectionError::NoUsableFrame { attempts: 2 })));
}

#[test]
fn test_out_of_bounds_region_is_fatal_and_not_retried() {
    let white = vec![Region::new(30, 2, 41, 8).unwrap()];
    let mut source = ScriptedSource::frames(vec![reference_frame(180, 20)], 5000.0);

    let err = calibrate(&mut source, &white, &black_regions(), &QcThresholds::default(), 12).unwrap_err();

    assert!(err.is_configuration());
    assert!(matches!(err, InspectionError::RegionOutOfBounds { width: WIDTH, height: HEIGHT, .. }));
    assert_eq!(source.capture_count, 1);
}

#[test]
fn test_empty_region_set_rejected_before_capture() {
    let mut source = ScriptedSource::frames(vec![reference_frame(180, 20)], 5000.0);

    let err = calibrate(&mut source, &white_regions(), &[], &QcThresholds::default(), 12).unwrap_err();

    assert!(matches!(err, InspectionError::EmptyRegionSet("black")));
    assert_eq!(source.capture_count, 0);
}

#[test]
fn test_bit_depth_change_aborts_run() {
    let mono16 = Frame::filled(WIDTH, HEIGHT, BitDepth::Mono16, 1000).unwrap();
    let mut source = ScriptedSource::frames(vec![reference_frame(100, 20), mono16], 5000.0);

    let err = calibrate(&mut source, &white_regions(), &black_regions(), &QcThresholds::default(), 12).unwrap_err();

    assert!(matches!(
        err,
        InspectionError::BitDepthMismatch { expected: BitDepth::Mono8, found: BitDepth::Mono16 }
    ));
}

#[test]
fn test_synthetic_rig_converges() {
    let scene = SyntheticScene::default();
    let white = scene.white_regions.clone();
    let black = scene.black_regions.clone();
    let mut source = SyntheticFrameSource::new(scene, 5000.0).unwrap();
    let thresholds = QcThresholds::default();

    let outcome = calibrate(&mut source, &white, &black, &thresholds, 12).unwrap();

    assert!(outcome.converged);
    assert!((outcome.baseline.white_mean - thresholds.target_white).abs() <= thresholds.white_tolerance);
    assert!(outcome.baseline.white_mean - outcome.baseline.black_mean >= thresholds.dynamic_range_min);
    assert_eq!(source.exposure().unwrap(), outcome.baseline.exposure_us);
}

#[test]
fn test_recalibration_continues_from_current_exposure() {
    let scene = SyntheticScene::default();
    let white = scene.white_regions.clone();
    let black = scene.black_regions.clone();
    let mut source = SyntheticFrameSource::new(scene, 5000.0).unwrap();
    let thresholds = QcThresholds::default();

    let first = calibrate(&mut source, &white, &black, &thresholds, 12).unwrap();
    let second = calibrate(&mut source, &white, &black, &thresholds, 12).unwrap();

    assert_eq!(second.iterations, 1);
    assert_eq!(second.baseline.exposure_us, first.baseline.exposure_us);
}

#[test]
fn test_synthetic_rig_converges_through_dropped_frames() {
    let scene = SyntheticScene::default();
    let white = scene.white_regions.clone();
    let black = scene.black_regions.clone();
    let mut source = SyntheticFrameSource::new(scene, 5000.0).unwrap().with_incomplete_every(2);
    let thresholds = QcThresholds::default();

    let outcome = calibrate(&mut source, &white, &black, &thresholds, 12).unwrap();

    assert!(outcome.converged);
    assert!(outcome.incomplete_frames > 0);
    assert_eq!(outcome.incomplete_frames, 4);
    assert_eq!(outcome.iterations, 9);
    assert!((outcome.baseline.white_mean - thresholds.target_white).abs() <= thresholds.white_tolerance);
}

#[test]
fn test_mono16_rig_converges_and_passes_qc() {
    let scene = SyntheticScene {
        width: 160,
        height: 120,
        bit_depth: BitDepth::Mono16,
        white_regions: vec![Region::new(10, 10, 30, 30).unwrap(), Region::new(130, 10, 150, 30).unwrap()],
        black_regions: vec![Region::new(10, 90, 30, 110).unwrap()],
        responsivity: 0.02 * 257.0,
        dark_offset: 4.0 * 257.0,
        ripple: 257.0,
        ..SyntheticScene::default()
    };
    let white = scene.white_regions.clone();
    let black = scene.black_regions.clone();
    let mut source = SyntheticFrameSource::new(scene, 5000.0).unwrap();
    let thresholds = QcThresholds::for_bit_depth(BitDepth::Mono16);

    let outcome = calibrate(&mut source, &white, &black, &thresholds, 12).unwrap();

    assert!(outcome.converged);
    assert!((outcome.baseline.white_mean - thresholds.target_white).abs() <= thresholds.white_tolerance);
    assert!(outcome.baseline.white_mean < thresholds.saturation_level());
    assert!(outcome.baseline.white_mean > 255.0 * 100.0);

    let Capture::Frame(frame) = source.capture().unwrap() else {
        panic!("synthetic source returned an incomplete frame");
    };
    let warnings = evaluate(&frame, &white, &black, &thresholds, &outcome.baseline).unwrap();
    assert!(warnings.is_empty(), "unexpected warnings: {:?}", warnings);
}

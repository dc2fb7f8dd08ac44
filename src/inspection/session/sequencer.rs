use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::thread;

use chrono::{DateTime, Local};
use tracing::{info, instrument, warn};

use crate::inspection::calibration::{calibrate, CalibrationBaseline, CalibrationOutcome};
use crate::inspection::common::error::{InspectionError, Result};
use crate::inspection::config::RigConfig;
use crate::inspection::frame::{checked_exposure_range, Capture, Frame, FrameSource};
use crate::inspection::illumination::{Channel, ChannelGuard, IlluminationController};
use crate::inspection::persist::{FrameWriter, TiffFrameWriter};
use crate::inspection::quality::{inspect, normalize, NormalizedFrame, QualityReport};
use crate::inspection::session::timing::{SessionTimings, Timer};

/// A complete frame with its QC verdict.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    pub frame: Frame,
    /// Normalized with this capture's own white/black means
    pub normalized: NormalizedFrame,
    pub report: QualityReport,
    /// Files written for this capture, raw first
    pub saved: Vec<PathBuf>,
}

/// Result of one capture attempt on one channel.
#[derive(Debug, Clone)]
pub struct CaptureRecord {
    pub channel: Channel,
    pub exposure_us: f64,
    pub captured_at: DateTime<Local>,
    /// `None` when the camera returned an incomplete frame
    pub capture: Option<CapturedFrame>,
}

impl CaptureRecord {
    pub fn is_complete(&self) -> bool {
        self.capture.is_some()
    }
}

/// Drives one camera and one relay bank through calibration and capture.
///
/// Baselines live for the lifetime of the session and are replaced by
/// recalibration. Only one channel is lit at a time, and only while it is being
/// calibrated or captured.
pub struct CaptureSession<S, L, W = TiffFrameWriter> {
    source: S,
    illumination: L,
    writer: Option<W>,
    config: RigConfig,
    baselines: BTreeMap<Channel, CalibrationBaseline>,
    timings: SessionTimings,
}

impl<S: FrameSource, L: IlluminationController> CaptureSession<S, L, TiffFrameWriter> {
    /// Session that keeps results in memory only.
    pub fn new(source: S, illumination: L, config: RigConfig) -> Result<Self> {
        Self::with_writer(source, illumination, None, config)
    }

    /// Session that saves raw and normalized TIFFs per the capture config.
    pub fn with_tiff_output(source: S, illumination: L, config: RigConfig) -> Result<Self> {
        let writer = TiffFrameWriter::new(config.capture.compression);
        Self::with_writer(source, illumination, Some(writer), config)
    }
}

impl<S: FrameSource, L: IlluminationController, W: FrameWriter> CaptureSession<S, L, W> {
    /// Validates `config` and moves the camera to the initial exposure.
    pub fn with_writer(mut source: S, illumination: L, writer: Option<W>, config: RigConfig) -> Result<Self> {
        config.validate()?;

        let (min, max) = checked_exposure_range(&source)?;
        let initial = config.calibration.initial_exposure_us.clamp(min, max);
        source.set_exposure(initial)?;
        info!("Camera exposure set to {:.1} us", initial);

        Ok(Self {
            source,
            illumination,
            writer,
            config,
            baselines: BTreeMap::new(),
            timings: SessionTimings::new(),
        })
    }

    pub fn config(&self) -> &RigConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn illumination(&self) -> &L {
        &self.illumination
    }

    pub fn timings(&self) -> &SessionTimings {
        &self.timings
    }

    pub fn baseline(&self, channel: Channel) -> Option<&CalibrationBaseline> {
        self.baselines.get(&channel)
    }

    /// Forgets every baseline, e.g. after the camera was reconnected.
    pub fn reset_baselines(&mut self) {
        self.baselines.clear();
    }

    fn check_channel(&self, channel: Channel) -> Result<()> {
        if self.config.channels.contains(&channel) {
            Ok(())
        } else {
            Err(InspectionError::UnknownChannel(channel))
        }
    }

    /// Lights `channel`, calibrates exposure under it and stores the baseline.
    #[instrument(skip_all, fields(channel = %channel))]
    pub fn calibrate_channel(&mut self, channel: Channel) -> Result<CalibrationOutcome> {
        self.check_channel(channel)?;
        let timer = Timer::start(format!("calibrate {}", channel));

        let outcome = {
            let _lit = ChannelGuard::enable(&mut self.illumination, channel)?;
            thread::sleep(self.config.calibration.settle());
            calibrate(
                &mut self.source,
                &self.config.regions.white,
                &self.config.regions.black,
                &self.config.thresholds,
                self.config.calibration.max_iterations,
            )?
        };

        self.timings.record(timer);
        let baseline = outcome.baseline;
        info!(
            "[{}] Calibrated: exp={:.1} us, Iw={:.1}, Ib={:.1}, converged={}",
            channel, baseline.exposure_us, baseline.white_mean, baseline.black_mean, outcome.converged
        );
        self.baselines.insert(channel, baseline);
        Ok(outcome)
    }

    /// Calibrates every configured channel in order.
    pub fn calibrate_all(&mut self) -> Result<Vec<(Channel, CalibrationOutcome)>> {
        let channels = self.config.channels.clone();
        channels
            .into_iter()
            .map(|channel| self.calibrate_channel(channel).map(|outcome| (channel, outcome)))
            .collect()
    }

    /// Captures one frame under `channel` at its calibrated exposure and checks it.
    #[instrument(skip_all, fields(channel = %channel))]
    pub fn capture_channel(&mut self, channel: Channel) -> Result<CaptureRecord> {
        self.check_channel(channel)?;
        let baseline = *self
            .baselines
            .get(&channel)
            .ok_or(InspectionError::NotCalibrated(channel))?;
        let timer = Timer::start(format!("capture {}", channel));

        self.source.set_exposure(baseline.exposure_us)?;
        let captured_at = Local::now();
        let capture = {
            let _lit = ChannelGuard::enable(&mut self.illumination, channel)?;
            thread::sleep(self.config.capture.settle());
            self.source.capture()?
        };

        let capture = match capture {
            Capture::Frame(frame) => Some(self.check_and_save(channel, frame, &baseline, &captured_at)?),
            Capture::Incomplete => {
                warn!("[{}] Failed to capture image", channel);
                None
            }
        };

        self.timings.record(timer);
        Ok(CaptureRecord {
            channel,
            exposure_us: baseline.exposure_us,
            captured_at,
            capture,
        })
    }

    /// Captures every configured channel in order. Incomplete frames are reported
    /// in the records, not as errors.
    pub fn capture_all(&mut self) -> Result<Vec<CaptureRecord>> {
        let channels = self.config.channels.clone();
        channels
            .into_iter()
            .map(|channel| self.capture_channel(channel))
            .collect()
    }

    /// Switches every configured channel off.
    pub fn shutdown(&mut self) -> Result<()> {
        for &channel in &self.config.channels {
            self.illumination.disable(channel)?;
        }
        self.timings.log_summary();
        Ok(())
    }

    fn check_and_save(
        &self,
        channel: Channel,
        frame: Frame,
        baseline: &CalibrationBaseline,
        captured_at: &DateTime<Local>,
    ) -> Result<CapturedFrame> {
        let report = inspect(
            &frame,
            &self.config.regions.white,
            &self.config.regions.black,
            &self.config.thresholds,
            baseline,
        )?;
        info!(
            "[{}] Capture stats: Iw={:.1}, Ib={:.1}, std_w={:.1}, std_b={:.1}",
            channel, report.white.mean, report.black.mean, report.white.std, report.black.std
        );

        let normalized = normalize(&frame, report.white.mean, report.black.mean);
        let saved = match &self.writer {
            Some(writer) => self.save(writer, channel, &frame, &normalized, captured_at)?,
            None => Vec::new(),
        };

        Ok(CapturedFrame {
            frame,
            normalized,
            report,
            saved,
        })
    }

    fn save(
        &self,
        writer: &W,
        channel: Channel,
        frame: &Frame,
        normalized: &NormalizedFrame,
        captured_at: &DateTime<Local>,
    ) -> Result<Vec<PathBuf>> {
        let capture = &self.config.capture;
        if !capture.save_raw && !capture.save_normalized {
            return Ok(Vec::new());
        }
        fs::create_dir_all(&capture.output_directory)?;

        let stamp = captured_at.format("%Y%m%d-%H%M%S");
        let mut saved = Vec::new();
        if capture.save_raw {
            let path = capture_path(&capture.output_directory, channel, "raw", &stamp, writer.extension());
            let mut file = BufWriter::new(File::create(&path)?);
            writer.write_frame(frame, &mut file)?;
            file.flush()?;
            info!("[{}] Saved raw -> {}", channel, path.display());
            saved.push(path);
        }
        if capture.save_normalized {
            let path = capture_path(&capture.output_directory, channel, "norm", &stamp, writer.extension());
            let mut file = BufWriter::new(File::create(&path)?);
            writer.write_normalized(normalized, &mut file)?;
            file.flush()?;
            info!("[{}] Saved normalized -> {}", channel, path.display());
            saved.push(path);
        }
        Ok(saved)
    }
}

fn capture_path(dir: &Path, channel: Channel, kind: &str, stamp: &impl std::fmt::Display, extension: &str) -> PathBuf {
    dir.join(format!("LED{}_{}_{}.{}", channel.0, kind, stamp, extension))
}

use anyhow::Context;
use refcal::inspection::{
    CaptureSession, FrameSource, IlluminationController, RelayBank, RigConfig, SyntheticFrameSource,
    SyntheticScene,
};
use refcal::logger;

use tracing::{error, info, warn};

fn main() -> anyhow::Result<()> {
    logger::init();

    info!("Starting refcal...");

    let config = match std::env::args().nth(1) {
        Some(path) => RigConfig::load(&path).with_context(|| format!("loading rig config {}", path))?,
        None => {
            info!("No config given, using defaults");
            RigConfig::default()
        }
    };

    let scene = SyntheticScene {
        white_regions: config.regions.white.clone(),
        black_regions: config.regions.black.clone(),
        ..SyntheticScene::default()
    };
    let source = SyntheticFrameSource::new(scene, config.calibration.initial_exposure_us)
        .context("building simulated camera")?;
    let relays = RelayBank::new(config.channels.iter().copied());

    let mut session = CaptureSession::with_tiff_output(source, relays, config)?;
    info!("Output directory: {}", session.config().capture.output_directory.display());

    let result = run(&mut session);
    if let Err(e) = session.shutdown() {
        error!("Failed to switch illumination off: {}", e);
    }
    result
}

fn run<S: FrameSource, L: IlluminationController>(session: &mut CaptureSession<S, L>) -> anyhow::Result<()> {
    info!("=== STEP 1: Calibration ===");
    for (channel, outcome) in session.calibrate_all()? {
        if !outcome.converged {
            warn!("[{}] Calibration did not converge, using best effort baseline", channel);
        }
    }

    info!("=== STEP 2: Capture ===");
    let records = session.capture_all()?;

    let mut flagged = 0;
    for record in &records {
        match &record.capture {
            Some(capture) if capture.report.is_ok() => info!("[{}] QC OK", record.channel),
            Some(capture) => {
                flagged += 1;
                warn!("[{}] {} QC warning(s)", record.channel, capture.report.warnings.len());
            }
            None => {
                flagged += 1;
                error!("[{}] No image captured", record.channel);
            }
        }
    }

    info!("All captures complete: {} channel(s), {} flagged", records.len(), flagged);
    Ok(())
}

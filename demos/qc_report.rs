//! Re-runs the quality gate on a saved raw capture.
//!
//! Usage: qc_report <raw.tiff> <baseline white mean> [rig.toml]

use anyhow::{bail, Context};
use refcal::inspection::{
    inspect, BitDepth, CalibrationBaseline, Frame, RigConfig,
};
use tiff::decoder::{Decoder, DecodingResult};

fn read_frame(path: &str) -> anyhow::Result<Frame> {
    let mut decoder = Decoder::new(std::fs::File::open(path)?)?;
    let (width, height) = decoder.dimensions()?;

    let (bit_depth, data) = match decoder.read_image()? {
        DecodingResult::U8(data) => (BitDepth::Mono8, data.into_iter().map(u16::from).collect()),
        DecodingResult::U16(data) => (BitDepth::Mono16, data),
        _ => bail!("{} is not an 8 or 16 bit grayscale image", path),
    };

    Ok(Frame::new(width as usize, height as usize, bit_depth, data)?)
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        let program = args.first().map_or("qc_report", String::as_str);
        bail!("usage: {} <raw.tiff> <baseline white mean> [rig.toml]", program);
    }

    let frame = read_frame(&args[1]).with_context(|| format!("reading {}", args[1]))?;
    let white_mean: f64 = args[2].parse().context("baseline white mean")?;
    let config = match args.get(3) {
        Some(path) => RigConfig::load(path)?,
        None => RigConfig::default(),
    };

    let baseline = CalibrationBaseline {
        exposure_us: 0.0,
        white_mean,
        black_mean: 0.0,
    };
    let report = inspect(
        &frame,
        &config.regions.white,
        &config.regions.black,
        &config.thresholds,
        &baseline,
    )?;

    println!("Image: {}x{} pixels ({:?})", frame.width, frame.height, frame.bit_depth);
    println!("White: mean {:.1}, std {:.1}", report.white.mean, report.white.std);
    println!("Black: mean {:.1}, std {:.1}", report.black.mean, report.black.std);
    println!("Dynamic range: {:.1}", report.dynamic_range());

    let max = frame.bit_depth.max_value() as u16;
    let clipped = frame.data.iter().filter(|&&v| v == max).count();
    println!(
        "Clipped at {}: {} pixels ({:.2}%)",
        max,
        clipped,
        clipped as f64 / frame.data.len() as f64 * 100.0
    );

    if report.is_ok() {
        println!("QC OK.");
    } else {
        println!("WARNINGS:");
        for warning in &report.warnings {
            println!("   - {}", warning);
        }
    }
    Ok(())
}

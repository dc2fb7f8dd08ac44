use crate::inspection::frame::Frame;

/// Floor for the white-black span so equal references cannot divide by zero.
const SPAN_EPSILON: f64 = 1e-6;

/// Frame rescaled so the black reference maps to 0.0 and the white one to 1.0.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedFrame {
    pub width: usize,
    pub height: usize,
    /// Row-major samples in `[0.0, 1.0]`
    pub data: Vec<f32>,
}

impl NormalizedFrame {
    /// 8-bit rendering for saving (`value * 255`, truncated).
    pub fn to_gray8(&self) -> Vec<u8> {
        self.data.iter().map(|&v| (v * 255.0) as u8).collect()
    }
}

/// Maps `frame` linearly through `gain = 1 / max(white - black, 1e-6)` and
/// `offset = -black * gain`, clamping the result into `[0, 1]`.
pub fn normalize(frame: &Frame, white_mean: f64, black_mean: f64) -> NormalizedFrame {
    let gain = 1.0 / (white_mean - black_mean).max(SPAN_EPSILON);
    let offset = -black_mean * gain;

    let data = frame
        .data
        .iter()
        .map(|&v| (v as f64 * gain + offset).clamp(0.0, 1.0) as f32)
        .collect();

    NormalizedFrame {
        width: frame.width,
        height: frame.height,
        data,
    }
}

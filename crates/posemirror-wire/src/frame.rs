//! Orientation frame parsing and encoding

use std::fmt::Write as _;

use posemirror_core::{Landmark, Rotation3D};

/// Header token every frame must start with
pub const FRAME_HEADER: &str = "mprot";

/// Field separator within a sample line
pub const FIELD_SEPARATOR: char = '|';

/// Maximum datagram size accepted by receivers
pub const MAX_FRAME_SIZE: usize = 2048;

/// One landmark orientation sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandmarkSample {
    pub landmark: Landmark,
    pub rotation: Rotation3D,
}

impl LandmarkSample {
    pub fn new(landmark: Landmark, rotation: Rotation3D) -> Self {
        Self { landmark, rotation }
    }
}

/// A decoded frame: the samples that parsed, in line order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoseFrame {
    pub samples: Vec<LandmarkSample>,
    /// Non-blank lines that were dropped
    pub skipped_lines: usize,
}

impl PoseFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample (builder style, used by senders)
    pub fn with_sample(mut self, landmark: Landmark, rotation: Rotation3D) -> Self {
        self.samples.push(LandmarkSample::new(landmark, rotation));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Serialize to the text wire format
    pub fn encode(&self) -> String {
        let mut out = String::with_capacity(FRAME_HEADER.len() + 1 + self.samples.len() * 48);
        out.push_str(FRAME_HEADER);
        out.push('\n');
        for sample in &self.samples {
            let r = sample.rotation;
            // Writing to a String cannot fail
            let _ = writeln!(
                out,
                "{}|{}|{}|{}|{}",
                sample.landmark.index(),
                r.x,
                r.y,
                r.z,
                r.w
            );
        }
        out
    }
}

/// Decode a raw frame. Returns `None` when the header token is missing.
///
/// Invalid UTF-8 is replaced rather than rejected; each malformed line is
/// skipped without affecting the others.
pub fn decode_frame(raw: &[u8]) -> Option<PoseFrame> {
    let text = String::from_utf8_lossy(raw);
    if !text.starts_with(FRAME_HEADER) {
        return None;
    }

    let mut frame = PoseFrame::new();
    // First line carries the header
    for line in text.split('\n').skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(line) {
            Some(sample) => frame.samples.push(sample),
            None => frame.skipped_lines += 1,
        }
    }

    if frame.skipped_lines > 0 {
        tracing::trace!(
            skipped = frame.skipped_lines,
            parsed = frame.samples.len(),
            "dropped malformed landmark lines"
        );
    }

    Some(frame)
}

/// Parse one `index|x|y|z|w` line
fn parse_line(line: &str) -> Option<LandmarkSample> {
    if !line.contains(FIELD_SEPARATOR) {
        return None;
    }

    let fields: Vec<&str> = line.split(FIELD_SEPARATOR).map(str::trim).collect();
    if fields.len() < 5 {
        return None;
    }

    let index: i64 = fields[0].parse().ok()?;
    let landmark = Landmark::new(index)?;

    let x: f32 = fields[1].parse().ok()?;
    let y: f32 = fields[2].parse().ok()?;
    let z: f32 = fields[3].parse().ok()?;
    let w: f32 = fields[4].parse().ok()?;

    let rotation = Rotation3D::from_xyzw(x, y, z, w);
    if !rotation.is_finite() {
        return None;
    }

    Some(LandmarkSample::new(landmark, rotation))
}

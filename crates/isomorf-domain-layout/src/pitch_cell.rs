use isomorf_ports::types::Pitch;
use serde::{Deserialize, Serialize};

/// A quantized pitch number plus the continuous offset from it, in semitones.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PitchCell {
    pub number: Pitch,
    pub fraction: f32,
}

impl PitchCell {
    pub fn new(number: Pitch, fraction: f32) -> Self {
        Self { number, fraction }
    }

    /// Snaps `pitch` to the nearest cell of a row whose cells sit at
    /// `origin + k * step` for integer `k`. Ties round away from zero.
    pub fn quantize(pitch: f32, origin: Pitch, step: i32) -> Self {
        let step_f = step as f32;
        let k = ((pitch - origin as f32) / step_f).round() as i32;
        let number = origin.saturating_add(k.saturating_mul(step));
        Self {
            number,
            fraction: pitch - number as f32,
        }
    }

    pub fn continuous(self) -> f32 {
        self.number as f32 + self.fraction
    }

    /// Offset in cell widths: +-0.5 spans one `step_right`.
    pub fn cell_fraction(self, step_right: i32) -> f32 {
        self.fraction / step_right as f32
    }
}

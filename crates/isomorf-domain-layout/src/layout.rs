use crate::pitch_cell::PitchCell;
use isomorf_ports::settings::{KeyboardSettings, TilingKind};
use isomorf_ports::types::Pitch;
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    #[error("degenerate layout: step_right must not be zero")]
    DegenerateLayout,
    #[error("empty grid: {rows} rows x {cols} cols")]
    EmptyGrid { rows: u16, cols: u16 },
    #[error("interleaved tiling needs an even step_right, got {0}")]
    OddInterleaveStep(i32),
    #[error("bend range must be positive, got {0}")]
    InvalidBendRange(f32),
    #[error("step {0} is wider than 127 semitones")]
    StepOutOfRange(i32),
    #[error("lowest pitch {0} is outside 0..=127")]
    LowestPitchOutOfRange(Pitch),
    #[error("surface must have a positive size, got {width}x{height}")]
    EmptySurface { width: f32, height: f32 },
}

/// Largest step, in semitones, along either grid axis.
pub const MAX_STEP: i32 = 127;

/// Validated, immutable layout parameters. A gesture always sees one snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayoutParams {
    pub tiling: TilingKind,
    pub step_right: i32,
    pub step_up: i32,
    pub lowest_pitch: Pitch,
    pub rows: u16,
    pub cols: u16,
}

impl LayoutParams {
    /// Validates the configuration surface and extracts the layout part.
    pub fn from_settings(settings: &KeyboardSettings) -> Result<Self, LayoutError> {
        if !(settings.bend_range_semitones > 0.0) {
            return Err(LayoutError::InvalidBendRange(settings.bend_range_semitones));
        }
        let params = Self {
            tiling: settings.tiling,
            step_right: settings.step_right,
            step_up: settings.step_up,
            lowest_pitch: settings.lowest_pitch,
            rows: settings.rows,
            cols: settings.cols,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.step_right == 0 {
            return Err(LayoutError::DegenerateLayout);
        }
        if self.rows == 0 || self.cols == 0 {
            return Err(LayoutError::EmptyGrid {
                rows: self.rows,
                cols: self.cols,
            });
        }
        for step in [self.step_right, self.step_up] {
            if !(-MAX_STEP..=MAX_STEP).contains(&step) {
                return Err(LayoutError::StepOutOfRange(step));
            }
        }
        if !(0..=127).contains(&self.lowest_pitch) {
            return Err(LayoutError::LowestPitchOutOfRange(self.lowest_pitch));
        }
        if self.tiling == TilingKind::Interleaved && self.step_right % 2 != 0 {
            return Err(LayoutError::OddInterleaveStep(self.step_right));
        }
        Ok(())
    }

    /// Selects the mapper for this tiling once; callers keep it for the gesture.
    pub fn mapper(self) -> Box<dyn LayoutMapper> {
        match self.tiling {
            TilingKind::Rectangular => Box::new(RectangularMapper { params: self }),
            TilingKind::Hexagonal => Box::new(HexagonalMapper { params: self }),
            TilingKind::Interleaved => Box::new(InterleavedMapper { params: self }),
        }
    }
}

/// Row/column -> pitch rule of one tiling kind.
///
/// Columns are measured in cell widths from the left edge of the key area.
/// Rows and columns are unbounded, so `map` saturates instead of wrapping.
/// Pitch is linear in the column coordinate within a row, so every mapper
/// only has to say where its cells are; continuous pitch and quantization
/// follow from that.
pub trait LayoutMapper: Send + Sync {
    fn params(&self) -> &LayoutParams;

    /// Base pitch of cell (row, col).
    fn map(&self, row: i32, col: i32) -> Pitch;

    /// Horizontal shift of the row's cells, in cell widths.
    fn row_shift(&self, _row: i32) -> f32 {
        0.0
    }

    fn column_centre(&self, row: i32, col: i32) -> f32 {
        col as f32 + 0.5 + self.row_shift(row)
    }

    /// Unquantized pitch at column coordinate `column` of `row`.
    fn continuous_pitch(&self, row: i32, column: f32) -> f32 {
        let origin = self.map(row, 0) as f32;
        let step = self.params().step_right as f32;
        origin + (column - self.column_centre(row, 0)) * step
    }

    fn quantize(&self, row: i32, pitch: f32) -> PitchCell {
        PitchCell::quantize(pitch, self.map(row, 0), self.params().step_right)
    }

    fn cell_at(&self, row: i32, column: f32) -> PitchCell {
        self.quantize(row, self.continuous_pitch(row, column))
    }
}

fn is_odd(row: i32) -> bool {
    row % 2 != 0
}

pub struct RectangularMapper {
    params: LayoutParams,
}

impl LayoutMapper for RectangularMapper {
    fn params(&self) -> &LayoutParams {
        &self.params
    }

    fn map(&self, row: i32, col: i32) -> Pitch {
        let p = &self.params;
        p.lowest_pitch
            .saturating_add(col.saturating_mul(p.step_right))
            .saturating_add(row.saturating_mul(p.step_up))
    }
}

/// Odd rows sit half a cell to the right; `row / 2` truncates toward zero.
pub struct HexagonalMapper {
    params: LayoutParams,
}

impl LayoutMapper for HexagonalMapper {
    fn params(&self) -> &LayoutParams {
        &self.params
    }

    fn map(&self, row: i32, col: i32) -> Pitch {
        let p = &self.params;
        p.lowest_pitch
            .saturating_add(col.saturating_sub(row / 2).saturating_mul(p.step_right))
            .saturating_add(row.saturating_mul(p.step_up))
    }

    fn row_shift(&self, row: i32) -> f32 {
        if is_odd(row) {
            0.5
        } else {
            0.0
        }
    }
}

/// Alternating-row keyboard: odd rows hold the pitches halfway between the
/// even row's cells, so rows repeat every two and `step_up` is unused.
pub struct InterleavedMapper {
    params: LayoutParams,
}

impl LayoutMapper for InterleavedMapper {
    fn params(&self) -> &LayoutParams {
        &self.params
    }

    fn map(&self, row: i32, col: i32) -> Pitch {
        let p = &self.params;
        let half = if is_odd(row) { p.step_right / 2 } else { 0 };
        p.lowest_pitch
            .saturating_add(col.saturating_mul(p.step_right))
            .saturating_add(half)
    }

    fn row_shift(&self, row: i32) -> f32 {
        if is_odd(row) {
            0.5
        } else {
            0.0
        }
    }
}

use crate::layout::{LayoutError, LayoutMapper};
use crate::pitch_cell::PitchCell;
use isomorf_ports::types::{SurfacePoint, SurfaceSize};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlZone {
    Bend,
    Sustain,
}

/// Where a point lands on the surface.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Zone {
    Control(ControlZone),
    Key(PitchCell),
}

impl Zone {
    pub fn key_number(&self) -> Option<i32> {
        match self {
            Zone::Key(cell) => Some(cell.number),
            Zone::Control(_) => None,
        }
    }

    pub fn control(&self) -> Option<ControlZone> {
        match self {
            Zone::Control(control) => Some(*control),
            Zone::Key(_) => None,
        }
    }
}

/// Screen-space partition of the surface.
///
/// The width is split into `2 * cols + 3` equal units. The leftmost two units
/// form the control strip (bend on the upper half, sustain on the lower
/// half); key cells are two units wide. Screen `y` grows downward and row 0
/// is the bottom band. Every boundary belongs to the zone on its right
/// (or, vertically, below it for the controls and above it for row bands).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceGeometry {
    size: SurfaceSize,
    rows: u16,
    cols: u16,
}

impl SurfaceGeometry {
    pub fn new(size: SurfaceSize, rows: u16, cols: u16) -> Result<Self, LayoutError> {
        if !(size.width > 0.0 && size.height > 0.0) {
            return Err(LayoutError::EmptySurface {
                width: size.width,
                height: size.height,
            });
        }
        if rows == 0 || cols == 0 {
            return Err(LayoutError::EmptyGrid { rows, cols });
        }
        Ok(Self { size, rows, cols })
    }

    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    fn unit(&self) -> f32 {
        self.size.width / (2.0 * self.cols as f32 + 3.0)
    }

    pub fn control_strip_width(&self) -> f32 {
        2.0 * self.unit()
    }

    pub fn cell_width(&self) -> f32 {
        2.0 * self.unit()
    }

    pub fn row_height(&self) -> f32 {
        self.size.height / self.rows as f32
    }

    /// Row band under `y`. Not clamped: points outside the bands extrapolate.
    pub fn row_at(&self, y: f32) -> i32 {
        let from_bottom = (self.size.height - y) / self.size.height;
        (from_bottom * self.rows as f32 - 0.5).round() as i32
    }

    /// Column coordinate in cell widths from the left edge of the key area.
    pub fn column_at(&self, x: f32) -> f32 {
        (x - self.control_strip_width()) / self.cell_width()
    }

    pub fn classify(&self, mapper: &dyn LayoutMapper, point: SurfacePoint) -> Zone {
        if point.x < self.control_strip_width() {
            if point.y < self.size.height / 2.0 {
                Zone::Control(ControlZone::Bend)
            } else {
                Zone::Control(ControlZone::Sustain)
            }
        } else {
            Zone::Key(self.pitch_cell(mapper, point))
        }
    }

    pub fn continuous_pitch(&self, mapper: &dyn LayoutMapper, point: SurfacePoint) -> f32 {
        mapper.continuous_pitch(self.row_at(point.y), self.column_at(point.x))
    }

    pub fn pitch_cell(&self, mapper: &dyn LayoutMapper, point: SurfacePoint) -> PitchCell {
        let row = self.row_at(point.y);
        mapper.quantize(row, mapper.continuous_pitch(row, self.column_at(point.x)))
    }

    /// Surface position of the centre of cell (row, col).
    pub fn cell_centre(&self, mapper: &dyn LayoutMapper, row: i32, col: i32) -> SurfacePoint {
        let x = self.control_strip_width() + mapper.column_centre(row, col) * self.cell_width();
        let y = self.size.height - (row as f32 + 0.5) * self.row_height();
        SurfacePoint::new(x, y)
    }

    pub fn control_centre(&self, control: ControlZone) -> SurfacePoint {
        let x = self.control_strip_width() / 2.0;
        let y = match control {
            ControlZone::Bend => self.size.height / 4.0,
            ControlZone::Sustain => self.size.height * 3.0 / 4.0,
        };
        SurfacePoint::new(x, y)
    }
}

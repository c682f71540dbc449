use crate::types::*;
use serde::{Deserialize, Serialize};

fn default_step_right() -> i32 {
    2
}

fn default_step_up() -> i32 {
    1
}

fn default_rows() -> u16 {
    4
}

fn default_cols() -> u16 {
    12
}

fn default_lowest_pitch() -> Pitch {
    57
}

fn default_bend_range_semitones() -> f32 {
    4.0
}

fn default_velocity() -> u8 {
    127
}

/// Geometric rule mapping row/column indices to pitch numbers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TilingKind {
    Rectangular,
    Hexagonal,
    Interleaved,
}

/// Configuration surface owned by the preferences collaborator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyboardSettings {
    pub tiling: TilingKind,
    #[serde(default = "default_step_right")]
    pub step_right: i32,
    #[serde(default = "default_step_up")]
    pub step_up: i32,
    #[serde(default = "default_rows")]
    pub rows: u16,
    #[serde(default = "default_cols")]
    pub cols: u16,
    #[serde(default = "default_lowest_pitch")]
    pub lowest_pitch: Pitch,
    #[serde(default = "default_bend_range_semitones")]
    pub bend_range_semitones: f32,
    pub sustain_toggle: bool,
    pub bend_toggle: bool,
    #[serde(default = "default_velocity")]
    pub velocity: u8,
    pub program: u8,
}

impl Default for KeyboardSettings {
    fn default() -> Self {
        Self {
            tiling: TilingKind::Interleaved,
            step_right: default_step_right(),
            step_up: default_step_up(),
            rows: default_rows(),
            cols: default_cols(),
            lowest_pitch: default_lowest_pitch(),
            bend_range_semitones: default_bend_range_semitones(),
            sustain_toggle: false,
            bend_toggle: false,
            velocity: default_velocity(),
            program: 0,
        }
    }
}

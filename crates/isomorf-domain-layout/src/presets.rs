use isomorf_ports::settings::{KeyboardSettings, TilingKind};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutPreset {
    Janko,
    WickiHayden,
    Harmonic,
    Linnstrument,
    LinnstrumentFourths,
    LinnstrumentTritones,
    Harpejji,
    Dodeka,
}

impl LayoutPreset {
    pub const ALL: [LayoutPreset; 8] = [
        LayoutPreset::Janko,
        LayoutPreset::WickiHayden,
        LayoutPreset::Harmonic,
        LayoutPreset::Linnstrument,
        LayoutPreset::LinnstrumentFourths,
        LayoutPreset::LinnstrumentTritones,
        LayoutPreset::Harpejji,
        LayoutPreset::Dodeka,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LayoutPreset::Janko => "janko",
            LayoutPreset::WickiHayden => "wicki-hayden",
            LayoutPreset::Harmonic => "harmonic",
            LayoutPreset::Linnstrument => "linnstrument",
            LayoutPreset::LinnstrumentFourths => "linnstrument-fourths",
            LayoutPreset::LinnstrumentTritones => "linnstrument-tritones",
            LayoutPreset::Harpejji => "harpejji",
            LayoutPreset::Dodeka => "dodeka",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|preset| preset.name() == name)
    }

    /// Returns `base` with its layout fields replaced by this preset.
    /// Sound and toggle fields are kept.
    pub fn apply(self, base: &KeyboardSettings) -> KeyboardSettings {
        let mut s = base.clone();
        s.rows = 4;
        s.cols = 12;
        s.lowest_pitch = 57;

        match self {
            LayoutPreset::Janko => {
                s.tiling = TilingKind::Interleaved;
                s.step_right = 2;
                s.step_up = 1;
            }
            LayoutPreset::WickiHayden => {
                s.tiling = TilingKind::Hexagonal;
                s.step_right = 2;
                s.step_up = 7;
            }
            LayoutPreset::Harmonic => {
                s.tiling = TilingKind::Hexagonal;
                s.step_right = 1;
                s.step_up = 4;
            }
            LayoutPreset::Dodeka => {
                s.tiling = TilingKind::Rectangular;
                s.step_right = 1;
                s.step_up = 12;
                s.rows = 2;
            }
            LayoutPreset::LinnstrumentFourths => linnstrument(&mut s, 4),
            LayoutPreset::Linnstrument => linnstrument(&mut s, 5),
            LayoutPreset::LinnstrumentTritones => linnstrument(&mut s, 6),
            LayoutPreset::Harpejji => {
                s.tiling = TilingKind::Rectangular;
                s.step_right = 5;
                s.step_up = 1;
                s.rows = 12;
                s.cols = 8;
                s.lowest_pitch = 60 - s.step_up * s.rows as i32 / 2;
            }
        }
        s
    }
}

// Centres middle C vertically.
fn linnstrument(s: &mut KeyboardSettings, step_up: i32) {
    s.tiling = TilingKind::Rectangular;
    s.step_right = 1;
    s.step_up = step_up;
    s.rows = 7;
    s.lowest_pitch = 60 - step_up * s.rows as i32 / 2;
}

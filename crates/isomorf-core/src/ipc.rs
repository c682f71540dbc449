use crate::voice_allocator::Voice;
use isomorf_domain_layout::LayoutPreset;
use isomorf_ports::settings::KeyboardSettings;
use isomorf_ports::surface::SurfaceEvent;
use isomorf_ports::types::{ContactId, Pitch, SurfaceSize};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Command {
    ApplySettings { settings: KeyboardSettings },
    ApplyPreset { preset: LayoutPreset },
    SetSurfaceSize { size: SurfaceSize },
    SetSustainToggle { enabled: bool },
    SetBendToggle { enabled: bool },
    LoadSoundBank { path: String },
    LoadInstrument { program: u8 },
    Contact { event: SurfaceEvent },
    AllNotesOff,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Event {
    /// `pending` is set while a layout change waits for the surface to go idle.
    SettingsUpdated { settings: KeyboardSettings, pending: bool },
    ControlsUpdated { bend: bool, sustain: bool },
    VoicesUpdated { voices: Vec<Voice> },
    NoteDropped { contact: ContactId, pitch: Pitch },
    SoundBankLoaded { name: String, preset_count: usize },
}

impl Command {
    /// Parses one line of the newline-delimited JSON command stream.
    pub fn from_json_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line.trim())
    }
}

impl Event {
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

pub type Pitch = i32; // semitone index, same reference as MIDI note numbers
pub type SampleTime = u64; // audio sample index, monotonic while stream running

/// Neutral 14-bit pitch-bend value.
pub const PITCH_BEND_NEUTRAL: u16 = 8192;
pub const PITCH_BEND_MAX: u16 = 16383;

/// GM reserves MIDI channel 10 (index 9) for percussion.
pub const PERCUSSION_MIDI_CHANNEL: u8 = 9;
pub const MELODIC_MIDI_CHANNELS: usize = 15;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceId(pub String);

/// Output channel of a sound backend. One channel backs at most one voice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub u8);

impl ChannelId {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Maps a pool channel onto the melodic MIDI channels, skipping percussion.
    pub fn melodic_midi_channel(self) -> Option<u8> {
        if self.index() >= MELODIC_MIDI_CHANNELS {
            return None;
        }
        if self.0 >= PERCUSSION_MIDI_CHANNEL {
            Some(self.0 + 1)
        } else {
            Some(self.0)
        }
    }
}

/// Stable identifier of one touch/pointer contact for the length of its gesture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContactId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct SurfacePoint {
    pub x: f32,
    pub y: f32,
}

impl SurfacePoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SurfaceSize {
    pub width: f32,
    pub height: f32,
}

impl SurfaceSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

impl Default for SurfaceSize {
    fn default() -> Self {
        Self::new(1024.0, 768.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MidiOutputDevice {
    pub id: DeviceId,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AudioOutputDevice {
    pub id: DeviceId,
    pub name: String,
    pub default_config: AudioConfig,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct AudioConfig {
    pub sample_rate_hz: u32,
    pub channels: u16, // fixed 2
    pub buffer_size_frames: Option<u32>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 48_000,
            channels: 2,
            buffer_size_frames: None,
        }
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch{}", self.0)
    }
}

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

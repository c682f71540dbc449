#![allow(dead_code)]

use isomorf_domain_layout::LayoutParams;
use isomorf_ports::backend::{BackendError, SoundBackend, SoundBankInfo};
use isomorf_ports::settings::TilingKind;
use isomorf_ports::types::{ChannelId, Pitch, SurfacePoint, SurfaceSize};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq)]
pub enum BackendCall {
    NoteOn { pitch: Pitch, velocity: u8, channel: u8 },
    NoteOff { pitch: Pitch, channel: u8 },
    Bend { value: u16, channel: u8 },
    Program(u8),
    SoundBank(String),
}

pub fn on(pitch: Pitch, channel: u8) -> BackendCall {
    BackendCall::NoteOn {
        pitch,
        velocity: 127,
        channel,
    }
}

pub fn off(pitch: Pitch, channel: u8) -> BackendCall {
    BackendCall::NoteOff { pitch, channel }
}

pub fn bend(value: u16, channel: u8) -> BackendCall {
    BackendCall::Bend { value, channel }
}

/// Sound backend that records every call in order.
pub struct RecordingBackend {
    channels: usize,
    calls: Mutex<Vec<BackendCall>>,
}

impl RecordingBackend {
    pub fn new(channels: usize) -> Arc<Self> {
        Arc::new(Self {
            channels,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn take(&self) -> Vec<BackendCall> {
        std::mem::take(&mut *self.calls.lock())
    }
}

impl SoundBackend for RecordingBackend {
    fn channel_count(&self) -> usize {
        self.channels
    }

    fn note_on(&self, pitch: Pitch, velocity: u8, channel: ChannelId) {
        self.calls.lock().push(BackendCall::NoteOn {
            pitch,
            velocity,
            channel: channel.0,
        });
    }

    fn note_off(&self, pitch: Pitch, channel: ChannelId) {
        self.calls.lock().push(BackendCall::NoteOff {
            pitch,
            channel: channel.0,
        });
    }

    fn set_pitch_bend(&self, value: u16, channel: ChannelId) {
        self.calls.lock().push(BackendCall::Bend {
            value,
            channel: channel.0,
        });
    }

    fn load_instrument(&self, program: u8) -> Result<(), BackendError> {
        self.calls.lock().push(BackendCall::Program(program));
        Ok(())
    }

    fn load_sound_bank(&self, path: &str) -> Result<SoundBankInfo, BackendError> {
        self.calls.lock().push(BackendCall::SoundBank(path.to_string()));
        Ok(SoundBankInfo {
            name: "Test Bank".to_string(),
            preset_count: 3,
        })
    }
}

/// 2700 x 400: control strip 200 px wide, key cells 200 x 100.
pub fn surface() -> SurfaceSize {
    SurfaceSize::new(2700.0, 400.0)
}

pub fn rectangular() -> LayoutParams {
    LayoutParams {
        tiling: TilingKind::Rectangular,
        step_right: 2,
        step_up: 5,
        lowest_pitch: 57,
        rows: 4,
        cols: 12,
    }
}

/// Centre of a row-0 cell of `rectangular()` on `surface()`.
pub fn key(col: i32) -> SurfacePoint {
    SurfacePoint::new(300.0 + 200.0 * col as f32, 350.0)
}

pub fn bend_zone() -> SurfacePoint {
    SurfacePoint::new(100.0, 100.0)
}

pub fn sustain_zone() -> SurfacePoint {
    SurfacePoint::new(100.0, 300.0)
}

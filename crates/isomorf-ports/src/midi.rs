use crate::backend::midi_note;
use crate::types::*;
use serde::{Deserialize, Serialize};

const NOTE_OFF: u8 = 0x80;
const NOTE_ON: u8 = 0x90;
const CONTROL_CHANGE: u8 = 0xB0;
const PROGRAM_CHANGE: u8 = 0xC0;
const PITCH_BEND: u8 = 0xE0;

const CC_DATA_ENTRY: u8 = 6;
const CC_DATA_ENTRY_LSB: u8 = 38;
const CC_RPN_LSB: u8 = 100;
const CC_RPN_MSB: u8 = 101;

/// Channel voice message on a MIDI channel (0..=15).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelMessage {
    NoteOn { channel: u8, key: u8, velocity: u8 },
    NoteOff { channel: u8, key: u8 },
    /// 14-bit value, 8192 is neutral.
    PitchBend { channel: u8, value: u16 },
    ProgramChange { channel: u8, program: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
}

impl ChannelMessage {
    /// `None` when the pitch is not a MIDI note or the channel has no melodic MIDI channel.
    pub fn note_on(pitch: Pitch, velocity: u8, channel: ChannelId) -> Option<Self> {
        Some(Self::NoteOn {
            channel: channel.melodic_midi_channel()?,
            key: midi_note(pitch)?,
            velocity: velocity.min(127),
        })
    }

    pub fn note_off(pitch: Pitch, channel: ChannelId) -> Option<Self> {
        Some(Self::NoteOff {
            channel: channel.melodic_midi_channel()?,
            key: midi_note(pitch)?,
        })
    }

    pub fn pitch_bend(value: u16, channel: ChannelId) -> Option<Self> {
        Some(Self::PitchBend {
            channel: channel.melodic_midi_channel()?,
            value: value.min(PITCH_BEND_MAX),
        })
    }

    pub fn channel(&self) -> u8 {
        match *self {
            Self::NoteOn { channel, .. }
            | Self::NoteOff { channel, .. }
            | Self::PitchBend { channel, .. }
            | Self::ProgramChange { channel, .. }
            | Self::ControlChange { channel, .. } => channel,
        }
    }

    pub fn status(&self) -> u8 {
        let kind = match self {
            Self::NoteOn { .. } => NOTE_ON,
            Self::NoteOff { .. } => NOTE_OFF,
            Self::PitchBend { .. } => PITCH_BEND,
            Self::ProgramChange { .. } => PROGRAM_CHANGE,
            Self::ControlChange { .. } => CONTROL_CHANGE,
        };
        kind | (self.channel() & 0x0F)
    }

    /// Data bytes; program change carries a single one.
    pub fn data(&self) -> (u8, Option<u8>) {
        match *self {
            Self::NoteOn { key, velocity, .. } => (key & 0x7F, Some(velocity & 0x7F)),
            Self::NoteOff { key, .. } => (key & 0x7F, Some(0)),
            Self::PitchBend { value, .. } => ((value & 0x7F) as u8, Some(((value >> 7) & 0x7F) as u8)),
            Self::ProgramChange { program, .. } => (program & 0x7F, None),
            Self::ControlChange {
                controller, value, ..
            } => (controller & 0x7F, Some(value & 0x7F)),
        }
    }

    /// Wire encoding: status byte followed by one or two data bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let (first, second) = self.data();
        let mut bytes = vec![self.status(), first];
        bytes.extend(second);
        bytes
    }
}

/// RPN 0 sequence setting the pitch-bend sensitivity of `channel`, closed
/// with the null RPN so later data entry is ignored.
pub fn bend_range_messages(channel: u8, semitones: f32) -> [ChannelMessage; 6] {
    let semitones = semitones.clamp(0.0, 127.0);
    let coarse = semitones.trunc() as u8;
    let cents = ((semitones - semitones.trunc()) * 100.0).round().min(99.0) as u8;
    let cc = |controller, value| ChannelMessage::ControlChange {
        channel,
        controller,
        value,
    };
    [
        cc(CC_RPN_MSB, 0),
        cc(CC_RPN_LSB, 0),
        cc(CC_DATA_ENTRY, coarse),
        cc(CC_DATA_ENTRY_LSB, cents),
        cc(CC_RPN_MSB, 127),
        cc(CC_RPN_LSB, 127),
    ]
}

/// MIDI channels backing the voice pool, in pool order.
pub fn melodic_midi_channels() -> impl Iterator<Item = u8> {
    (0..MELODIC_MIDI_CHANNELS as u8).filter_map(|index| ChannelId(index).melodic_midi_channel())
}

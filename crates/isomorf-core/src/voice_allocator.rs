use isomorf_ports::backend::SoundBackend;
use isomorf_ports::types::{ChannelId, ContactId, Pitch, PITCH_BEND_MAX, PITCH_BEND_NEUTRAL};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Half of the 14-bit bend span: the distance from neutral to either extreme.
pub const HALF_BEND_SPAN: f32 = 8192.0;

/// Largest pool a `ChannelId` can address.
const MAX_POOL: usize = u8::MAX as usize + 1;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocationError {
    #[error("no free channel for pitch {pitch}")]
    PoolExhausted { pitch: Pitch },
}

/// One sounding note bound to one channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Voice {
    pub pitch: Pitch,
    pub channel: ChannelId,
    pub bend_fraction: f32,
    pub sustained: bool,
    /// Owning contact; cleared once the voice is held by sustain.
    pub contact: Option<ContactId>,
}

/// A started note, plus the contact whose voice it replaced on a re-trigger.
#[derive(Clone, Debug, PartialEq)]
pub struct NoteStart {
    pub voice: Voice,
    pub stolen_from: Option<ContactId>,
}

/// 14-bit pitch-bend value for `fraction` semitones over a +-`bend_range_semitones` wheel.
pub fn bend_value(fraction: f32, bend_range_semitones: f32) -> u16 {
    let offset = (fraction * HALF_BEND_SPAN / bend_range_semitones).round();
    if !offset.is_finite() {
        return PITCH_BEND_NEUTRAL;
    }
    (PITCH_BEND_NEUTRAL as f32 + offset).clamp(0.0, PITCH_BEND_MAX as f32) as u16
}

/// Binds notes to a fixed pool of backend channels.
///
/// Slot `i` of the pool is channel `i`; a slot holds at most one voice. Free
/// channels are found by a linear scan from channel 0.
pub struct VoiceAllocator {
    backend: Arc<dyn SoundBackend>,
    slots: Vec<Option<Voice>>,
    sustain_enabled: bool,
    bend_enabled: bool,
    bend_range_semitones: f32,
    velocity: u8,
}

impl VoiceAllocator {
    pub fn new(backend: Arc<dyn SoundBackend>, bend_range_semitones: f32, velocity: u8) -> Self {
        let pool = backend.channel_count().min(MAX_POOL);
        backend.set_bend_range(bend_range_semitones);
        Self {
            backend,
            slots: vec![None; pool],
            sustain_enabled: false,
            bend_enabled: false,
            bend_range_semitones,
            velocity,
        }
    }

    pub fn pool_size(&self) -> usize {
        self.slots.len()
    }

    pub fn set_sustain_enabled(&mut self, enabled: bool) {
        self.sustain_enabled = enabled;
    }

    pub fn set_bend_enabled(&mut self, enabled: bool) {
        self.bend_enabled = enabled;
    }

    pub fn sustain_enabled(&self) -> bool {
        self.sustain_enabled
    }

    pub fn bend_enabled(&self) -> bool {
        self.bend_enabled
    }

    pub fn set_bend_range(&mut self, bend_range_semitones: f32) {
        self.bend_range_semitones = bend_range_semitones;
        self.backend.set_bend_range(bend_range_semitones);
    }

    pub fn set_velocity(&mut self, velocity: u8) {
        self.velocity = velocity;
    }

    /// Starts `number` for `contact` on the first free channel.
    ///
    /// A live voice of the same pitch owned by another contact is stopped
    /// first; sustained voices are left alone.
    pub fn begin_note(
        &mut self,
        contact: ContactId,
        number: Pitch,
        fraction: f32,
    ) -> Result<NoteStart, AllocationError> {
        if let Some(slot) = self.live_slot(contact) {
            self.stop_slot(slot);
        }
        let mut stolen_from = None;
        if let Some(slot) = self.slots.iter().position(|voice| {
            voice
                .as_ref()
                .is_some_and(|v| v.pitch == number && !v.sustained && v.contact != Some(contact))
        }) {
            log::debug!(target: "isomorf::voices", "re-trigger of {number} steals ch{slot}");
            stolen_from = self.stop_slot(slot).and_then(|voice| voice.contact);
        }

        let slot = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(AllocationError::PoolExhausted { pitch: number })?;
        let channel = ChannelId(slot as u8);

        let bend_fraction = if self.bend_enabled { fraction } else { 0.0 };
        self.backend
            .set_pitch_bend(bend_value(bend_fraction, self.bend_range_semitones), channel);
        self.backend.note_on(number, self.velocity, channel);

        let voice = Voice {
            pitch: number,
            channel,
            bend_fraction,
            sustained: false,
            contact: Some(contact),
        };
        self.slots[slot] = Some(voice.clone());
        Ok(NoteStart { voice, stolen_from })
    }

    /// Re-bends the contact's live voice. No-op while bend mode is off.
    pub fn update_bend(&mut self, contact: ContactId, fraction: f32) {
        if !self.bend_enabled {
            return;
        }
        let Some(slot) = self.live_slot(contact) else {
            return;
        };
        let value = bend_value(fraction, self.bend_range_semitones);
        if let Some(voice) = self.slots[slot].as_mut() {
            voice.bend_fraction = fraction;
            self.backend.set_pitch_bend(value, voice.channel);
        }
    }

    /// Releases the contact's voice, or hands it to sustain while sustain is on.
    pub fn end_note(&mut self, contact: ContactId) -> Option<Voice> {
        let slot = self.live_slot(contact)?;
        if self.sustain_enabled {
            let voice = self.slots[slot].as_mut()?;
            voice.sustained = true;
            voice.contact = None;
            Some(voice.clone())
        } else {
            self.stop_slot(slot)
        }
    }

    /// Stops every sustained voice and frees its channel.
    pub fn release_sustain(&mut self) -> Vec<Voice> {
        self.stop_where(|voice| voice.sustained)
    }

    /// Sends neutral bend to every sounding channel; notes keep playing.
    pub fn reset_all_bend(&mut self) {
        for voice in self.slots.iter_mut().flatten() {
            voice.bend_fraction = 0.0;
            self.backend.set_pitch_bend(PITCH_BEND_NEUTRAL, voice.channel);
        }
    }

    /// Stops every voice, owned or sustained.
    pub fn release_all(&mut self) -> Vec<Voice> {
        self.stop_where(|_| true)
    }

    pub fn voices(&self) -> Vec<Voice> {
        self.slots.iter().flatten().cloned().collect()
    }

    pub fn voice_for(&self, contact: ContactId) -> Option<&Voice> {
        self.live_slot(contact)
            .and_then(|slot| self.slots[slot].as_ref())
    }

    pub fn sustained_pitches(&self) -> Vec<Pitch> {
        self.slots
            .iter()
            .flatten()
            .filter(|voice| voice.sustained)
            .map(|voice| voice.pitch)
            .collect()
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    fn live_slot(&self, contact: ContactId) -> Option<usize> {
        self.slots.iter().position(|voice| {
            voice
                .as_ref()
                .is_some_and(|v| !v.sustained && v.contact == Some(contact))
        })
    }

    fn stop_slot(&mut self, slot: usize) -> Option<Voice> {
        let voice = self.slots.get_mut(slot)?.take()?;
        self.backend.note_off(voice.pitch, voice.channel);
        Some(voice)
    }

    fn stop_where(&mut self, predicate: impl Fn(&Voice) -> bool) -> Vec<Voice> {
        let slots: Vec<usize> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, voice)| voice.as_ref().is_some_and(&predicate))
            .map(|(slot, _)| slot)
            .collect();
        slots
            .into_iter()
            .filter_map(|slot| self.stop_slot(slot))
            .collect()
    }
}

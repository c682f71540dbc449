use crate::types::*;

#[derive(thiserror::Error, Debug)]
pub enum BackendError {
    #[error("sound bank load failed: {0}")]
    SoundBankLoad(String),
    #[error("unsupported: {0}")]
    Unsupported(String),
    #[error("device not found: {0}")]
    DeviceNotFound(String),
    #[error("backend error: {0}")]
    Backend(String),
}

#[derive(Clone, Debug)]
pub struct SoundBankInfo {
    pub name: String,
    pub preset_count: usize,
}

/// Sound-generating backend keyed by integer channel.
///
/// Thread model:
/// - note/bend calls come from the controller thread and are fire-and-forget;
///   implementations must not block on them
/// - load_* may block and report failures
pub trait SoundBackend: Send + Sync {
    /// Polyphony limit: channels `0..channel_count()` form the voice pool.
    fn channel_count(&self) -> usize;

    fn note_on(&self, pitch: Pitch, velocity: u8, channel: ChannelId);
    fn note_off(&self, pitch: Pitch, channel: ChannelId);

    /// `value` is 14-bit, 8192 is neutral.
    fn set_pitch_bend(&self, value: u16, channel: ChannelId);

    /// Bend sensitivity in semitones each side of neutral. Backends with a
    /// fixed wheel range ignore it.
    fn set_bend_range(&self, _semitones: f32) {}

    fn load_instrument(&self, program: u8) -> Result<(), BackendError>;

    fn load_sound_bank(&self, path: &str) -> Result<SoundBankInfo, BackendError> {
        Err(BackendError::Unsupported(format!(
            "sound banks are not loadable here: {path}"
        )))
    }
}

/// Converts a pitch number into a MIDI note, rejecting pitches outside 0..=127.
pub fn midi_note(pitch: Pitch) -> Option<u8> {
    u8::try_from(pitch).ok().filter(|note| *note <= 127)
}

use isomorf_ports::audio::AudioRenderCallback;
use isomorf_ports::backend::{BackendError, SoundBackend, SoundBankInfo};
use isomorf_ports::midi::{bend_range_messages, melodic_midi_channels, ChannelMessage};
use isomorf_ports::types::{ChannelId, Pitch, SampleTime, MELODIC_MIDI_CHANNELS};
use parking_lot::Mutex;
use rtrb::{Consumer, Producer, RingBuffer};
use rustysynth::{SoundFont, Synthesizer, SynthesizerSettings};
use std::fs::File;
use std::path::Path;
use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use std::sync::Arc;

const QUEUE_CAPACITY: usize = 4096;
const MASTER_VOLUME: f32 = 0.25;

struct Shared {
    sample_rate_hz: AtomicU32,
    program: AtomicU8,
    bend_range_bits: AtomicU32,
    sound_font: Mutex<Option<Arc<SoundFont>>>,
    synth: Mutex<Option<Synthesizer>>,
}

impl Shared {
    fn bend_range(&self) -> f32 {
        f32::from_bits(self.bend_range_bits.load(Ordering::Relaxed))
    }

    /// Builds a synthesizer for the current rate with program and bend range
    /// already applied to every melodic channel.
    fn build(&self, sound_font: &Arc<SoundFont>) -> Result<Synthesizer, BackendError> {
        let sample_rate_hz = self.sample_rate_hz.load(Ordering::Relaxed) as i32;
        let mut settings = SynthesizerSettings::new(sample_rate_hz);
        settings.enable_reverb_and_chorus = false;

        let mut synth = Synthesizer::new(sound_font, &settings)
            .map_err(|e| BackendError::Backend(e.to_string()))?;
        synth.set_master_volume(MASTER_VOLUME);

        let program = self.program.load(Ordering::Relaxed);
        let bend_range = self.bend_range();
        for channel in melodic_midi_channels() {
            apply(&mut synth, ChannelMessage::ProgramChange { channel, program });
            for message in bend_range_messages(channel, bend_range) {
                apply(&mut synth, message);
            }
        }
        Ok(synth)
    }

    fn rebuild(&self) -> Result<(), BackendError> {
        let sound_font = self.sound_font.lock().clone();
        if let Some(sound_font) = sound_font {
            let synth = self.build(&sound_font)?;
            *self.synth.lock() = Some(synth);
        }
        Ok(())
    }
}

fn apply(synth: &mut Synthesizer, message: ChannelMessage) {
    match message {
        ChannelMessage::NoteOn {
            channel,
            key,
            velocity,
        } => synth.note_on(channel as i32, key as i32, velocity as i32),
        ChannelMessage::NoteOff { channel, key } => synth.note_off(channel as i32, key as i32),
        _ => {
            let (data1, data2) = message.data();
            synth.process_midi_message(
                message.channel() as i32,
                (message.status() & 0xF0) as i32,
                data1 as i32,
                data2.unwrap_or(0) as i32,
            );
        }
    }
}

/// SoundFont sampler backend.
///
/// Control-thread calls only enqueue messages; the paired [`SynthRenderer`]
/// applies them on the audio thread right before rendering.
pub struct RustySynthBackend {
    shared: Arc<Shared>,
    queue: Mutex<Producer<ChannelMessage>>,
}

/// Audio-thread half of the backend.
pub struct SynthRenderer {
    shared: Arc<Shared>,
    queue: Consumer<ChannelMessage>,
}

impl RustySynthBackend {
    pub fn new(sample_rate_hz: u32) -> (Self, SynthRenderer) {
        let shared = Arc::new(Shared {
            sample_rate_hz: AtomicU32::new(sample_rate_hz),
            program: AtomicU8::new(0),
            bend_range_bits: AtomicU32::new(2.0_f32.to_bits()),
            sound_font: Mutex::new(None),
            synth: Mutex::new(None),
        });
        let (producer, consumer) = RingBuffer::new(QUEUE_CAPACITY);
        (
            Self {
                shared: shared.clone(),
                queue: Mutex::new(producer),
            },
            SynthRenderer {
                shared,
                queue: consumer,
            },
        )
    }

    fn push(&self, message: ChannelMessage) {
        if self.queue.lock().push(message).is_err() {
            log::warn!(target: "isomorf::synth", "synth queue full, {message:?} dropped");
        }
    }

    fn push_all(&self, messages: impl IntoIterator<Item = ChannelMessage>) {
        let mut queue = self.queue.lock();
        for message in messages {
            if queue.push(message).is_err() {
                log::warn!(target: "isomorf::synth", "synth queue full, {message:?} dropped");
            }
        }
    }
}

impl SoundBackend for RustySynthBackend {
    fn channel_count(&self) -> usize {
        MELODIC_MIDI_CHANNELS
    }

    fn note_on(&self, pitch: Pitch, velocity: u8, channel: ChannelId) {
        match ChannelMessage::note_on(pitch, velocity, channel) {
            Some(message) => self.push(message),
            None => log::warn!(target: "isomorf::synth", "note-on {pitch} on {channel} has no MIDI mapping"),
        }
    }

    fn note_off(&self, pitch: Pitch, channel: ChannelId) {
        match ChannelMessage::note_off(pitch, channel) {
            Some(message) => self.push(message),
            None => log::warn!(target: "isomorf::synth", "note-off {pitch} on {channel} has no MIDI mapping"),
        }
    }

    fn set_pitch_bend(&self, value: u16, channel: ChannelId) {
        match ChannelMessage::pitch_bend(value, channel) {
            Some(message) => self.push(message),
            None => log::warn!(target: "isomorf::synth", "pitch bend on {channel} has no MIDI mapping"),
        }
    }

    fn set_bend_range(&self, semitones: f32) {
        self.shared
            .bend_range_bits
            .store(semitones.to_bits(), Ordering::Relaxed);
        self.push_all(
            melodic_midi_channels().flat_map(|channel| bend_range_messages(channel, semitones)),
        );
    }

    fn load_instrument(&self, program: u8) -> Result<(), BackendError> {
        let program = program.min(127);
        self.shared.program.store(program, Ordering::Relaxed);
        self.push_all(
            melodic_midi_channels()
                .map(|channel| ChannelMessage::ProgramChange { channel, program }),
        );
        Ok(())
    }

    fn load_sound_bank(&self, path: &str) -> Result<SoundBankInfo, BackendError> {
        let mut file = File::open(path).map_err(|e| BackendError::SoundBankLoad(e.to_string()))?;
        let sound_font = Arc::new(
            SoundFont::new(&mut file).map_err(|e| BackendError::SoundBankLoad(e.to_string()))?,
        );

        let name = sound_font.get_info().get_bank_name().trim().to_string();
        let name = if name.is_empty() {
            Path::new(path)
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or("SoundFont")
                .to_string()
        } else {
            name
        };
        let preset_count = sound_font.get_presets().len();

        let synth = self.shared.build(&sound_font)?;
        *self.shared.sound_font.lock() = Some(sound_font);
        *self.shared.synth.lock() = Some(synth);
        log::info!(target: "isomorf::synth", "sound bank {name} ready ({preset_count} presets)");

        Ok(SoundBankInfo { name, preset_count })
    }
}

impl SynthRenderer {
    /// Messages queued by the control thread and not yet applied.
    pub fn pending(&mut self) -> impl Iterator<Item = ChannelMessage> + '_ {
        std::iter::from_fn(|| self.queue.pop().ok())
    }
}

impl AudioRenderCallback for SynthRenderer {
    fn set_sample_rate(&mut self, sample_rate_hz: u32) {
        self.shared
            .sample_rate_hz
            .store(sample_rate_hz, Ordering::Relaxed);
        if let Err(err) = self.shared.rebuild() {
            log::error!(target: "isomorf::synth", "synth rebuild at {sample_rate_hz} Hz failed: {err}");
        }
    }

    fn render(&mut self, _sample_time_start: SampleTime, out_l: &mut [f32], out_r: &mut [f32]) {
        out_l.fill(0.0);
        out_r.fill(0.0);

        // A bank swap holds the lock; keep the queue for the new synth.
        let Some(mut guard) = self.shared.synth.try_lock() else {
            return;
        };
        match guard.as_mut() {
            Some(synth) => {
                while let Ok(message) = self.queue.pop() {
                    apply(synth, message);
                }
                let frames = out_l.len().min(out_r.len());
                synth.render(&mut out_l[..frames], &mut out_r[..frames]);
            }
            None => while self.queue.pop().is_ok() {},
        }
    }
}

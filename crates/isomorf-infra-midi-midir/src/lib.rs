use isomorf_ports::backend::{BackendError, SoundBackend};
use isomorf_ports::midi::{bend_range_messages, melodic_midi_channels, ChannelMessage};
use isomorf_ports::types::{ChannelId, DeviceId, MidiOutputDevice, Pitch, MELODIC_MIDI_CHANNELS};
use midir::{MidiOutput, MidiOutputConnection};
use parking_lot::Mutex;

const CC_ALL_NOTES_OFF: u8 = 123;

pub struct MidirOutputPort {
    client_name: String,
}

impl MidirOutputPort {
    pub fn new(client_name: impl Into<String>) -> Self {
        Self {
            client_name: client_name.into(),
        }
    }

    fn create_midi_out(&self) -> Result<MidiOutput, BackendError> {
        MidiOutput::new(&self.client_name).map_err(|e| BackendError::Backend(e.to_string()))
    }

    pub fn device_id(index: usize, name: &str) -> DeviceId {
        DeviceId(format!("midir:{}:{}", index, name))
    }

    pub fn list_outputs(&self) -> Result<Vec<MidiOutputDevice>, BackendError> {
        let midi_out = self.create_midi_out()?;
        let devices = midi_out
            .ports()
            .iter()
            .enumerate()
            .map(|(index, port)| {
                let name = midi_out
                    .port_name(port)
                    .unwrap_or_else(|_| "Unknown Output".to_string());
                MidiOutputDevice {
                    id: Self::device_id(index, &name),
                    name,
                }
            })
            .collect();
        Ok(devices)
    }

    /// Opens the first output whose id equals `selector` or whose name
    /// contains it, ignoring case.
    pub fn connect(&self, selector: &str) -> Result<MidirSoundBackend, BackendError> {
        let midi_out = self.create_midi_out()?;

        let mut selected = None;
        for (index, port) in midi_out.ports().iter().enumerate() {
            let name = midi_out
                .port_name(port)
                .unwrap_or_else(|_| "Unknown Output".to_string());
            if port_matches(&Self::device_id(index, &name), &name, selector) {
                selected = Some((port.clone(), name));
                break;
            }
        }
        let (port, name) =
            selected.ok_or_else(|| BackendError::DeviceNotFound(selector.to_string()))?;

        let connection = midi_out
            .connect(&port, "isomorf-output")
            .map_err(|e| BackendError::Backend(e.to_string()))?;
        log::info!(target: "isomorf::midi", "connected to MIDI output {name}");

        Ok(MidirSoundBackend {
            port_name: name,
            connection: Mutex::new(connection),
        })
    }
}

impl Default for MidirOutputPort {
    fn default() -> Self {
        Self::new("isomorf")
    }
}

pub fn port_matches(id: &DeviceId, name: &str, selector: &str) -> bool {
    id.0 == selector || name.to_lowercase().contains(&selector.to_lowercase())
}

/// Sound backend that plays through an external MIDI device, one voice per
/// melodic MIDI channel so each note bends on its own.
pub struct MidirSoundBackend {
    port_name: String,
    connection: Mutex<MidiOutputConnection>,
}

impl MidirSoundBackend {
    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    fn send(&self, message: ChannelMessage) {
        if let Err(err) = self.connection.lock().send(&message.to_bytes()) {
            log::warn!(target: "isomorf::midi", "MIDI send to {} failed: {err}", self.port_name);
        }
    }

    fn send_mapped(&self, message: Option<ChannelMessage>, pitch: Pitch, channel: ChannelId) {
        match message {
            Some(message) => self.send(message),
            None => log::warn!(
                target: "isomorf::midi",
                "pitch {pitch} on {channel} has no MIDI mapping, dropped"
            ),
        }
    }
}

impl SoundBackend for MidirSoundBackend {
    fn channel_count(&self) -> usize {
        MELODIC_MIDI_CHANNELS
    }

    fn note_on(&self, pitch: Pitch, velocity: u8, channel: ChannelId) {
        self.send_mapped(ChannelMessage::note_on(pitch, velocity, channel), pitch, channel);
    }

    fn note_off(&self, pitch: Pitch, channel: ChannelId) {
        self.send_mapped(ChannelMessage::note_off(pitch, channel), pitch, channel);
    }

    fn set_pitch_bend(&self, value: u16, channel: ChannelId) {
        match ChannelMessage::pitch_bend(value, channel) {
            Some(message) => self.send(message),
            None => log::warn!(target: "isomorf::midi", "no MIDI channel for {channel}"),
        }
    }

    fn set_bend_range(&self, semitones: f32) {
        for channel in melodic_midi_channels() {
            for message in bend_range_messages(channel, semitones) {
                self.send(message);
            }
        }
    }

    fn load_instrument(&self, program: u8) -> Result<(), BackendError> {
        let program = program.min(127);
        let mut connection = self.connection.lock();
        for channel in melodic_midi_channels() {
            let message = ChannelMessage::ProgramChange { channel, program };
            connection
                .send(&message.to_bytes())
                .map_err(|e| BackendError::Backend(e.to_string()))?;
        }
        Ok(())
    }
}

impl Drop for MidirSoundBackend {
    fn drop(&mut self) {
        for channel in melodic_midi_channels() {
            self.send(ChannelMessage::ControlChange {
                channel,
                controller: CC_ALL_NOTES_OFF,
                value: 0,
            });
        }
    }
}

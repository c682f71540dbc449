use crate::contact_tracker::InputError;
use crate::controller::{ControllerEvent, InputController};
use crate::ipc::{Command, Event};
use crate::voice_allocator::Voice;
use isomorf_domain_layout::{LayoutError, LayoutParams};
use isomorf_ports::backend::{BackendError, SoundBackend};
use isomorf_ports::settings::KeyboardSettings;
use isomorf_ports::surface::SurfaceEvent;
use isomorf_ports::types::SurfaceSize;
use std::collections::VecDeque;
use std::sync::Arc;

#[derive(thiserror::Error, Debug)]
pub enum CoreError {
    #[error("layout error: {0}")]
    Layout(#[from] LayoutError),
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
    #[error("input error: {0}")]
    Input(#[from] InputError),
}

/// Command/event façade over the input controller and its sound backend.
pub struct KeyboardCore {
    backend: Arc<dyn SoundBackend>,
    controller: InputController,
    settings: KeyboardSettings,
    events: VecDeque<Event>,
    last_voices: Vec<Voice>,
}

impl KeyboardCore {
    pub fn new(
        backend: Arc<dyn SoundBackend>,
        settings: KeyboardSettings,
        size: SurfaceSize,
    ) -> Result<Self, CoreError> {
        let params = LayoutParams::from_settings(&settings)?;
        let mut controller = InputController::new(
            backend.clone(),
            params,
            size,
            settings.bend_range_semitones,
            settings.velocity,
        )?;
        let mut initial = controller.set_sustain_toggle(settings.sustain_toggle);
        initial.extend(controller.set_bend_toggle(settings.bend_toggle));

        log::info!(
            "keyboard ready: {:?} {}x{} from {}, {} channels",
            params.tiling,
            params.rows,
            params.cols,
            params.lowest_pitch,
            controller.voices().pool_size()
        );

        let mut core = Self {
            backend,
            controller,
            settings,
            events: VecDeque::new(),
            last_voices: Vec::new(),
        };
        core.forward(initial);
        Ok(core)
    }

    pub fn handle_command(&mut self, cmd: Command) -> Result<(), CoreError> {
        match cmd {
            Command::ApplySettings { settings } => {
                self.apply_settings(settings)?;
            }
            Command::ApplyPreset { preset } => {
                let settings = preset.apply(&self.settings);
                self.apply_settings(settings)?;
            }
            Command::SetSurfaceSize { size } => {
                self.controller.set_surface_size(size)?;
            }
            Command::SetSustainToggle { enabled } => {
                self.settings.sustain_toggle = enabled;
                let events = self.controller.set_sustain_toggle(enabled);
                self.forward(events);
                self.emit_settings();
            }
            Command::SetBendToggle { enabled } => {
                self.settings.bend_toggle = enabled;
                let events = self.controller.set_bend_toggle(enabled);
                self.forward(events);
                self.emit_settings();
            }
            Command::LoadSoundBank { path } => {
                let info = self.backend.load_sound_bank(&path)?;
                log::info!("sound bank loaded: {} ({} presets)", info.name, info.preset_count);
                self.backend.load_instrument(self.settings.program)?;
                self.events.push_back(Event::SoundBankLoaded {
                    name: info.name,
                    preset_count: info.preset_count,
                });
            }
            Command::LoadInstrument { program } => {
                self.backend.load_instrument(program)?;
                self.settings.program = program;
                self.emit_settings();
            }
            Command::Contact { event } => {
                self.handle_surface_event(event)?;
            }
            Command::AllNotesOff => {
                self.controller.all_notes_off();
            }
        }
        self.emit_voices();
        Ok(())
    }

    pub fn handle_surface_event(&mut self, event: SurfaceEvent) -> Result<(), CoreError> {
        let events = self.controller.handle(event)?;
        self.forward(events);
        self.emit_voices();
        Ok(())
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain(..).collect()
    }

    pub fn settings(&self) -> &KeyboardSettings {
        &self.settings
    }

    pub fn controller(&self) -> &InputController {
        &self.controller
    }

    /// Validates first; a rejected configuration leaves the active one in force.
    fn apply_settings(&mut self, settings: KeyboardSettings) -> Result<(), CoreError> {
        let params = LayoutParams::from_settings(&settings)?;

        if settings.program != self.settings.program {
            if let Err(err) = self.backend.load_instrument(settings.program) {
                log::warn!("program {} not loaded: {err}", settings.program);
            }
        }
        self.controller.set_bend_range(settings.bend_range_semitones);
        self.controller.set_velocity(settings.velocity);

        let mut events = self.controller.set_sustain_toggle(settings.sustain_toggle);
        events.extend(self.controller.set_bend_toggle(settings.bend_toggle));
        events.extend(
            self.controller
                .set_layout(params)?
                .into_iter()
                .filter(|event| !matches!(event, ControllerEvent::LayoutApplied(_))),
        );

        self.settings = settings;
        self.forward(events);
        self.emit_settings();
        Ok(())
    }

    fn forward(&mut self, events: Vec<ControllerEvent>) {
        for event in events {
            match event {
                ControllerEvent::NoteDropped { contact, pitch } => {
                    self.events.push_back(Event::NoteDropped { contact, pitch });
                }
                ControllerEvent::ControlsChanged(flags) => {
                    self.events.push_back(Event::ControlsUpdated {
                        bend: flags.bend,
                        sustain: flags.sustain,
                    });
                }
                ControllerEvent::LayoutApplied(_) => self.emit_settings(),
            }
        }
    }

    fn emit_settings(&mut self) {
        self.events.push_back(Event::SettingsUpdated {
            settings: self.settings.clone(),
            pending: self.controller.pending_layout().is_some(),
        });
    }

    fn emit_voices(&mut self) {
        let voices = self.controller.voices().voices();
        if voices == self.last_voices {
            return;
        }
        self.last_voices = voices.clone();
        self.events.push_back(Event::VoicesUpdated { voices });
    }
}

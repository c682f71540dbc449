use crate::contact_tracker::{ContactTracker, InputError};
use crate::snapshot::LayoutSnapshot;
use crate::voice_allocator::{AllocationError, VoiceAllocator};
use isomorf_domain_layout::{ControlZone, LayoutError, LayoutParams, PitchCell, Zone};
use isomorf_ports::backend::SoundBackend;
use isomorf_ports::surface::{ContactPhase, SurfaceEvent};
use isomorf_ports::types::{ContactId, Pitch, SurfacePoint, SurfaceSize};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Global bend/sustain state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlFlags {
    pub bend: bool,
    pub sustain: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ControllerEvent {
    NoteDropped { contact: ContactId, pitch: Pitch },
    ControlsChanged(ControlFlags),
    LayoutApplied(LayoutParams),
}

/// Drives contacts, layout and voices from surface lifecycle events.
///
/// Every step runs to completion on the caller's thread. The layout is
/// swapped only while no contact is live, so a gesture never sees two
/// layouts.
pub struct InputController {
    tracker: ContactTracker,
    voices: VoiceAllocator,
    layout: LayoutSnapshot,
    pending: Option<LayoutParams>,
    toggles: ControlFlags,
    flags: ControlFlags,
}

impl InputController {
    pub fn new(
        backend: Arc<dyn SoundBackend>,
        params: LayoutParams,
        size: SurfaceSize,
        bend_range_semitones: f32,
        velocity: u8,
    ) -> Result<Self, LayoutError> {
        Ok(Self {
            tracker: ContactTracker::new(),
            voices: VoiceAllocator::new(backend, bend_range_semitones, velocity),
            layout: LayoutSnapshot::new(params, size)?,
            pending: None,
            toggles: ControlFlags::default(),
            flags: ControlFlags::default(),
        })
    }

    pub fn handle(&mut self, event: SurfaceEvent) -> Result<Vec<ControllerEvent>, InputError> {
        match event.phase {
            ContactPhase::Began => Ok(self.began(event.contact, event.position)),
            ContactPhase::Moved => self.moved(event.contact, event.position),
            ContactPhase::Ended | ContactPhase::Cancelled => self.ended(event.contact),
        }
    }

    pub fn began(&mut self, id: ContactId, position: SurfacePoint) -> Vec<ControllerEvent> {
        let mut events = Vec::new();
        if self.tracker.contains(id) {
            log::warn!(target: "isomorf::input", "contact {id} began twice, ending the stale gesture");
            self.finish(id, &mut events);
        }

        let transition = self.tracker.begin(&self.layout, id, position);
        if let Some(Zone::Key(cell)) = transition.current {
            self.start_note(id, cell, &mut events);
        }
        self.recompute(&mut events);
        events
    }

    pub fn moved(
        &mut self,
        id: ContactId,
        position: SurfacePoint,
    ) -> Result<Vec<ControllerEvent>, InputError> {
        let transition = self
            .tracker
            .update(&self.layout, id, position)
            .inspect_err(|err| log::warn!(target: "isomorf::input", "move ignored: {err}"))?;

        let mut events = Vec::new();
        match (transition.previous, transition.current) {
            (Some(Zone::Key(old)), Some(Zone::Key(new))) if old.number == new.number => {
                self.voices.update_bend(id, new.fraction);
            }
            (Some(Zone::Key(_)), Some(Zone::Key(new))) => {
                self.voices.end_note(id);
                self.start_note(id, new, &mut events);
            }
            (Some(Zone::Key(_)), _) => {
                self.voices.end_note(id);
                self.tracker.set_sounding(id, false);
            }
            (_, Some(Zone::Key(new))) => {
                self.start_note(id, new, &mut events);
            }
            _ => {}
        }
        self.recompute(&mut events);
        Ok(events)
    }

    /// Handles both `ended` and `cancelled`.
    pub fn ended(&mut self, id: ContactId) -> Result<Vec<ControllerEvent>, InputError> {
        if !self.tracker.contains(id) {
            let err = InputError::UnknownContact(id);
            log::warn!(target: "isomorf::input", "release ignored: {err}");
            return Err(err);
        }
        let mut events = Vec::new();
        self.finish(id, &mut events);
        Ok(events)
    }

    pub fn set_sustain_toggle(&mut self, enabled: bool) -> Vec<ControllerEvent> {
        self.toggles.sustain = enabled;
        let mut events = Vec::new();
        self.recompute(&mut events);
        events
    }

    pub fn set_bend_toggle(&mut self, enabled: bool) -> Vec<ControllerEvent> {
        self.toggles.bend = enabled;
        let mut events = Vec::new();
        self.recompute(&mut events);
        events
    }

    /// Installs `params` now if the surface is idle, otherwise once the last
    /// contact lifts. Returns the event when it was applied immediately.
    pub fn set_layout(&mut self, params: LayoutParams) -> Result<Vec<ControllerEvent>, LayoutError> {
        params.validate()?;
        if self.tracker.is_empty() {
            self.pending = None;
            self.install(params)?;
            Ok(vec![ControllerEvent::LayoutApplied(params)])
        } else {
            log::debug!(target: "isomorf::input", "layout change deferred until all contacts lift");
            self.pending = Some(params);
            Ok(Vec::new())
        }
    }

    pub fn set_surface_size(&mut self, size: SurfaceSize) -> Result<(), LayoutError> {
        self.layout.resize(size)
    }

    pub fn set_bend_range(&mut self, bend_range_semitones: f32) {
        self.voices.set_bend_range(bend_range_semitones);
    }

    pub fn set_velocity(&mut self, velocity: u8) {
        self.voices.set_velocity(velocity);
    }

    /// Silences everything, including sustained voices. Contacts stay live
    /// but stop sounding until they move to another cell.
    pub fn all_notes_off(&mut self) {
        self.voices.release_all();
        for id in self.tracker.ids() {
            self.tracker.set_sounding(id, false);
        }
    }

    pub fn layout(&self) -> &LayoutSnapshot {
        &self.layout
    }

    pub fn pending_layout(&self) -> Option<&LayoutParams> {
        self.pending.as_ref()
    }

    pub fn flags(&self) -> ControlFlags {
        self.flags
    }

    pub fn toggles(&self) -> ControlFlags {
        self.toggles
    }

    pub fn contacts(&self) -> &ContactTracker {
        &self.tracker
    }

    pub fn voices(&self) -> &VoiceAllocator {
        &self.voices
    }

    fn start_note(&mut self, id: ContactId, cell: PitchCell, events: &mut Vec<ControllerEvent>) {
        match self.voices.begin_note(id, cell.number, cell.fraction) {
            Ok(start) => {
                if let Some(previous) = start.stolen_from {
                    self.tracker.set_sounding(previous, false);
                }
                self.tracker.set_sounding(id, true);
            }
            Err(AllocationError::PoolExhausted { pitch }) => {
                log::warn!(target: "isomorf::voices", "no free channel, dropping {pitch} for contact {id}");
                self.tracker.set_sounding(id, false);
                events.push(ControllerEvent::NoteDropped { contact: id, pitch });
            }
        }
    }

    fn finish(&mut self, id: ContactId, events: &mut Vec<ControllerEvent>) {
        let Ok(transition) = self.tracker.end(id) else {
            return;
        };
        if let Some(Zone::Key(_)) = transition.previous {
            self.voices.end_note(id);
        }
        self.recompute(events);

        if self.tracker.is_empty() {
            if let Some(params) = self.pending.take() {
                match self.install(params) {
                    Ok(()) => events.push(ControllerEvent::LayoutApplied(params)),
                    Err(err) => log::warn!(target: "isomorf::input", "pending layout dropped: {err}"),
                }
            }
        }
    }

    fn install(&mut self, params: LayoutParams) -> Result<(), LayoutError> {
        self.layout = LayoutSnapshot::new(params, self.layout.size())?;
        log::debug!(target: "isomorf::input", "layout applied: {params:?}");
        Ok(())
    }

    /// Re-derives the global flags and acts on their falling edges.
    fn recompute(&mut self, events: &mut Vec<ControllerEvent>) {
        let flags = ControlFlags {
            bend: self.toggles.bend || self.tracker.is_pressing(ControlZone::Bend),
            sustain: self.toggles.sustain || self.tracker.is_pressing(ControlZone::Sustain),
        };
        self.voices.set_bend_enabled(flags.bend);
        self.voices.set_sustain_enabled(flags.sustain);

        if self.flags.sustain && !flags.sustain {
            let released = self.voices.release_sustain();
            log::debug!(target: "isomorf::voices", "sustain lifted, released {} voices", released.len());
        }
        if self.flags.bend && !flags.bend {
            log::debug!(target: "isomorf::voices", "bend off, resetting all channels");
            self.voices.reset_all_bend();
        }

        if flags != self.flags {
            self.flags = flags;
            events.push(ControllerEvent::ControlsChanged(flags));
        }
    }
}

mod support;

use isomorf_core::{ControlFlags, ControllerEvent, InputController, InputError};
use isomorf_domain_layout::{ControlZone, LayoutParams, Zone};
use isomorf_ports::surface::SurfaceEvent;
use isomorf_ports::types::{ContactId, SurfacePoint};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use support::{bend, bend_zone, key, off, on, rectangular, surface, sustain_zone, RecordingBackend};

const A: ContactId = ContactId(1);
const B: ContactId = ContactId(2);
const PEDAL: ContactId = ContactId(9);

fn controller(channels: usize) -> (Arc<RecordingBackend>, InputController) {
    let backend = RecordingBackend::new(channels);
    let controller = InputController::new(backend.clone(), rectangular(), surface(), 4.0, 127)
        .expect("valid layout");
    (backend, controller)
}

fn flags(bend: bool, sustain: bool) -> ControllerEvent {
    ControllerEvent::ControlsChanged(ControlFlags { bend, sustain })
}

#[test]
fn touch_down_on_a_cell_starts_its_note() {
    let (backend, mut controller) = controller(16);

    let events = controller.began(A, key(1));

    assert!(events.is_empty());
    assert_eq!(backend.take(), vec![bend(8192, 0), on(59, 0)]);
    let contact = controller.contacts().get(A).expect("live");
    assert!(contact.sounding);
    assert_eq!(contact.zone.key_number(), Some(59));
}

#[test]
fn upper_rows_add_step_up() {
    let (backend, mut controller) = controller(16);

    controller.began(A, SurfacePoint::new(500.0, 250.0));

    assert_eq!(backend.take(), vec![bend(8192, 0), on(64, 0)]);
}

#[test]
fn moving_to_another_cell_retriggers_instead_of_gliding() {
    let (backend, mut controller) = controller(16);
    controller.set_bend_toggle(true);
    controller.began(A, key(1));
    backend.take();

    controller.moved(A, key(2)).expect("live contact");

    assert_eq!(backend.take(), vec![off(59, 0), bend(8192, 0), on(61, 0)]);
}

#[test]
fn moving_inside_a_cell_bends_only_when_bend_is_on() {
    let (backend, mut controller) = controller(16);
    controller.began(A, key(1));
    backend.take();

    controller
        .moved(A, SurfacePoint::new(550.0, 350.0))
        .expect("live contact");
    assert!(backend.take().is_empty());

    controller.set_bend_toggle(true);
    controller
        .moved(A, SurfacePoint::new(560.0, 350.0))
        .expect("live contact");
    controller
        .moved(A, SurfacePoint::new(550.0, 350.0))
        .expect("live contact");

    // 0.6 and 0.5 semitones over a 4 semitone wheel
    assert_eq!(backend.take(), vec![bend(9421, 0), bend(9216, 0)]);
}

#[test]
fn leaving_the_key_area_releases_the_note() {
    let (backend, mut controller) = controller(16);
    controller.began(A, key(1));
    backend.take();

    let events = controller.moved(A, sustain_zone()).expect("live contact");

    assert_eq!(backend.take(), vec![off(59, 0)]);
    assert_eq!(events, vec![flags(false, true)]);
    assert!(!controller.contacts().get(A).expect("live").sounding);
}

#[test]
fn entering_the_key_area_from_a_control_starts_a_note() {
    let (backend, mut controller) = controller(16);
    controller.began(A, sustain_zone());

    let events = controller.moved(A, key(0)).expect("live contact");

    assert_eq!(backend.take(), vec![bend(8192, 0), on(57, 0)]);
    assert_eq!(events, vec![flags(false, false)]);
}

#[test]
fn sustain_contact_holds_notes_until_it_lifts() {
    let (backend, mut controller) = controller(16);

    assert_eq!(controller.began(PEDAL, sustain_zone()), vec![flags(false, true)]);
    controller.began(A, key(1));
    controller.began(B, key(2));
    backend.take();

    controller.ended(A).expect("live contact");
    controller.ended(B).expect("live contact");
    assert!(backend.take().is_empty());
    assert_eq!(controller.voices().sustained_pitches(), vec![59, 61]);

    let events = controller.ended(PEDAL).expect("live contact");
    assert_eq!(events, vec![flags(false, false)]);
    assert_eq!(backend.take(), vec![off(59, 0), off(61, 1)]);
    assert_eq!(controller.voices().active_count(), 0);
}

#[test]
fn sustain_toggle_holds_notes_until_switched_off() {
    let (backend, mut controller) = controller(16);
    controller.set_sustain_toggle(true);
    controller.began(A, key(1));
    controller.ended(A).expect("live contact");
    backend.take();

    // a pedal press and release while the toggle is on is not a falling edge
    controller.began(PEDAL, sustain_zone());
    controller.ended(PEDAL).expect("live contact");
    assert!(backend.take().is_empty());

    let events = controller.set_sustain_toggle(false);
    assert_eq!(events, vec![flags(false, false)]);
    assert_eq!(backend.take(), vec![off(59, 0)]);
}

#[test]
fn lifting_the_bend_control_neutralises_bent_channels() {
    let (backend, mut controller) = controller(16);
    controller.began(PEDAL, bend_zone());
    assert!(controller.flags().bend);

    controller.began(A, SurfacePoint::new(550.0, 350.0));
    assert_eq!(backend.take(), vec![bend(9216, 0), on(59, 0)]);

    let events = controller.ended(PEDAL).expect("live contact");
    assert_eq!(events, vec![flags(false, false)]);
    assert_eq!(backend.take(), vec![bend(8192, 0)]);
}

#[test]
fn release_and_cancel_end_the_note() {
    let (backend, mut controller) = controller(16);
    controller.began(A, key(1));
    controller.began(B, key(3));
    backend.take();

    controller
        .handle(SurfaceEvent::ended(1, 500.0, 350.0))
        .expect("live contact");
    controller
        .handle(SurfaceEvent::cancelled(2, 900.0, 350.0))
        .expect("live contact");

    assert_eq!(backend.take(), vec![off(59, 0), off(63, 1)]);
    assert!(controller.contacts().is_empty());
}

#[test]
fn unknown_contacts_are_reported_and_ignored() {
    let (backend, mut controller) = controller(16);

    assert_eq!(
        controller.moved(ContactId(42), key(1)),
        Err(InputError::UnknownContact(ContactId(42)))
    );
    assert_eq!(
        controller.ended(ContactId(42)),
        Err(InputError::UnknownContact(ContactId(42)))
    );
    assert!(backend.take().is_empty());
    assert!(controller.contacts().is_empty());
}

#[test]
fn far_off_surface_moves_extrapolate_without_overflow() {
    let (_backend, mut controller) = controller(16);
    controller.began(A, SurfacePoint::new(500.0, 400.0));

    controller
        .moved(A, SurfacePoint::new(500.0, -1e12))
        .expect("live contact");
    controller
        .moved(A, SurfacePoint::new(-1e12, 1e12))
        .expect("live contact");
    controller
        .moved(A, SurfacePoint::new(1e12, -1e12))
        .expect("live contact");

    let contact = controller.contacts().get(A).expect("live");
    assert!(matches!(contact.zone, Zone::Key(_)));
    controller.ended(A).expect("live contact");
    assert_eq!(controller.voices().active_count(), 0);
}

#[test]
fn repeated_began_restarts_the_gesture() {
    let (backend, mut controller) = controller(16);
    controller.began(A, key(1));
    backend.take();

    controller.began(A, key(2));

    assert_eq!(backend.take(), vec![off(59, 0), bend(8192, 0), on(61, 0)]);
    assert_eq!(controller.contacts().len(), 1);
}

#[test]
fn a_second_contact_on_the_same_cell_steals_the_note() {
    let (backend, mut controller) = controller(16);
    controller.began(A, key(1));
    backend.take();

    controller.began(B, key(1));
    assert_eq!(backend.take(), vec![off(59, 0), bend(8192, 0), on(59, 0)]);
    assert!(!controller.contacts().get(A).expect("live").sounding);
    assert!(controller.contacts().get(B).expect("live").sounding);

    controller.ended(A).expect("live contact");
    assert!(backend.take().is_empty());
    assert_eq!(controller.voices().voice_for(B).map(|v| v.pitch), Some(59));
}

#[test]
fn exhausted_pool_drops_the_note_and_retries_on_the_next_cell() {
    let (backend, mut controller) = controller(1);
    controller.began(A, key(1));
    backend.take();

    let events = controller.began(B, key(2));
    assert_eq!(
        events,
        vec![ControllerEvent::NoteDropped {
            contact: B,
            pitch: 61
        }]
    );
    assert!(backend.take().is_empty());
    assert!(!controller.contacts().get(B).expect("live").sounding);

    controller.ended(A).expect("live contact");
    controller.moved(B, key(3)).expect("live contact");

    assert_eq!(backend.take(), vec![off(59, 0), bend(8192, 0), on(63, 0)]);
}

#[test]
fn layout_changes_wait_for_the_surface_to_go_idle() {
    let (backend, mut controller) = controller(16);
    let shifted = LayoutParams {
        lowest_pitch: 60,
        ..rectangular()
    };
    controller.began(A, key(1));

    let events = controller.set_layout(shifted).expect("valid layout");
    assert!(events.is_empty());
    assert_eq!(controller.pending_layout(), Some(&shifted));

    controller.moved(A, key(2)).expect("live contact");
    let events = controller.ended(A).expect("live contact");
    assert_eq!(events, vec![ControllerEvent::LayoutApplied(shifted)]);
    assert_eq!(controller.pending_layout(), None);
    backend.take();

    controller.began(B, key(1));
    assert_eq!(backend.take(), vec![bend(8192, 0), on(62, 0)]);
}

#[test]
fn layout_applies_immediately_when_idle() {
    let (_backend, mut controller) = controller(16);
    let dodeka = LayoutParams {
        step_right: 1,
        step_up: 12,
        rows: 2,
        ..rectangular()
    };

    let events = controller.set_layout(dodeka).expect("valid layout");

    assert_eq!(events, vec![ControllerEvent::LayoutApplied(dodeka)]);
    assert_eq!(controller.layout().params(), &dodeka);
}

#[test]
fn control_zones_are_classified_per_contact() {
    let (_backend, mut controller) = controller(16);
    controller.began(A, bend_zone());
    controller.began(B, sustain_zone());

    assert_eq!(
        controller.contacts().get(A).map(|c| c.zone),
        Some(Zone::Control(ControlZone::Bend))
    );
    assert!(controller.contacts().is_pressing(ControlZone::Sustain));
    assert_eq!(controller.flags(), ControlFlags { bend: true, sustain: true });
    assert_eq!(controller.toggles(), ControlFlags::default());
}

#[test]
fn all_notes_off_silences_everything() {
    let (backend, mut controller) = controller(16);
    controller.set_sustain_toggle(true);
    controller.began(A, key(1));
    controller.ended(A).expect("live contact");
    controller.began(B, key(2));
    backend.take();

    controller.all_notes_off();

    assert_eq!(backend.take(), vec![off(59, 0), off(61, 1)]);
    assert!(!controller.contacts().get(B).expect("live").sounding);
}

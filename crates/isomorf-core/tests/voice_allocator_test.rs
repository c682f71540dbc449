mod support;

use isomorf_core::{bend_value, AllocationError, VoiceAllocator};
use isomorf_ports::types::{ChannelId, ContactId};
use pretty_assertions::assert_eq;
use support::{bend, off, on, RecordingBackend};

const A: ContactId = ContactId(1);
const B: ContactId = ContactId(2);
const C: ContactId = ContactId(3);

#[test]
fn bend_value_scales_over_the_bend_range() {
    assert_eq!(bend_value(0.25, 4.0), 8192 + 512);
    assert_eq!(bend_value(0.0, 4.0), 8192);
    assert_eq!(bend_value(-0.5, 4.0), 8192 - 1024);
    assert_eq!(bend_value(1.0, 2.0), 8192 + 4096);
}

#[test]
fn bend_value_is_clamped_to_fourteen_bits() {
    assert_eq!(bend_value(10.0, 1.0), 16383);
    assert_eq!(bend_value(-10.0, 1.0), 0);
    assert_eq!(bend_value(1.0, 1.0), 16383);
}

#[test]
fn begin_note_resets_bend_then_starts_the_note() {
    let backend = RecordingBackend::new(16);
    let mut voices = VoiceAllocator::new(backend.clone(), 4.0, 127);

    let voice = voices.begin_note(A, 59, 0.3).expect("free channel").voice;

    assert_eq!(voice.channel, ChannelId(0));
    assert_eq!(voice.contact, Some(A));
    assert_eq!(voice.bend_fraction, 0.0);
    assert_eq!(backend.take(), vec![bend(8192, 0), on(59, 0)]);
}

#[test]
fn begin_note_with_bend_enabled_starts_at_the_touched_pitch() {
    let backend = RecordingBackend::new(16);
    let mut voices = VoiceAllocator::new(backend.clone(), 4.0, 127);
    voices.set_bend_enabled(true);

    voices.begin_note(A, 59, 0.5).expect("free channel");

    assert_eq!(backend.take(), vec![bend(9216, 0), on(59, 0)]);
}

#[test]
fn channels_are_taken_first_free_from_zero() {
    let backend = RecordingBackend::new(16);
    let mut voices = VoiceAllocator::new(backend.clone(), 4.0, 127);

    voices.begin_note(A, 60, 0.0).expect("free channel");
    voices.begin_note(B, 62, 0.0).expect("free channel");
    voices.begin_note(C, 64, 0.0).expect("free channel");
    voices.end_note(B);
    backend.take();

    let voice = voices.begin_note(B, 65, 0.0).expect("free channel").voice;
    assert_eq!(voice.channel, ChannelId(1));
    assert_eq!(backend.take(), vec![bend(8192, 1), on(65, 1)]);
}

#[test]
fn exhausted_pool_drops_the_note_without_backend_traffic() {
    let backend = RecordingBackend::new(2);
    let mut voices = VoiceAllocator::new(backend.clone(), 4.0, 127);

    voices.begin_note(A, 60, 0.0).expect("free channel");
    voices.begin_note(B, 62, 0.0).expect("free channel");
    backend.take();

    assert_eq!(
        voices.begin_note(C, 64, 0.0),
        Err(AllocationError::PoolExhausted { pitch: 64 })
    );
    assert!(backend.take().is_empty());
    assert_eq!(voices.active_count(), 2);
}

#[test]
fn same_pitch_from_another_contact_steals_the_live_voice() {
    let backend = RecordingBackend::new(16);
    let mut voices = VoiceAllocator::new(backend.clone(), 4.0, 127);

    voices.begin_note(A, 60, 0.0).expect("free channel");
    backend.take();
    let start = voices.begin_note(B, 60, 0.0).expect("free channel");

    assert_eq!(backend.take(), vec![off(60, 0), bend(8192, 0), on(60, 0)]);
    assert_eq!(start.voice.contact, Some(B));
    assert_eq!(start.stolen_from, Some(A));
    assert_eq!(voices.voices().len(), 1);
    assert!(voices.voice_for(A).is_none());

    // A's release no longer touches B's note
    assert_eq!(voices.end_note(A), None);
    assert!(backend.take().is_empty());
}

#[test]
fn sustained_voice_of_the_same_pitch_is_not_stolen() {
    let backend = RecordingBackend::new(16);
    let mut voices = VoiceAllocator::new(backend.clone(), 4.0, 127);
    voices.set_sustain_enabled(true);

    voices.begin_note(A, 60, 0.0).expect("free channel");
    voices.end_note(A);
    backend.take();
    let start = voices.begin_note(B, 60, 0.0).expect("free channel");

    assert_eq!(start.voice.channel, ChannelId(1));
    assert_eq!(start.stolen_from, None);
    assert_eq!(backend.take(), vec![bend(8192, 1), on(60, 1)]);
    assert_eq!(voices.sustained_pitches(), vec![60]);
}

#[test]
fn sustain_holds_released_notes_until_lifted() {
    let backend = RecordingBackend::new(16);
    let mut voices = VoiceAllocator::new(backend.clone(), 4.0, 127);

    voices.begin_note(A, 60, 0.0).expect("free channel");
    voices.begin_note(B, 64, 0.0).expect("free channel");
    voices.set_sustain_enabled(true);
    backend.take();

    voices.end_note(A);
    voices.end_note(B);
    assert!(backend.take().is_empty());
    assert_eq!(voices.sustained_pitches(), vec![60, 64]);
    assert!(voices.voices().iter().all(|v| v.sustained && v.contact.is_none()));

    voices.set_sustain_enabled(false);
    let released = voices.release_sustain();

    assert_eq!(released.len(), 2);
    assert_eq!(backend.take(), vec![off(60, 0), off(64, 1)]);
    assert!(voices.voices().is_empty());
    assert!(voices.sustained_pitches().is_empty());
}

#[test]
fn release_sustain_leaves_held_notes_sounding() {
    let backend = RecordingBackend::new(16);
    let mut voices = VoiceAllocator::new(backend.clone(), 4.0, 127);
    voices.set_sustain_enabled(true);

    voices.begin_note(A, 60, 0.0).expect("free channel");
    voices.begin_note(B, 64, 0.0).expect("free channel");
    voices.end_note(A);
    backend.take();

    voices.release_sustain();

    assert_eq!(backend.take(), vec![off(60, 0)]);
    assert_eq!(voices.voice_for(B).map(|v| v.pitch), Some(64));
}

#[test]
fn end_note_without_sustain_frees_the_channel() {
    let backend = RecordingBackend::new(16);
    let mut voices = VoiceAllocator::new(backend.clone(), 4.0, 127);

    voices.begin_note(A, 60, 0.0).expect("free channel");
    backend.take();

    let voice = voices.end_note(A).expect("voice");
    assert!(!voice.sustained);
    assert_eq!(backend.take(), vec![off(60, 0)]);
    assert_eq!(voices.active_count(), 0);
}

#[test]
fn update_bend_is_ignored_while_bend_is_off() {
    let backend = RecordingBackend::new(16);
    let mut voices = VoiceAllocator::new(backend.clone(), 4.0, 127);

    voices.begin_note(A, 60, 0.0).expect("free channel");
    backend.take();
    voices.update_bend(A, 0.25);

    assert!(backend.take().is_empty());
}

#[test]
fn update_bend_sends_scaled_bend_for_the_owner() {
    let backend = RecordingBackend::new(16);
    let mut voices = VoiceAllocator::new(backend.clone(), 4.0, 127);
    voices.set_bend_enabled(true);

    voices.begin_note(A, 60, 0.0).expect("free channel");
    voices.begin_note(B, 64, 0.0).expect("free channel");
    backend.take();

    voices.update_bend(B, 0.25);
    voices.update_bend(C, 0.25);

    assert_eq!(backend.take(), vec![bend(8704, 1)]);
    assert_eq!(voices.voice_for(B).map(|v| v.bend_fraction), Some(0.25));
}

#[test]
fn reset_all_bend_neutralises_every_sounding_channel() {
    let backend = RecordingBackend::new(16);
    let mut voices = VoiceAllocator::new(backend.clone(), 4.0, 127);
    voices.set_bend_enabled(true);
    voices.set_sustain_enabled(true);

    voices.begin_note(A, 60, 0.25).expect("free channel");
    voices.begin_note(B, 64, -0.25).expect("free channel");
    voices.end_note(A);
    backend.take();

    voices.reset_all_bend();

    assert_eq!(backend.take(), vec![bend(8192, 0), bend(8192, 1)]);
    assert_eq!(voices.active_count(), 2);
    assert!(voices.voices().iter().all(|v| v.bend_fraction == 0.0));
}

#[test]
fn release_all_stops_owned_and_sustained_voices() {
    let backend = RecordingBackend::new(16);
    let mut voices = VoiceAllocator::new(backend.clone(), 4.0, 127);
    voices.set_sustain_enabled(true);

    voices.begin_note(A, 60, 0.0).expect("free channel");
    voices.begin_note(B, 64, 0.0).expect("free channel");
    voices.end_note(A);
    backend.take();

    voices.release_all();

    assert_eq!(backend.take(), vec![off(60, 0), off(64, 1)]);
    assert_eq!(voices.active_count(), 0);
}

#[test]
fn pool_never_holds_more_voices_than_channels() {
    let backend = RecordingBackend::new(4);
    let mut voices = VoiceAllocator::new(backend.clone(), 4.0, 127);
    voices.set_sustain_enabled(true);

    for step in 0..40u64 {
        let contact = ContactId(step % 7);
        let pitch = 48 + (step * 5 % 24) as i32;
        let _ = voices.begin_note(contact, pitch, 0.0);
        if step % 3 == 0 {
            voices.end_note(ContactId((step + 2) % 7));
        }
        if step % 11 == 0 {
            voices.release_sustain();
        }

        let live = voices.voices();
        assert!(live.len() <= voices.pool_size());
        let mut channels: Vec<_> = live.iter().map(|v| v.channel).collect();
        channels.dedup();
        assert_eq!(channels.len(), live.len());
        let mut live_pitches: Vec<_> = live
            .iter()
            .filter(|v| !v.sustained)
            .map(|v| v.pitch)
            .collect();
        live_pitches.sort();
        let before = live_pitches.len();
        live_pitches.dedup();
        assert_eq!(live_pitches.len(), before);
    }
}

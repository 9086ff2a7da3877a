//! Integration tests for sequential preview.
//!
//! Drives montage-preview's scheduler over a montage-timeline store with the
//! recording surface, the way a player widget would.

use montage_core::{SourceHandle, TrimRange};
use montage_preview::testing::{RecordingSurface, SurfaceCall};
use montage_preview::{PreviewScheduler, PreviewState, SurfaceEvent};
use montage_timeline::{Clip, ClipId, MoveDirection, Timeline};

// ── Helpers ────────────────────────────────────────────────────

fn trimmed(name: &str, duration: f64, start: f64, end: f64) -> Clip {
    Clip::with_trim(
        name,
        SourceHandle::from_bytes(name, vec![0u8; 4]),
        duration,
        TrimRange::new(start, end),
    )
}

/// A plays 0..2 of a 5 s source, B plays 1..3 of a 4 s source.
fn two_clip_timeline() -> (Timeline, Vec<ClipId>) {
    let mut timeline = Timeline::default();
    let a = timeline.add(trimmed("A", 5.0, 0.0, 2.0)).unwrap();
    let b = timeline.add(trimmed("B", 4.0, 1.0, 3.0)).unwrap();
    (timeline, vec![a, b])
}

/// Deliver metadata, then time updates every 0.25 s from `from` up to `to`.
fn play_through(
    scheduler: &mut PreviewScheduler<RecordingSurface>,
    timeline: &Timeline,
    from: f64,
    to: f64,
    states: &mut Vec<PreviewState>,
) {
    scheduler.handle_event(timeline, SurfaceEvent::MetadataLoaded);
    let mut position = from;
    while position <= to + 1e-9 {
        scheduler.handle_event(timeline, SurfaceEvent::TimeUpdate(position));
        if states.last() != Some(&scheduler.state()) {
            states.push(scheduler.state());
        }
        position += 0.25;
    }
}

// ── Sequencing ─────────────────────────────────────────────────

#[test]
fn plays_clips_in_order_and_returns_to_idle() {
    let (timeline, _) = two_clip_timeline();
    let mut scheduler = PreviewScheduler::new(RecordingSurface::deferred(), 0.05);

    scheduler.start(&timeline).unwrap();
    let mut states = vec![scheduler.state()];
    play_through(&mut scheduler, &timeline, 0.0, 2.0, &mut states);
    play_through(&mut scheduler, &timeline, 1.0, 3.0, &mut states);

    assert_eq!(
        states,
        [
            PreviewState::PlayingClip(0),
            PreviewState::PlayingClip(1),
            PreviewState::Idle
        ]
    );
    let surface = scheduler.surface();
    assert_eq!(surface.bound_names(), ["A", "B"]);
    assert_eq!(surface.seeks(), [0.0, 1.0]);
    assert_eq!(surface.bound(), None);
}

#[test]
fn each_clip_is_seeked_exactly_once() {
    let (timeline, _) = two_clip_timeline();
    let mut scheduler = PreviewScheduler::new(RecordingSurface::immediate(), 0.05);

    scheduler.start(&timeline).unwrap();
    // Spurious metadata notifications after the surface was already ready.
    scheduler.handle_event(&timeline, SurfaceEvent::MetadataLoaded);
    scheduler.handle_event(&timeline, SurfaceEvent::TimeUpdate(1.96));
    scheduler.handle_event(&timeline, SurfaceEvent::MetadataLoaded);

    assert_eq!(scheduler.state(), PreviewState::PlayingClip(1));
    assert_eq!(scheduler.surface().seeks(), [0.0, 1.0]);
}

#[test]
fn ended_event_finishes_the_clip() {
    let (timeline, _) = two_clip_timeline();
    let mut scheduler = PreviewScheduler::new(RecordingSurface::immediate(), 0.05);

    scheduler.start(&timeline).unwrap();
    scheduler.handle_event(&timeline, SurfaceEvent::Ended);
    assert_eq!(scheduler.state(), PreviewState::PlayingClip(1));
    scheduler.handle_event(&timeline, SurfaceEvent::Ended);
    assert_eq!(scheduler.state(), PreviewState::Idle);
}

// ── Robustness ─────────────────────────────────────────────────

#[test]
fn removing_active_clip_drives_scheduler_idle() {
    let (mut timeline, ids) = two_clip_timeline();
    let mut scheduler = PreviewScheduler::new(RecordingSurface::immediate(), 0.05);

    scheduler.start(&timeline).unwrap();
    scheduler.handle_event(&timeline, SurfaceEvent::TimeUpdate(2.0));
    assert_eq!(scheduler.state(), PreviewState::PlayingClip(1));

    timeline.remove(ids[1]);
    scheduler.handle_event(&timeline, SurfaceEvent::TimeUpdate(1.5));
    assert_eq!(scheduler.state(), PreviewState::Idle);
    assert_eq!(scheduler.active_clip_id(), None);
}

#[test]
fn removing_clip_with_pending_seek_never_seeks_it() {
    let (mut timeline, ids) = two_clip_timeline();
    let mut scheduler = PreviewScheduler::new(RecordingSurface::deferred(), 0.05);

    scheduler.start(&timeline).unwrap();
    assert!(scheduler.has_pending_seek());
    timeline.remove(ids[0]);

    scheduler.handle_event(&timeline, SurfaceEvent::TimeUpdate(0.5));
    assert_eq!(scheduler.state(), PreviewState::Idle);
    scheduler.handle_event(&timeline, SurfaceEvent::MetadataLoaded);
    assert_eq!(scheduler.state(), PreviewState::Idle);
    assert_eq!(
        scheduler.surface().calls(),
        [SurfaceCall::Bind("A".into()), SurfaceCall::Pause, SurfaceCall::Unbind]
    );
}

#[test]
fn moving_clip_before_metadata_stops_instead_of_playing() {
    let (mut timeline, ids) = two_clip_timeline();
    let mut scheduler = PreviewScheduler::new(RecordingSurface::deferred(), 0.05);

    scheduler.start(&timeline).unwrap();
    timeline.reorder(ids[1], MoveDirection::Earlier);

    scheduler.handle_event(&timeline, SurfaceEvent::MetadataLoaded);
    assert_eq!(scheduler.state(), PreviewState::Idle);
    assert!(scheduler.surface().seeks().is_empty());
    assert!(!scheduler.surface().calls().contains(&SurfaceCall::Play));
}

#[test]
fn ended_with_pending_seek_on_removed_clip_stops() {
    let (mut timeline, ids) = two_clip_timeline();
    let mut scheduler = PreviewScheduler::new(RecordingSurface::deferred(), 0.05);

    scheduler.start(&timeline).unwrap();
    timeline.remove(ids[0]);
    scheduler.handle_event(&timeline, SurfaceEvent::Ended);
    assert_eq!(scheduler.state(), PreviewState::Idle);
    assert_eq!(scheduler.surface().bound(), None);
}

#[test]
fn stop_on_idle_scheduler_makes_no_surface_calls() {
    let mut scheduler = PreviewScheduler::new(RecordingSurface::immediate(), 0.05);
    scheduler.stop();
    assert!(scheduler.surface().calls().is_empty());
}

#[test]
fn stop_mid_clip_pauses_and_unbinds() {
    let (timeline, _) = two_clip_timeline();
    let mut scheduler = PreviewScheduler::new(RecordingSurface::immediate(), 0.05);
    scheduler.start(&timeline).unwrap();
    scheduler.surface_mut().clear_calls();

    scheduler.stop();
    assert_eq!(scheduler.surface().calls(), [SurfaceCall::Pause, SurfaceCall::Unbind]);
    scheduler.stop();
    assert_eq!(scheduler.surface().calls().len(), 2);
}

#[test]
fn restart_begins_from_first_clip() {
    let (timeline, _) = two_clip_timeline();
    let mut scheduler = PreviewScheduler::new(RecordingSurface::immediate(), 0.05);
    scheduler.start(&timeline).unwrap();
    scheduler.handle_event(&timeline, SurfaceEvent::TimeUpdate(2.0));

    scheduler.start(&timeline).unwrap();
    assert_eq!(scheduler.state(), PreviewState::PlayingClip(0));
    assert_eq!(scheduler.surface().bound(), Some("A"));
}

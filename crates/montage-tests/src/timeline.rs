//! Integration tests for the clip store.
//!
//! Exercises montage-core trim rules through montage-timeline.

use montage_core::{SourceHandle, TrimRange, ValidationError};
use montage_timeline::{Clip, ClipId, MoveDirection, Timeline, TrimUpdate};

// ── Helpers ────────────────────────────────────────────────────

fn clip(name: &str, secs: f64) -> Clip {
    Clip::new(SourceHandle::from_bytes(name, name.as_bytes().to_vec()), secs)
}

fn build_timeline() -> (Timeline, Vec<ClipId>) {
    let mut timeline = Timeline::default();
    let ids = ["intro.mp4", "body.mp4", "outro.mp4"]
        .iter()
        .zip([5.0, 30.0, 10.0])
        .map(|(name, secs)| timeline.add(clip(name, secs)).unwrap())
        .collect();
    (timeline, ids)
}

fn names(timeline: &Timeline) -> Vec<&str> {
    timeline.iter().map(Clip::name).collect()
}

fn assert_close(actual: f64, expected: f64) {
    assert!((actual - expected).abs() < 1e-9, "{actual} != {expected}");
}

fn sum_of_trims(timeline: &Timeline) -> f64 {
    timeline.iter().map(|c| c.trim_end() - c.trim_start()).sum()
}

// ── Assembly & duration ────────────────────────────────────────

#[test]
fn new_clips_are_untrimmed() {
    let (timeline, _) = build_timeline();
    for clip in &timeline {
        assert_eq!(clip.trim(), TrimRange::full(clip.total_duration()));
        assert!(!clip.needs_trim());
    }
    assert_close(timeline.aggregate_duration(), 45.0);
}

#[test]
fn aggregate_tracks_every_mutation() {
    let (mut timeline, ids) = build_timeline();

    timeline.set_trim(ids[1], TrimUpdate::both(5.0, 12.5));
    assert_close(timeline.aggregate_duration(), sum_of_trims(&timeline));
    assert_close(timeline.aggregate_duration(), 5.0 + 7.5 + 10.0);

    timeline.reorder(ids[2], MoveDirection::Earlier);
    assert_close(timeline.aggregate_duration(), sum_of_trims(&timeline));

    timeline.remove(ids[0]);
    assert_close(timeline.aggregate_duration(), 17.5);
}

#[test]
fn rejects_clip_with_invalid_duration() {
    let mut timeline = Timeline::default();
    let err = timeline.add(clip("broken.mp4", f64::NAN)).unwrap_err();
    assert!(matches!(err, ValidationError::InvalidDuration(_)));
    assert!(timeline.is_empty());
}

// ── Trim clamping ──────────────────────────────────────────────

#[test]
fn trim_is_clamped_to_source_and_min_length() {
    let (mut timeline, ids) = build_timeline();
    let min = timeline.min_clip_length();

    timeline.set_trim(ids[0], TrimUpdate::end(99.0));
    assert_close(timeline.get(ids[0]).unwrap().trim_end(), 5.0);

    timeline.set_trim(ids[0], TrimUpdate::start(4.99));
    let trim = timeline.get(ids[0]).unwrap().trim();
    assert_close(trim.start, 5.0 - min);
    assert!(trim.end - trim.start >= min);

    timeline.set_trim(ids[0], TrimUpdate::start(-3.0));
    assert_close(timeline.get(ids[0]).unwrap().trim_start(), 0.0);
}

#[test]
fn unknown_clip_edits_are_ignored() {
    let (mut timeline, _) = build_timeline();
    let stranger = ClipId::new();
    assert!(!timeline.set_trim(stranger, TrimUpdate::start(1.0)));
    assert!(!timeline.reorder(stranger, MoveDirection::Later));
    assert!(timeline.remove(stranger).is_none());
    assert_eq!(timeline.len(), 3);
}

// ── Reordering ─────────────────────────────────────────────────

#[test]
fn move_later_then_earlier_restores_order() {
    let (mut timeline, ids) = build_timeline();
    let before = names(&timeline).join(",");

    assert!(timeline.reorder(ids[0], MoveDirection::Later));
    assert_eq!(names(&timeline), ["body.mp4", "intro.mp4", "outro.mp4"]);
    assert!(timeline.reorder(ids[0], MoveDirection::Earlier));
    assert_eq!(names(&timeline).join(","), before);
}

#[test]
fn moves_past_the_edges_are_no_ops() {
    let (mut timeline, ids) = build_timeline();
    assert!(!timeline.reorder(ids[0], MoveDirection::Earlier));
    assert!(!timeline.reorder(ids[2], MoveDirection::Later));
    assert_eq!(names(&timeline), ["intro.mp4", "body.mp4", "outro.mp4"]);
}

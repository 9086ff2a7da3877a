//! Sequential preview scheduler.
//!
//! Plays the timeline's trimmed clips back to back on one surface:
//! bind clip N, seek to its trim start, play until its trim end, then bind
//! clip N+1. The seek-then-play step is held as a pending action that is
//! consumed exactly once, whether the surface reports metadata right after
//! binding or later through [`SurfaceEvent::MetadataLoaded`].

use montage_core::defaults;
use montage_timeline::{Clip, ClipId, Timeline};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::surface::{PlaybackSurface, SurfaceEvent};

/// Why a preview could not start.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PreviewError {
    #[error("Add clips before previewing")]
    EmptyTimeline,
}

/// Observable scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewState {
    Idle,
    PlayingClip(usize),
}

/// Where the preview is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackCursor {
    /// Timeline index being played, `None` when inactive.
    pub active_index: Option<usize>,
    /// True while a preview runs.
    pub is_playing: bool,
}

impl PlaybackCursor {
    const INACTIVE: Self = Self {
        active_index: None,
        is_playing: false,
    };
}

#[derive(Debug, Clone, Copy)]
struct ActiveClip {
    index: usize,
    id: ClipId,
}

/// Seek-then-play waiting for the surface's metadata.
#[derive(Debug, Clone, Copy)]
struct PendingSeek {
    id: ClipId,
    position: f64,
}

/// Drives one [`PlaybackSurface`] through the timeline.
pub struct PreviewScheduler<S> {
    surface: S,
    boundary_guard: f64,
    active: Option<ActiveClip>,
    pending: Option<PendingSeek>,
}

impl<S: PlaybackSurface> PreviewScheduler<S> {
    /// Create an idle scheduler. A clip counts as finished once the position
    /// reaches `trim_end - boundary_guard`.
    pub fn new(surface: S, boundary_guard: f64) -> Self {
        Self {
            surface,
            boundary_guard,
            active: None,
            pending: None,
        }
    }

    /// Scheduler with the default guard band.
    pub fn with_default_guard(surface: S) -> Self {
        Self::new(surface, defaults::BOUNDARY_GUARD)
    }

    /// Current state.
    pub fn state(&self) -> PreviewState {
        match self.active {
            Some(active) => PreviewState::PlayingClip(active.index),
            None => PreviewState::Idle,
        }
    }

    /// Current cursor.
    pub fn cursor(&self) -> PlaybackCursor {
        match self.active {
            Some(active) => PlaybackCursor {
                active_index: Some(active.index),
                is_playing: true,
            },
            None => PlaybackCursor::INACTIVE,
        }
    }

    /// True while a preview runs.
    pub fn is_playing(&self) -> bool {
        self.active.is_some()
    }

    /// ID of the clip being played.
    pub fn active_clip_id(&self) -> Option<ClipId> {
        self.active.map(|active| active.id)
    }

    /// True while a seek waits for the surface's metadata.
    pub fn has_pending_seek(&self) -> bool {
        self.pending.is_some()
    }

    /// The surface being driven.
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Mutable access to the surface, for pumping its events.
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Start previewing from the first clip. Restarts if already playing.
    pub fn start(&mut self, timeline: &Timeline) -> Result<(), PreviewError> {
        let Some(first) = timeline.clip_at(0) else {
            return Err(PreviewError::EmptyTimeline);
        };
        if self.active.is_some() {
            self.stop();
        }
        info!(clips = timeline.len(), "Preview started");
        self.load_clip(0, first);
        Ok(())
    }

    /// Stop immediately: pause, drop the pending seek, unbind. No-op when idle.
    pub fn stop(&mut self) {
        if self.active.take().is_none() {
            return;
        }
        self.pending = None;
        self.surface.pause();
        self.surface.unbind();
        info!("Preview stopped");
    }

    /// Reset-on-mutation policy: any edit to the timeline ends the preview.
    pub fn timeline_mutated(&mut self) {
        if self.active.is_some() {
            debug!("Timeline changed during preview");
            self.stop();
        }
    }

    /// Dispatch a surface event.
    pub fn handle_event(&mut self, timeline: &Timeline, event: SurfaceEvent) {
        match event {
            SurfaceEvent::MetadataLoaded => self.on_metadata_loaded(timeline),
            SurfaceEvent::TimeUpdate(position) => self.on_time_update(timeline, position),
            SurfaceEvent::Ended => self.on_ended(timeline),
        }
    }

    /// The surface can seek now; run the pending seek-then-play, if any and
    /// if the bound clip is still where it was.
    pub fn on_metadata_loaded(&mut self, timeline: &Timeline) {
        if self.active_clip(timeline).is_some() {
            self.perform_pending_seek();
        }
    }

    /// Boundary detection. Ignored while idle or while a seek is pending,
    /// since the position may still belong to the previous source.
    pub fn on_time_update(&mut self, timeline: &Timeline, position: f64) {
        let Some(clip) = self.active_clip(timeline) else {
            return;
        };
        if self.pending.is_some() {
            return;
        }
        if position >= clip.trim_end() - self.boundary_guard {
            self.advance(timeline);
        }
    }

    /// The source ran out before the boundary was seen.
    pub fn on_ended(&mut self, timeline: &Timeline) {
        if self.active_clip(timeline).is_some() && self.pending.is_none() {
            self.advance(timeline);
        }
    }

    /// Bind a clip and queue its seek-then-play, superseding any earlier one.
    fn load_clip(&mut self, index: usize, clip: &Clip) {
        self.active = Some(ActiveClip {
            index,
            id: clip.id(),
        });
        self.pending = Some(PendingSeek {
            id: clip.id(),
            position: clip.trim_start(),
        });
        debug!(index, clip = %clip.id(), "Preview loading clip");
        self.surface.bind_source(clip.source());
        if self.surface.metadata_ready() {
            self.perform_pending_seek();
        }
    }

    /// Seek-then-play, at most once per bound clip.
    fn perform_pending_seek(&mut self) -> bool {
        let Some(pending) = self.pending.take() else {
            return false;
        };
        if self.active.map(|active| active.id) != Some(pending.id) {
            return false;
        }
        self.surface.seek(pending.position);
        self.surface.play();
        true
    }

    /// The active clip, if it is still where the scheduler left it. Otherwise
    /// the timeline changed underneath the preview and it stops.
    fn active_clip<'t>(&mut self, timeline: &'t Timeline) -> Option<&'t Clip> {
        let active = self.active?;
        match timeline.clip_at(active.index) {
            Some(clip) if clip.id() == active.id => Some(clip),
            _ => {
                warn!(index = active.index, "Active clip is gone; stopping preview");
                self.stop();
                None
            }
        }
    }

    fn advance(&mut self, timeline: &Timeline) {
        let Some(active) = self.active else {
            return;
        };
        match timeline.clip_at(active.index + 1) {
            Some(next) => self.load_clip(active.index + 1, next),
            None => {
                info!("Preview reached the end of the timeline");
                self.stop();
            }
        }
    }
}

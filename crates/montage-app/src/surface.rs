//! Playback surface driven by the wall clock.
//!
//! There is no decoder behind it: the bound source "plays" by advancing a
//! position in real time. Metadata is reported on the first poll after a
//! bind, and time updates at a fixed interval, like a media element would.

use montage_core::SourceHandle;
use montage_preview::{PlaybackSurface, SurfaceEvent};
use std::time::{Duration, Instant};

pub struct ClockSurface {
    bound: Option<String>,
    metadata_sent: bool,
    position: f64,
    playing: bool,
    last_tick: Option<Instant>,
    last_update: Option<Instant>,
    update_interval: Duration,
}

impl ClockSurface {
    pub fn new(update_interval: Duration) -> Self {
        Self {
            bound: None,
            metadata_sent: false,
            position: 0.0,
            playing: false,
            last_tick: None,
            last_update: None,
            update_interval,
        }
    }

    /// Name of the bound source.
    pub fn bound(&self) -> Option<&str> {
        self.bound.as_deref()
    }

    /// Position in the bound source, in seconds.
    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Advance the clock to `now` and collect the events due.
    pub fn poll(&mut self, now: Instant) -> Vec<SurfaceEvent> {
        let mut events = Vec::new();
        if self.bound.is_none() {
            return events;
        }
        if !self.metadata_sent {
            self.metadata_sent = true;
            events.push(SurfaceEvent::MetadataLoaded);
            // Let the scheduler seek before time starts moving.
            return events;
        }
        if !self.playing {
            return events;
        }

        if let Some(last) = self.last_tick {
            self.position += now.saturating_duration_since(last).as_secs_f64();
        }
        self.last_tick = Some(now);

        let due = self
            .last_update
            .map_or(true, |last| now.saturating_duration_since(last) >= self.update_interval);
        if due {
            self.last_update = Some(now);
            events.push(SurfaceEvent::TimeUpdate(self.position));
        }
        events
    }
}

impl PlaybackSurface for ClockSurface {
    fn bind_source(&mut self, source: &SourceHandle) {
        self.bound = Some(source.name().to_string());
        self.metadata_sent = false;
        self.position = 0.0;
        self.last_tick = None;
        self.last_update = None;
    }

    fn metadata_ready(&self) -> bool {
        false
    }

    fn seek(&mut self, seconds: f64) {
        self.position = seconds.max(0.0);
        self.last_tick = None;
    }

    fn play(&mut self) {
        self.playing = true;
    }

    fn pause(&mut self) {
        self.playing = false;
        self.last_tick = None;
    }

    fn unbind(&mut self) {
        self.bound = None;
        self.metadata_sent = false;
        self.position = 0.0;
        self.playing = false;
        self.last_tick = None;
        self.last_update = None;
    }
}

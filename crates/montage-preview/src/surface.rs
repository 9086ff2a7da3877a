//! The playback surface the scheduler drives.

use montage_core::SourceHandle;

/// Notifications a surface sends back to the scheduler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceEvent {
    /// The bound source's metadata is available; seeking is possible.
    MetadataLoaded,
    /// Current playback position, in seconds from the start of the source.
    TimeUpdate(f64),
    /// Playback reached the end of the source.
    Ended,
}

/// A single video-rendering surface (a player widget, a video element).
///
/// While a preview runs the scheduler makes every call into the surface.
pub trait PlaybackSurface {
    /// Point the surface at a new source, dropping the previous one.
    fn bind_source(&mut self, source: &SourceHandle);

    /// True if the bound source's metadata is already loaded, so a seek can
    /// happen without waiting for [`SurfaceEvent::MetadataLoaded`].
    fn metadata_ready(&self) -> bool;

    /// Jump to `seconds` in the bound source.
    fn seek(&mut self, seconds: f64);

    /// Start or resume playback.
    fn play(&mut self);

    /// Pause playback.
    fn pause(&mut self);

    /// Drop the bound source and reset the surface to empty.
    fn unbind(&mut self);
}

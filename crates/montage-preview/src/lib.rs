//! Montage Preview - gapless sequential preview
//!
//! This crate handles:
//! - The playback surface interface
//! - The scheduler that plays trimmed clips back to back on one surface

pub mod scheduler;
pub mod surface;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use scheduler::{PlaybackCursor, PreviewError, PreviewScheduler, PreviewState};
pub use surface::{PlaybackSurface, SurfaceEvent};

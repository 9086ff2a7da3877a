//! Montage Core - Foundation types for clip assembly
//!
//! This crate provides the fundamental types used throughout Montage Studio:
//! - Trim ranges and timecode formatting
//! - Media source handles and media-kind validation
//! - Editor configuration (minimum clip length, boundary guard band)
//! - Error kinds shared by the timeline, preview and export crates

pub mod config;
pub mod error;
pub mod source;
pub mod time;

pub use config::MontageConfig;
pub use error::{DecodeError, MontageError, Result, ValidationError};
pub use source::{video_extensions, MediaFile, MediaKind, SourceHandle, SourceView};
pub use time::{format_timecode, TrimRange};

/// Default limits used when no configuration file is present.
pub mod defaults {
    /// Shortest trimmed clip, in seconds.
    pub const MIN_CLIP_LENGTH: f64 = 0.1;

    /// Guard band before a clip's trim end at which preview advances, in seconds.
    pub const BOUNDARY_GUARD: f64 = 0.05;

    /// File name offered for the exported montage.
    pub const OUTPUT_FILE_NAME: &str = "montage.mp4";

    /// How often a playback surface is expected to report its position.
    pub const TIME_UPDATE_INTERVAL_MS: u64 = 250;
}

//! Error types for Montage Studio.

use thiserror::Error;

/// Input rejected at the boundary: bad trim bounds, non-video files, bad config.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{name} is not a video file")]
    NotVideo { name: String },

    #[error("Invalid trim range: start {start} must be below end {end}")]
    InvertedTrim { start: f64, end: f64 },

    #[error("Trim range {length:.3}s is shorter than the minimum {min:.3}s")]
    TooShort { length: f64, min: f64 },

    #[error("Duration must be finite and positive, got {0}")]
    InvalidDuration(f64),

    #[error("Trim range [{start}, {end}] exceeds clip duration {duration}")]
    OutOfRange { start: f64, end: f64, duration: f64 },

    #[error("Clip {0} is already on the timeline")]
    DuplicateClip(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// A source whose duration or contents could not be decoded.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("Could not read the duration of {name}: {reason}")]
    Duration { name: String, reason: String },

    #[error("Could not load {name}: {reason}")]
    Unreadable { name: String, reason: String },
}

/// Main error type for Montage operations.
#[derive(Error, Debug)]
pub enum MontageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Montage operations.
pub type Result<T> = std::result::Result<T, MontageError>;

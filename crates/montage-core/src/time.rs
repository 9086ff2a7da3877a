//! Time representation for trimmed clips.
//!
//! Clip positions are plain seconds (`f64`): cuts are keyframe-aligned stream
//! copies, so sub-frame precision is never needed. Tolerances below absorb the
//! rounding of `end - min` style arithmetic.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Slack allowed when checking the minimum-length invariant.
pub const TIME_EPSILON: f64 = 1e-9;

/// Format seconds as `HH:MM:SS.ss`. Negative input is clamped to zero.
pub fn format_timecode(seconds: f64) -> String {
    let clamped = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
    let hours = (clamped / 3600.0).floor() as u64;
    let minutes = ((clamped % 3600.0) / 60.0).floor() as u64;
    let secs = clamped % 60.0;
    format!("{hours:02}:{minutes:02}:{secs:05.2}")
}

/// The `[start, end]` window of a clip that ends up in the montage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrimRange {
    /// In point, seconds from the start of the source.
    pub start: f64,
    /// Out point, seconds from the start of the source.
    pub end: f64,
}

impl TrimRange {
    /// Create a range without validating it.
    #[inline]
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// The whole source.
    #[inline]
    pub fn full(duration: f64) -> Self {
        Self::new(0.0, duration)
    }

    /// Length of the range in seconds.
    #[inline]
    pub fn length(self) -> f64 {
        self.end - self.start
    }

    /// True if the range covers the whole source, so no trim is needed on export.
    pub fn is_full(self, duration: f64) -> bool {
        self.start <= 0.0 && self.end >= duration
    }

    /// Check `0 <= start < end <= duration` and `end - start >= min_length`.
    pub fn validate(self, duration: f64, min_length: f64) -> Result<(), ValidationError> {
        if !duration.is_finite() || duration <= 0.0 {
            return Err(ValidationError::InvalidDuration(duration));
        }
        if !self.start.is_finite() || !self.end.is_finite() || self.end <= self.start {
            return Err(ValidationError::InvertedTrim {
                start: self.start,
                end: self.end,
            });
        }
        if self.start < 0.0 || self.end > duration {
            return Err(ValidationError::OutOfRange {
                start: self.start,
                end: self.end,
                duration,
            });
        }
        if self.length() + TIME_EPSILON < min_length {
            return Err(ValidationError::TooShort {
                length: self.length(),
                min: min_length,
            });
        }
        Ok(())
    }

    /// Move the in point, keeping it inside `[0, end - min_length]`.
    pub fn with_start(self, start: f64, min_length: f64) -> Self {
        if !start.is_finite() {
            return self;
        }
        let upper = latest_start(self.end, min_length);
        Self {
            start: start.max(0.0).min(upper),
            end: self.end,
        }
    }

    /// Move the out point, keeping it inside `[start + min_length, duration]`.
    pub fn with_end(self, end: f64, duration: f64, min_length: f64) -> Self {
        if !end.is_finite() {
            return self;
        }
        let lower = earliest_end(self.start, min_length, duration);
        Self {
            start: self.start,
            end: end.min(duration).max(lower),
        }
    }
}

/// Latest in point that still leaves `end - start >= min_length` after rounding.
fn latest_start(end: f64, min_length: f64) -> f64 {
    let mut start = (end - min_length).max(0.0);
    while start > 0.0 && end - start < min_length {
        start = f64::from_bits(start.to_bits() - 1);
    }
    start
}

/// Earliest out point that still leaves `end - start >= min_length` after
/// rounding, capped at `duration`.
fn earliest_end(start: f64, min_length: f64, duration: f64) -> f64 {
    let mut end = start + min_length;
    while end < duration && end - start < min_length {
        end = f64::from_bits(end.to_bits() + 1);
    }
    end.min(duration)
}

impl fmt::Display for TrimRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            format_timecode(self.start),
            format_timecode(self.end)
        )
    }
}

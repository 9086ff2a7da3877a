//! Clip types for the timeline.

use montage_core::{SourceHandle, TrimRange, ValidationError};
use std::fmt;
use uuid::Uuid;

/// Stable identifier of a clip for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClipId(Uuid);

impl ClipId {
    /// Generate a fresh identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClipId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Direction of a single-step reorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    /// One position towards the start.
    Earlier,
    /// One position towards the end.
    Later,
}

impl MoveDirection {
    /// Index reached by moving one step from `index`, if it stays inside `len`.
    pub fn target(self, index: usize, len: usize) -> Option<usize> {
        match self {
            Self::Earlier => index.checked_sub(1),
            Self::Later => Some(index + 1).filter(|&target| target < len),
        }
    }
}

/// Requested change to a clip's trim range. Absent bounds are left as they are.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrimUpdate {
    pub start: Option<f64>,
    pub end: Option<f64>,
}

impl TrimUpdate {
    /// Move only the in point.
    pub fn start(start: f64) -> Self {
        Self {
            start: Some(start),
            end: None,
        }
    }

    /// Move only the out point.
    pub fn end(end: f64) -> Self {
        Self {
            start: None,
            end: Some(end),
        }
    }

    /// Move both points.
    pub fn both(start: f64, end: f64) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }
}

/// One source on the timeline together with the part of it that is kept.
#[derive(Debug)]
pub struct Clip {
    id: ClipId,
    name: String,
    source: SourceHandle,
    total_duration: f64,
    trim: TrimRange,
}

impl Clip {
    /// Create an untrimmed clip from a probed source.
    pub fn new(source: SourceHandle, total_duration: f64) -> Self {
        let name = source.name().to_string();
        Self::with_trim(name, source, total_duration, TrimRange::full(total_duration))
    }

    /// Create a clip with an explicit name and trim range. Not validated here;
    /// the timeline validates on insert.
    pub fn with_trim(
        name: impl Into<String>,
        source: SourceHandle,
        total_duration: f64,
        trim: TrimRange,
    ) -> Self {
        Self {
            id: ClipId::new(),
            name: name.into(),
            source,
            total_duration,
            trim,
        }
    }

    /// Unique clip ID.
    pub fn id(&self) -> ClipId {
        self.id
    }

    /// Name displayed in the UI.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Owning handle to the clip's media.
    pub fn source(&self) -> &SourceHandle {
        &self.source
    }

    /// Full length of the source, in seconds.
    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }

    /// Current trim window.
    pub fn trim(&self) -> TrimRange {
        self.trim
    }

    /// In point, seconds.
    pub fn trim_start(&self) -> f64 {
        self.trim.start
    }

    /// Out point, seconds.
    pub fn trim_end(&self) -> f64 {
        self.trim.end
    }

    /// Length that ends up in the montage.
    pub fn trimmed_duration(&self) -> f64 {
        self.trim.length().max(0.0)
    }

    /// True if export has to cut this clip rather than copy it whole.
    pub fn needs_trim(&self) -> bool {
        !self.trim.is_full(self.total_duration)
    }

    /// Check the trim invariant against `min_length`.
    pub fn validate(&self, min_length: f64) -> Result<(), ValidationError> {
        self.trim.validate(self.total_duration, min_length)
    }

    /// Apply a trim update, clamping each bound against the other.
    ///
    /// Non-finite bounds are ignored. When both bounds move, the end is
    /// settled first against the widest legal window and the start is then
    /// clamped below it.
    pub(crate) fn apply_trim(&mut self, update: TrimUpdate, min_length: f64) {
        let duration = self.total_duration;
        let start = update.start.filter(|v| v.is_finite());
        let end = update.end.filter(|v| v.is_finite());
        self.trim = match (start, end) {
            (Some(start), Some(end)) => TrimRange::new(0.0, self.trim.end)
                .with_end(end, duration, min_length)
                .with_start(start, min_length),
            (Some(start), None) => self.trim.with_start(start, min_length),
            (None, Some(end)) => self.trim.with_end(end, duration, min_length),
            (None, None) => self.trim,
        };
    }
}

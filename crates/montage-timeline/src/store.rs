//! The ordered clip store.
//!
//! Order in the store is playback and export order. Every mutation keeps the
//! trim invariant of each clip; aggregate duration is always recomputed from
//! the current clips.

use montage_core::{defaults, ValidationError};
use tracing::{debug, info};

use crate::clip::{Clip, ClipId, MoveDirection, TrimUpdate};

/// Ordered sequence of clips.
#[derive(Debug)]
pub struct Timeline {
    clips: Vec<Clip>,
    min_clip_length: f64,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new(defaults::MIN_CLIP_LENGTH)
    }
}

impl Timeline {
    /// Create an empty timeline enforcing `min_clip_length` seconds per clip.
    pub fn new(min_clip_length: f64) -> Self {
        Self {
            clips: Vec::new(),
            min_clip_length,
        }
    }

    /// Minimum trimmed length enforced on every clip.
    pub fn min_clip_length(&self) -> f64 {
        self.min_clip_length
    }

    /// Append a clip to the end of the timeline.
    pub fn add(&mut self, clip: Clip) -> Result<ClipId, ValidationError> {
        clip.validate(self.min_clip_length)?;
        if self.index_of(clip.id()).is_some() {
            return Err(ValidationError::DuplicateClip(clip.id().to_string()));
        }
        let id = clip.id();
        info!(clip = %id, name = clip.name(), duration = clip.total_duration(), "Added clip");
        self.clips.push(clip);
        Ok(id)
    }

    /// Remove a clip. Returns it so the caller decides when its source is
    /// released; dropping the returned value releases it.
    pub fn remove(&mut self, id: ClipId) -> Option<Clip> {
        let index = self.index_of(id)?;
        let clip = self.clips.remove(index);
        info!(clip = %id, index, "Removed clip");
        Some(clip)
    }

    /// Move a clip one step. Returns `true` if the order changed.
    pub fn reorder(&mut self, id: ClipId, direction: MoveDirection) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        let Some(target) = direction.target(index, self.clips.len()) else {
            return false;
        };
        let clip = self.clips.remove(index);
        self.clips.insert(target, clip);
        debug!(clip = %id, from = index, to = target, "Reordered clip");
        true
    }

    /// Change a clip's trim window, clamping out-of-range input.
    /// Returns `false` if the clip does not exist.
    pub fn set_trim(&mut self, id: ClipId, update: TrimUpdate) -> bool {
        let min = self.min_clip_length;
        match self.get_mut(id) {
            Some(clip) => {
                clip.apply_trim(update, min);
                debug!(clip = %id, trim = %clip.trim(), "Trim updated");
                true
            }
            None => false,
        }
    }

    /// Sum of trimmed lengths of all clips, in seconds.
    pub fn aggregate_duration(&self) -> f64 {
        self.clips.iter().map(Clip::trimmed_duration).sum()
    }

    /// Drop every clip, releasing all sources.
    pub fn clear(&mut self) {
        if !self.clips.is_empty() {
            info!(count = self.clips.len(), "Cleared timeline");
        }
        self.clips.clear();
    }

    /// Find a clip by ID.
    pub fn get(&self, id: ClipId) -> Option<&Clip> {
        self.clips.iter().find(|clip| clip.id() == id)
    }

    fn get_mut(&mut self, id: ClipId) -> Option<&mut Clip> {
        self.clips.iter_mut().find(|clip| clip.id() == id)
    }

    /// Position of a clip in playback order.
    pub fn index_of(&self, id: ClipId) -> Option<usize> {
        self.clips.iter().position(|clip| clip.id() == id)
    }

    /// Clip at a playback position.
    pub fn clip_at(&self, index: usize) -> Option<&Clip> {
        self.clips.get(index)
    }

    /// Clips in playback order.
    pub fn iter(&self) -> std::slice::Iter<'_, Clip> {
        self.clips.iter()
    }

    /// Clip IDs in playback order.
    pub fn ids(&self) -> Vec<ClipId> {
        self.clips.iter().map(Clip::id).collect()
    }

    /// Number of clips.
    pub fn len(&self) -> usize {
        self.clips.len()
    }

    /// True if there is nothing to preview or export.
    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}

impl<'a> IntoIterator for &'a Timeline {
    type Item = &'a Clip;
    type IntoIter = std::slice::Iter<'a, Clip>;

    fn into_iter(self) -> Self::IntoIter {
        self.clips.iter()
    }
}

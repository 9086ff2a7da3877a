//! Recording surface for tests.

use montage_core::SourceHandle;

use crate::surface::PlaybackSurface;

/// A call the scheduler made into the surface.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    Bind(String),
    Seek(f64),
    Play,
    Pause,
    Unbind,
}

/// Surface that records calls and never renders anything.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    calls: Vec<SurfaceCall>,
    immediate_metadata: bool,
    bound: Option<String>,
}

impl RecordingSurface {
    /// Metadata only arrives through an explicit `MetadataLoaded` event.
    pub fn deferred() -> Self {
        Self::default()
    }

    /// Metadata is ready as soon as a source is bound.
    pub fn immediate() -> Self {
        Self {
            immediate_metadata: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> &[SurfaceCall] {
        &self.calls
    }

    /// Name of the bound source.
    pub fn bound(&self) -> Option<&str> {
        self.bound.as_deref()
    }

    /// Names bound so far, in order.
    pub fn bound_names(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                SurfaceCall::Bind(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    /// Seek positions issued so far, in order.
    pub fn seeks(&self) -> Vec<f64> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                SurfaceCall::Seek(position) => Some(*position),
                _ => None,
            })
            .collect()
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }
}

impl PlaybackSurface for RecordingSurface {
    fn bind_source(&mut self, source: &SourceHandle) {
        self.bound = Some(source.name().to_string());
        self.calls.push(SurfaceCall::Bind(source.name().to_string()));
    }

    fn metadata_ready(&self) -> bool {
        self.immediate_metadata && self.bound.is_some()
    }

    fn seek(&mut self, seconds: f64) {
        self.calls.push(SurfaceCall::Seek(seconds));
    }

    fn play(&mut self) {
        self.calls.push(SurfaceCall::Play);
    }

    fn pause(&mut self) {
        self.calls.push(SurfaceCall::Pause);
    }

    fn unbind(&mut self) {
        self.bound = None;
        self.calls.push(SurfaceCall::Unbind);
    }
}

//! Export progress shared between the pipeline, the engine and the UI.

use parking_lot::Mutex;
use std::sync::Arc;

/// Stage of a running export.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExportStage {
    /// No export running.
    #[default]
    Idle,
    /// Creating the encode engine (first export only).
    LoadingEngine,
    /// Copying a source into the engine.
    Ingesting { index: usize, count: usize },
    /// Cutting a clip to its trim window.
    Trimming { name: String },
    /// Joining the clips.
    Concatenating,
    /// Reading the finished montage back.
    Collecting,
}

impl ExportStage {
    /// Display name for the stage.
    pub fn display_name(&self) -> String {
        match self {
            Self::Idle => "Idle".into(),
            Self::LoadingEngine => "Loading the processing engine...".into(),
            Self::Ingesting { index, count } => {
                format!("Preparing clip {} of {}...", index + 1, count)
            }
            Self::Trimming { name } => format!("Trimming clip {name}..."),
            Self::Concatenating => "Merging clips...".into(),
            Self::Collecting => "Finalizing the video...".into(),
        }
    }
}

#[derive(Debug, Default)]
struct ProgressState {
    fraction: f64,
    stage: ExportStage,
}

/// Latest export progress. Cheap to clone; all clones share state.
#[derive(Debug, Clone, Default)]
pub struct ExportProgress {
    inner: Arc<Mutex<ProgressState>>,
}

impl ExportProgress {
    /// Create an idle progress tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Completion fraction (0.0 to 1.0) of the current engine operation.
    pub fn fraction(&self) -> f64 {
        self.inner.lock().fraction
    }

    /// Current stage.
    pub fn stage(&self) -> ExportStage {
        self.inner.lock().stage.clone()
    }

    /// Handle given to the engine for reporting raw progress values.
    pub fn sink(&self) -> ProgressSink {
        ProgressSink {
            progress: self.clone(),
        }
    }

    pub(crate) fn set_stage(&self, stage: ExportStage) {
        self.inner.lock().stage = stage;
    }

    /// Back to idle with zero progress.
    pub(crate) fn reset(&self) {
        let mut state = self.inner.lock();
        state.fraction = 0.0;
        state.stage = ExportStage::Idle;
    }

    fn report(&self, value: f64) {
        if value.is_nan() {
            return;
        }
        self.inner.lock().fraction = value.clamp(0.0, 1.0);
    }
}

/// Engine-facing side of [`ExportProgress`]: can only report values.
#[derive(Debug, Clone)]
pub struct ProgressSink {
    progress: ExportProgress,
}

impl ProgressSink {
    /// Report a raw progress value. Values are clamped into `[0, 1]`; NaN is ignored.
    pub fn report(&self, value: f64) {
        self.progress.report(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_clamped() {
        let progress = ExportProgress::new();
        let sink = progress.sink();
        sink.report(0.4);
        assert_eq!(progress.fraction(), 0.4);
        sink.report(1.7);
        assert_eq!(progress.fraction(), 1.0);
        sink.report(-0.2);
        assert_eq!(progress.fraction(), 0.0);
        sink.report(f64::NAN);
        assert_eq!(progress.fraction(), 0.0);
    }

    #[test]
    fn test_reset_returns_to_idle() {
        let progress = ExportProgress::new();
        progress.sink().report(0.8);
        progress.set_stage(ExportStage::Concatenating);
        progress.reset();
        assert_eq!(progress.fraction(), 0.0);
        assert_eq!(progress.stage(), ExportStage::Idle);
    }

    #[test]
    fn test_stage_names() {
        let stage = ExportStage::Ingesting { index: 0, count: 3 };
        assert_eq!(stage.display_name(), "Preparing clip 1 of 3...");
        let stage = ExportStage::Trimming {
            name: "beach.mp4".into(),
        };
        assert_eq!(stage.display_name(), "Trimming clip beach.mp4...");
    }
}

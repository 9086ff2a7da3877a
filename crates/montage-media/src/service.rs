//! Session-scoped export service.
//!
//! Owns the lazily created encode engine for the whole session and admits
//! one export at a time. The engine slot's lock doubles as the single-job
//! guard: a request that cannot take it immediately is rejected.

use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{info, warn};

use crate::engine::EngineLoader;
use crate::error::{CleanupError, ExportError};
use crate::export::{ExportArtifact, ExportClip, ExportJob};
use crate::progress::{ExportProgress, ExportStage};

/// Runs export jobs against a single lazily loaded engine.
pub struct ExportService<L: EngineLoader> {
    loader: L,
    engine: AsyncMutex<Option<L::Engine>>,
    progress: ExportProgress,
    output_file_name: String,
    last_cleanup_failures: Mutex<Vec<CleanupError>>,
}

impl<L: EngineLoader> ExportService<L> {
    /// Create a service. The engine is not loaded until the first export.
    pub fn new(loader: L, output_file_name: impl Into<String>) -> Self {
        Self {
            loader,
            engine: AsyncMutex::new(None),
            progress: ExportProgress::new(),
            output_file_name: output_file_name.into(),
            last_cleanup_failures: Mutex::new(Vec::new()),
        }
    }

    /// Shared progress of the running export.
    pub fn progress(&self) -> &ExportProgress {
        &self.progress
    }

    /// The loader this service creates its engine with.
    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// True while an export holds the engine.
    pub fn is_busy(&self) -> bool {
        self.engine.try_lock().is_err()
    }

    /// Cleanup failures of the most recent export.
    pub fn last_cleanup_failures(&self) -> Vec<CleanupError> {
        self.last_cleanup_failures.lock().clone()
    }

    /// Export `clips` in order. Rejected with [`ExportError::Busy`] if another
    /// export is running.
    pub async fn export(&self, clips: Vec<ExportClip>) -> Result<ExportArtifact, ExportError> {
        let Ok(mut slot) = self.engine.try_lock() else {
            warn!("Export rejected: another export is running");
            return Err(ExportError::Busy);
        };
        if clips.is_empty() {
            return Err(ExportError::EmptyTimeline);
        }

        let engine = match slot.take() {
            Some(engine) => engine,
            None => {
                self.progress.set_stage(ExportStage::LoadingEngine);
                match self.loader.load(self.progress.sink()).await {
                    Ok(engine) => {
                        info!("Encode engine ready");
                        engine
                    }
                    Err(e) => {
                        self.progress.reset();
                        return Err(e.into());
                    }
                }
            }
        };
        let engine = slot.insert(engine);

        let mut job = ExportJob::new(clips).with_output_file_name(self.output_file_name.clone());
        let result = job.run(engine, &self.progress).await;
        *self.last_cleanup_failures.lock() = job.cleanup_failures().to_vec();
        Ok(result?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{EngineScript, RecordingLoader};
    use montage_core::{SourceHandle, TrimRange};
    use std::sync::Arc;

    fn clips(handles: &[SourceHandle]) -> Vec<ExportClip> {
        handles
            .iter()
            .map(|h| ExportClip {
                name: h.name().to_string(),
                source: h.view(),
                total_duration: 2.0,
                trim: TrimRange::full(2.0),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_engine_loaded_once() {
        let loader = RecordingLoader::new(EngineScript::default());
        let service = ExportService::new(loader.clone(), "montage.mp4");
        let handles = [SourceHandle::from_bytes("a.mp4", b"A".to_vec())];

        service.export(clips(&handles)).await.unwrap();
        service.export(clips(&handles)).await.unwrap();
        assert_eq!(loader.load_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_export_rejected_without_loading() {
        let loader = RecordingLoader::new(EngineScript::default());
        let service = ExportService::new(loader.clone(), "montage.mp4");
        let err = service.export(Vec::new()).await.unwrap_err();
        assert!(matches!(err, ExportError::EmptyTimeline));
        assert_eq!(loader.load_count(), 0);
    }

    #[tokio::test]
    async fn test_second_export_while_running_is_rejected() {
        let hold = Arc::new(tokio::sync::Notify::new());
        let loader = RecordingLoader::new(EngineScript {
            hold_before_concat: Some(Arc::clone(&hold)),
            ..EngineScript::default()
        });
        let service = Arc::new(ExportService::new(loader.clone(), "montage.mp4"));
        let handles = [SourceHandle::from_bytes("a.mp4", b"A".to_vec())];

        let running = {
            let service = Arc::clone(&service);
            let clips = clips(&handles);
            tokio::spawn(async move { service.export(clips).await })
        };
        while !service.is_busy() {
            tokio::task::yield_now().await;
        }

        let err = service.export(clips(&handles)).await.unwrap_err();
        assert!(matches!(err, ExportError::Busy));

        hold.notify_one();
        let artifact = running.await.unwrap().unwrap();
        assert_eq!(artifact.bytes, b"A");
        assert_eq!(loader.load_count(), 1);
        assert!(!service.is_busy());
    }
}

//! The editing session.
//!
//! Ties the timeline, the preview scheduler and the export service together
//! and keeps the status line. Every timeline edit except an append ends a
//! running preview.

use montage_core::{DecodeError, MediaFile, MontageConfig, SourceHandle};
use montage_media::{DurationProber, EngineLoader, ExportArtifact, ExportClip, ExportError, ExportService};
use montage_preview::{PlaybackSurface, PreviewError, PreviewScheduler, SurfaceEvent};
use montage_timeline::{Clip, ClipId, MoveDirection, Timeline, TrimUpdate};
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::status::StatusMessage;

/// A source paired with the outcome of probing its duration.
pub type ProbedSource = (SourceHandle, Result<f64, DecodeError>);

/// Probe each source in order. Needs no session, so it can run on a worker.
pub async fn probe_sources<P: DurationProber>(
    prober: &P,
    sources: Vec<SourceHandle>,
) -> Vec<ProbedSource> {
    let mut probed = Vec::with_capacity(sources.len());
    for source in sources {
        let duration = prober.probe(&source).await;
        probed.push((source, duration));
    }
    probed
}

/// One user's editing session.
pub struct Session<S, L: EngineLoader> {
    config: MontageConfig,
    timeline: Timeline,
    preview: PreviewScheduler<S>,
    exporter: Arc<ExportService<L>>,
    status: StatusMessage,
    result: Option<ExportArtifact>,
    exporting: bool,
}

impl<S: PlaybackSurface, L: EngineLoader> Session<S, L> {
    /// Create a session. The export engine is loaded on the first export.
    pub fn new(config: MontageConfig, surface: S, loader: L) -> Self {
        let exporter = ExportService::new(loader, config.output_file_name.clone());
        Self {
            timeline: Timeline::new(config.min_clip_length),
            preview: PreviewScheduler::new(surface, config.boundary_guard),
            exporter: Arc::new(exporter),
            config,
            status: StatusMessage::Empty,
            result: None,
            exporting: false,
        }
    }

    pub fn config(&self) -> &MontageConfig {
        &self.config
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn preview(&self) -> &PreviewScheduler<S> {
        &self.preview
    }

    /// The surface, for pumping its events.
    pub fn surface_mut(&mut self) -> &mut S {
        self.preview.surface_mut()
    }

    pub fn exporter(&self) -> &Arc<ExportService<L>> {
        &self.exporter
    }

    /// Current status. While an export runs this follows its stage.
    pub fn status(&self) -> StatusMessage {
        if self.exporting {
            StatusMessage::Exporting(self.exporter.progress().stage())
        } else {
            self.status.clone()
        }
    }

    /// True while an export is prepared or running.
    pub fn is_processing(&self) -> bool {
        self.exporting
    }

    /// Progress of the running engine operation, 0.0 to 1.0.
    pub fn progress(&self) -> f64 {
        self.exporter.progress().fraction()
    }

    /// The latest finished montage.
    pub fn result(&self) -> Option<&ExportArtifact> {
        self.result.as_ref()
    }

    /// Total trimmed duration of the timeline, in seconds.
    pub fn total_duration(&self) -> f64 {
        self.timeline.aggregate_duration()
    }

    // ── Import ─────────────────────────────────────────────────────

    /// Import files. Non-video files are skipped; each accepted file is probed
    /// and appended in input order. Returns the IDs of the added clips.
    pub async fn add_files<P: DurationProber>(
        &mut self,
        prober: &P,
        files: Vec<MediaFile>,
    ) -> Vec<ClipId> {
        let sources = self.begin_import(files);
        if sources.is_empty() {
            return Vec::new();
        }
        let probed = probe_sources(prober, sources).await;
        self.finish_import(probed)
    }

    /// First half of an import: keep the video files. Probe the returned
    /// sources with [`probe_sources`], then hand them to
    /// [`Session::finish_import`].
    pub fn begin_import(&mut self, files: Vec<MediaFile>) -> Vec<SourceHandle> {
        let sources: Vec<_> = files
            .into_iter()
            .filter_map(|file| match file.into_video_source() {
                Ok(source) => Some(source),
                Err(e) => {
                    info!("Skipping import: {e}");
                    None
                }
            })
            .collect();
        self.status = if sources.is_empty() {
            StatusMessage::NoValidVideos
        } else {
            StatusMessage::Analyzing
        };
        sources
    }

    /// Append the successfully probed sources in order and report the rest.
    pub fn finish_import(&mut self, probed: Vec<ProbedSource>) -> Vec<ClipId> {
        let mut added = Vec::with_capacity(probed.len());
        let mut failed = Vec::new();
        for (source, duration) in probed {
            let name = source.name().to_string();
            let duration = match duration {
                Ok(duration) => duration,
                Err(e) => {
                    warn!(source = %name, "Probe failed: {e}");
                    failed.push(name);
                    continue;
                }
            };
            match self.timeline.add(Clip::new(source, duration)) {
                Ok(id) => added.push(id),
                Err(e) => {
                    warn!(source = %name, "Clip rejected: {e}");
                    failed.push(name);
                }
            }
        }

        self.status = match (added.is_empty(), failed.is_empty()) {
            (_, true) => StatusMessage::ClipsAdded,
            (false, false) => StatusMessage::ClipsPartiallyAdded { failed },
            (true, false) => StatusMessage::ProbeFailed { failed },
        };
        added
    }

    // ── Editing ────────────────────────────────────────────────────

    /// Remove a clip. Returns false if the ID is unknown.
    pub fn remove_clip(&mut self, id: ClipId) -> bool {
        let removed = self.timeline.remove(id).is_some();
        if removed {
            self.preview.timeline_mutated();
        }
        removed
    }

    /// Move a clip one place. Returns false at the timeline's edges.
    pub fn move_clip(&mut self, id: ClipId, direction: MoveDirection) -> bool {
        let moved = self.timeline.reorder(id, direction);
        if moved {
            self.preview.timeline_mutated();
        }
        moved
    }

    /// Change a clip's trim window; values are clamped into range.
    pub fn set_trim(&mut self, id: ClipId, update: TrimUpdate) -> bool {
        let found = self.timeline.set_trim(id, update);
        if found {
            self.preview.timeline_mutated();
        }
        found
    }

    // ── Preview ────────────────────────────────────────────────────

    pub fn start_preview(&mut self) -> Result<(), PreviewError> {
        match self.preview.start(&self.timeline) {
            Ok(()) => {
                self.status = StatusMessage::PreviewPlaying;
                Ok(())
            }
            Err(e) => {
                self.status = StatusMessage::AddClipsBeforePreview;
                Err(e)
            }
        }
    }

    pub fn stop_preview(&mut self) {
        self.preview.stop();
    }

    /// Forward a surface notification to the scheduler.
    pub fn handle_surface_event(&mut self, event: SurfaceEvent) {
        self.preview.handle_event(&self.timeline, event);
    }

    // ── Export ─────────────────────────────────────────────────────

    /// Snapshot the timeline into an export job that can run on any runtime.
    /// Hand its output to [`Session::finish_export`].
    pub fn prepare_export(
        &mut self,
    ) -> Result<impl Future<Output = Result<ExportArtifact, ExportError>> + Send + 'static, ExportError>
    where
        L: 'static,
    {
        if self.exporting || self.exporter.is_busy() {
            warn!("Export already running");
            return Err(ExportError::Busy);
        }
        if self.timeline.is_empty() {
            self.status = StatusMessage::AddClipsBeforeExport;
            return Err(ExportError::EmptyTimeline);
        }

        let clips: Vec<ExportClip> = self
            .timeline
            .iter()
            .map(|clip| ExportClip {
                name: clip.name().to_string(),
                source: clip.source().view(),
                total_duration: clip.total_duration(),
                trim: clip.trim(),
            })
            .collect();
        info!(clips = clips.len(), duration = self.total_duration(), "Export requested");

        self.result = None;
        self.exporting = true;
        self.status = StatusMessage::PreparingExport;
        let exporter = Arc::clone(&self.exporter);
        Ok(async move { exporter.export(clips).await })
    }

    /// Record the outcome of a job from [`Session::prepare_export`].
    pub fn finish_export(
        &mut self,
        outcome: Result<ExportArtifact, ExportError>,
    ) -> Result<(), ExportError> {
        self.exporting = false;
        match outcome {
            Ok(artifact) => {
                info!(file = %artifact.file_name, bytes = artifact.len(), "Export finished");
                self.result = Some(artifact);
                self.status = StatusMessage::ExportDone;
                Ok(())
            }
            Err(ExportError::Busy) => {
                self.status = StatusMessage::ExportBusy;
                Err(ExportError::Busy)
            }
            Err(ExportError::EmptyTimeline) => {
                self.status = StatusMessage::AddClipsBeforeExport;
                Err(ExportError::EmptyTimeline)
            }
            Err(e) => {
                error!("Export failed: {e}");
                self.status = StatusMessage::ExportFailed;
                Err(e)
            }
        }
    }

    /// Run an export to completion on the current task.
    pub async fn export(&mut self) -> Result<(), ExportError>
    where
        L: 'static,
    {
        let job = self.prepare_export()?;
        let outcome = job.await;
        self.finish_export(outcome)
    }
}

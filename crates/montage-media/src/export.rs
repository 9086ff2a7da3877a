//! Export pipeline: turns an ordered list of trimmed clips into one file.
//!
//! Steps, all awaited in order against a single engine:
//! 1. ingest every source as `clip_{i}.mp4`
//! 2. stream-copy trim clips whose window is not the whole source
//! 3. write a concat manifest
//! 4. stream-copy concat into `output.mp4`
//! 5. read the result back
//!
//! Every artifact created along the way is deleted afterwards, whether the
//! export succeeded or not. Deletion failures are logged and collected as
//! [`CleanupError`]s and never change the export's result.

use montage_core::{defaults, SourceView, TrimRange};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::engine::{concat_manifest, EncodeEngine, EngineOp};
use crate::error::{CleanupError, EngineError, EngineResult};
use crate::progress::{ExportProgress, ExportStage};

/// Name of the concat manifest inside the engine.
pub const MANIFEST_NAME: &str = "concat.txt";

/// Name of the concatenated output inside the engine.
pub const OUTPUT_NAME: &str = "output.mp4";

/// Name under which clip `index` is ingested.
pub fn source_artifact_name(index: usize) -> String {
    format!("clip_{index}.mp4")
}

/// Name of clip `index` after trimming.
pub fn trimmed_artifact_name(index: usize) -> String {
    format!("clip_{index}_trimmed.mp4")
}

/// One clip as seen by an export job: a snapshot of its trim window plus a
/// read-only view of its media.
#[derive(Debug, Clone)]
pub struct ExportClip {
    /// Name shown in status messages.
    pub name: String,
    /// Media to ingest.
    pub source: SourceView,
    /// Full length of the source, in seconds.
    pub total_duration: f64,
    /// Window to keep.
    pub trim: TrimRange,
}

impl ExportClip {
    /// True if the clip has to be cut rather than copied whole.
    pub fn needs_trim(&self) -> bool {
        self.trim.start > 0.0 || self.trim.end < self.total_duration
    }
}

/// The finished montage.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    /// Default file name offered for download.
    pub file_name: String,
    /// Container bytes.
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    /// MIME type of the exported container.
    pub const MIME: &'static str = "video/mp4";

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True if the engine produced an empty file.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Write the artifact. If `target` is a directory, the default file name
    /// is used inside it. Returns the path written.
    pub fn save_to<P: AsRef<Path>>(&self, target: P) -> std::io::Result<PathBuf> {
        let target = target.as_ref();
        let path = if target.is_dir() {
            target.join(&self.file_name)
        } else {
            target.to_path_buf()
        };
        std::fs::write(&path, &self.bytes)?;
        info!(path = %path.display(), bytes = self.bytes.len(), "Saved montage");
        Ok(path)
    }
}

/// One export run. Exists for the duration of a single export.
#[derive(Debug)]
pub struct ExportJob {
    clips: Vec<ExportClip>,
    output_file_name: String,
    /// Artifacts created in the engine, in creation order.
    created: Vec<String>,
    cleanup_failures: Vec<CleanupError>,
}

impl ExportJob {
    /// Create a job over `clips` in playback order.
    pub fn new(clips: Vec<ExportClip>) -> Self {
        Self {
            clips,
            output_file_name: defaults::OUTPUT_FILE_NAME.to_string(),
            created: Vec::new(),
            cleanup_failures: Vec::new(),
        }
    }

    /// Set the file name given to the result artifact.
    pub fn with_output_file_name(mut self, name: impl Into<String>) -> Self {
        self.output_file_name = name.into();
        self
    }

    /// Clips in export order.
    pub fn clips(&self) -> &[ExportClip] {
        &self.clips
    }

    /// Cleanup failures from the last run.
    pub fn cleanup_failures(&self) -> &[CleanupError] {
        &self.cleanup_failures
    }

    /// Run every step, then clean up. Progress is zero before and after.
    pub async fn run<E: EncodeEngine>(
        &mut self,
        engine: &mut E,
        progress: &ExportProgress,
    ) -> EngineResult<ExportArtifact> {
        progress.reset();
        info!(clips = self.clips.len(), "Export started");

        let result = self.execute_steps(engine, progress).await;
        match &result {
            Ok(artifact) => info!(bytes = artifact.len(), "Export finished"),
            Err(e) => warn!(error = %e, "Export failed"),
        }

        self.cleanup(engine).await;
        progress.reset();
        result
    }

    async fn execute_steps<E: EncodeEngine>(
        &mut self,
        engine: &mut E,
        progress: &ExportProgress,
    ) -> EngineResult<ExportArtifact> {
        let count = self.clips.len();
        let mut parts = Vec::with_capacity(count);

        for index in 0..count {
            let clip = self.clips[index].clone();

            progress.set_stage(ExportStage::Ingesting { index, count });
            let original = source_artifact_name(index);
            let bytes = clip
                .source
                .read_bytes()
                .await
                .map_err(|e| EngineError::Ingest {
                    name: clip.name.clone(),
                    reason: e.to_string(),
                })?;
            engine.ingest(&original, bytes).await?;
            self.created.push(original.clone());
            debug!(index, artifact = %original, "Ingested clip");

            if clip.needs_trim() {
                progress.set_stage(ExportStage::Trimming {
                    name: clip.name.clone(),
                });
                let op = EngineOp::Trim {
                    input: original,
                    range: clip.trim,
                    output: trimmed_artifact_name(index),
                };
                self.run_op(engine, &op).await?;
                parts.push(op.output().to_string());
            } else {
                parts.push(original);
            }
        }

        progress.set_stage(ExportStage::Concatenating);
        engine
            .ingest(MANIFEST_NAME, concat_manifest(&parts).into_bytes())
            .await?;
        self.created.push(MANIFEST_NAME.to_string());

        let op = EngineOp::Concat {
            manifest: MANIFEST_NAME.to_string(),
            output: OUTPUT_NAME.to_string(),
        };
        self.run_op(engine, &op).await?;

        progress.set_stage(ExportStage::Collecting);
        let bytes = engine.read_artifact(OUTPUT_NAME).await?;
        Ok(ExportArtifact {
            file_name: self.output_file_name.clone(),
            bytes,
        })
    }

    async fn run_op<E: EncodeEngine>(&mut self, engine: &mut E, op: &EngineOp) -> EngineResult<()> {
        debug!(%op, "Running engine operation");
        let result = engine.execute(op).await;
        // A failed operation may still leave a partial output behind.
        self.created.push(op.output().to_string());
        result
    }

    /// Best-effort removal of everything this job created.
    async fn cleanup<E: EncodeEngine>(&mut self, engine: &mut E) {
        self.cleanup_failures.clear();
        for artifact in std::mem::take(&mut self.created) {
            if let Err(e) = engine.delete_artifact(&artifact).await {
                let failure = CleanupError {
                    artifact,
                    reason: e.to_string(),
                };
                warn!(error = %failure, "Cleanup failed");
                self.cleanup_failures.push(failure);
            }
        }
    }
}

//! Encode engine backed by an FFmpeg sidecar process.
//!
//! Artifacts live as files in a private temporary directory that is removed
//! when the engine is dropped. Each operation spawns FFmpeg inside that
//! directory through `ffmpeg-sidecar` and parses its progress output.

use ffmpeg_sidecar::command::{ffmpeg_is_installed, FfmpegCommand};
use ffmpeg_sidecar::event::{FfmpegEvent, LogLevel};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::engine::{check_artifact_name, EncodeEngine, EngineLoader, EngineOp};
use crate::error::{EngineError, EngineResult};
use crate::progress::ProgressSink;

/// Creates [`SidecarEngine`]s.
#[derive(Debug, Clone, Default)]
pub struct SidecarLoader {
    /// Parent of the engine's scratch directory (system temp if `None`).
    pub work_root: Option<PathBuf>,
    /// Download an FFmpeg build if none is installed.
    pub auto_download: bool,
}

impl SidecarLoader {
    /// Loader that places scratch space under `work_root`.
    pub fn new(work_root: Option<PathBuf>) -> Self {
        Self {
            work_root,
            auto_download: false,
        }
    }

    /// Allow downloading FFmpeg on first load.
    pub fn with_auto_download(mut self, enabled: bool) -> Self {
        self.auto_download = enabled;
        self
    }
}

impl EngineLoader for SidecarLoader {
    type Engine = SidecarEngine;

    async fn load(&self, progress: ProgressSink) -> EngineResult<SidecarEngine> {
        let work_root = self.work_root.clone();
        let auto_download = self.auto_download;
        tokio::task::spawn_blocking(move || {
            if !ffmpeg_is_installed() {
                if !auto_download {
                    return Err(EngineError::Load("FFmpeg is not installed".into()));
                }
                info!("FFmpeg not found, downloading");
                ffmpeg_sidecar::download::auto_download()
                    .map_err(|e| EngineError::Load(format!("FFmpeg download failed: {e}")))?;
            }
            let builder = {
                let mut builder = tempfile::Builder::new();
                builder.prefix("montage-engine-");
                builder
            };
            let dir = match &work_root {
                Some(root) => builder.tempdir_in(root)?,
                None => builder.tempdir()?,
            };
            info!(dir = %dir.path().display(), "Encode engine loaded");
            Ok(SidecarEngine { dir, progress })
        })
        .await
        .map_err(|e| EngineError::Load(e.to_string()))?
    }
}

/// FFmpeg-backed engine working inside a private scratch directory.
pub struct SidecarEngine {
    dir: TempDir,
    progress: ProgressSink,
}

impl SidecarEngine {
    /// Scratch directory holding the artifacts.
    pub fn work_dir(&self) -> &Path {
        self.dir.path()
    }

    fn artifact_path(&self, name: &str) -> EngineResult<PathBuf> {
        check_artifact_name(name)?;
        Ok(self.dir.path().join(name))
    }
}

impl EncodeEngine for SidecarEngine {
    async fn ingest(&mut self, name: &str, bytes: Vec<u8>) -> EngineResult<()> {
        let path = self.artifact_path(name)?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| EngineError::Ingest {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        debug!(artifact = name, "Ingested artifact");
        Ok(())
    }

    async fn execute(&mut self, op: &EngineOp) -> EngineResult<()> {
        self.artifact_path(op.output())?;
        let dir = self.dir.path().to_path_buf();
        let args = op.ffmpeg_args();
        let label = op.label();
        let sink = self.progress.clone();
        tokio::task::spawn_blocking(move || run_ffmpeg(&dir, &args, label, &sink))
            .await
            .map_err(|e| EngineError::Execute {
                op: label.into(),
                reason: e.to_string(),
            })?
    }

    async fn read_artifact(&mut self, name: &str) -> EngineResult<Vec<u8>> {
        let path = self.artifact_path(name)?;
        tokio::fs::read(&path).await.map_err(|e| EngineError::Read {
            name: name.to_string(),
            reason: e.to_string(),
        })
    }

    async fn delete_artifact(&mut self, name: &str) -> EngineResult<()> {
        let path = self.artifact_path(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(EngineError::Delete {
                name: name.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

/// Run FFmpeg to completion, forwarding progress as a fraction of the input
/// duration FFmpeg reports.
fn run_ffmpeg(dir: &Path, args: &[String], label: &str, sink: &ProgressSink) -> EngineResult<()> {
    let execute_err = |reason: String| EngineError::Execute {
        op: label.into(),
        reason,
    };

    let mut command = FfmpegCommand::new();
    command.as_inner_mut().current_dir(dir);
    command.overwrite().args(args);

    let mut child = command.spawn().map_err(|e| execute_err(e.to_string()))?;
    let events = child.iter().map_err(|e| execute_err(e.to_string()))?;

    let mut total = 0.0;
    let mut last_error = None;
    for event in events {
        match event {
            FfmpegEvent::ParsedDuration(duration) => total += duration.duration,
            FfmpegEvent::Progress(progress) => {
                if let Some(elapsed) = parse_progress_time(&progress.time) {
                    if total > 0.0 {
                        sink.report(elapsed / total);
                    }
                }
            }
            FfmpegEvent::Log(LogLevel::Error | LogLevel::Fatal, message)
            | FfmpegEvent::Error(message) => {
                warn!(op = label, %message, "FFmpeg error");
                last_error = Some(message);
            }
            _ => {}
        }
    }

    let status = child.wait()?;
    if !status.success() {
        return Err(execute_err(
            last_error.unwrap_or_else(|| format!("FFmpeg exited with status: {status}")),
        ));
    }
    sink.report(1.0);
    Ok(())
}

/// Parse FFmpeg's `HH:MM:SS.ss` progress timestamps.
fn parse_progress_time(time: &str) -> Option<f64> {
    let mut parts = time.trim().split(':');
    let hours: f64 = parts.next()?.parse().ok()?;
    let minutes: f64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

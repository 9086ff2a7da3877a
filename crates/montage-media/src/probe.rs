//! Media probing to get the duration of a source without decoding it.

use montage_core::{DecodeError, SourceHandle};
use serde::Deserialize;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Resolves the total duration of a source, in seconds.
pub trait DurationProber: Send + Sync {
    /// Probe `source`. Fails if the duration is unreadable, non-finite or not positive.
    fn probe(&self, source: &SourceHandle) -> impl Future<Output = Result<f64, DecodeError>> + Send;
}

/// The `format` section of `ffprobe -print_format json -show_format`.
#[derive(Debug, Clone, Deserialize)]
pub struct FormatInfo {
    /// Container format, e.g. `mov,mp4,m4a,3gp,3g2,mj2`.
    #[serde(default)]
    pub format_name: Option<String>,
    /// Duration in seconds, as printed by ffprobe.
    #[serde(default)]
    pub duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    format: FormatInfo,
}

impl FormatInfo {
    /// Parse ffprobe's JSON output.
    pub fn from_ffprobe_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<ProbeOutput>(json).map(|output| output.format)
    }

    /// Duration in seconds, if present, finite and positive.
    pub fn duration_seconds(&self) -> Option<f64> {
        self.duration
            .as_deref()
            .and_then(|d| d.trim().parse::<f64>().ok())
            .filter(|d| d.is_finite() && *d > 0.0)
    }
}

/// Prober that runs `ffprobe`.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    ffprobe: PathBuf,
}

impl FfprobeProber {
    /// Use a specific ffprobe binary.
    pub fn new(ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffprobe: ffprobe.into(),
        }
    }

    /// Find ffprobe next to the sidecar's FFmpeg binary, else on `PATH`.
    pub fn locate() -> Self {
        let name = if cfg!(windows) { "ffprobe.exe" } else { "ffprobe" };
        let sibling = ffmpeg_sidecar::paths::ffmpeg_path().with_file_name(name);
        let ffprobe = if sibling.is_file() {
            sibling
        } else {
            which::which(name).unwrap_or_else(|_| PathBuf::from(name))
        };
        info!(ffprobe = %ffprobe.display(), "Using ffprobe");
        Self { ffprobe }
    }

    /// Path of the ffprobe binary in use.
    pub fn binary(&self) -> &Path {
        &self.ffprobe
    }

    fn probe_file(ffprobe: &Path, path: &Path, name: &str) -> Result<f64, DecodeError> {
        let output = Command::new(ffprobe)
            .args(["-v", "error", "-print_format", "json", "-show_format"])
            .arg(path)
            .output()
            .map_err(|e| DecodeError::Duration {
                name: name.to_string(),
                reason: format!("failed to run ffprobe: {e}"),
            })?;

        if !output.status.success() {
            return Err(DecodeError::Duration {
                name: name.to_string(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let json = String::from_utf8_lossy(&output.stdout);
        let info = FormatInfo::from_ffprobe_json(&json).map_err(|e| DecodeError::Duration {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        let duration = info.duration_seconds().ok_or_else(|| DecodeError::Duration {
            name: name.to_string(),
            reason: "no finite duration".into(),
        })?;
        debug!(source = name, duration, format = ?info.format_name, "Probed source");
        Ok(duration)
    }
}

impl DurationProber for FfprobeProber {
    async fn probe(&self, source: &SourceHandle) -> Result<f64, DecodeError> {
        let ffprobe = self.ffprobe.clone();
        let name = source.name().to_string();

        if let Some(path) = source.path() {
            let path = path.to_path_buf();
            return tokio::task::spawn_blocking(move || Self::probe_file(&ffprobe, &path, &name))
                .await
                .map_err(|e| DecodeError::Duration {
                    name: source.name().to_string(),
                    reason: e.to_string(),
                })?;
        }

        // In-memory sources are spilled to a temporary file for ffprobe.
        let bytes = source
            .view()
            .read_bytes()
            .await
            .map_err(|e| DecodeError::Unreadable {
                name: name.clone(),
                reason: e.to_string(),
            })?;
        tokio::task::spawn_blocking(move || {
            let unreadable = |e: std::io::Error| DecodeError::Unreadable {
                name: name.clone(),
                reason: e.to_string(),
            };
            let suffix = Path::new(&name)
                .extension()
                .map(|ext| format!(".{}", ext.to_string_lossy()))
                .unwrap_or_default();
            let mut file = tempfile::Builder::new()
                .prefix("montage-probe-")
                .suffix(&suffix)
                .tempfile()
                .map_err(unreadable)?;
            std::io::Write::write_all(&mut file, &bytes).map_err(unreadable)?;
            Self::probe_file(&ffprobe, file.path(), &name)
        })
        .await
        .map_err(|e| DecodeError::Duration {
            name: source.name().to_string(),
            reason: e.to_string(),
        })?
    }
}

//! Encode engine interface.
//!
//! An engine is a sandbox of named artifacts plus the ability to run
//! stream-copy trim and concat operations over them. Operations are awaited
//! one at a time; later operations refer to earlier outputs by name.

use montage_core::{format_timecode, TrimRange};
use std::fmt;
use std::future::Future;

use crate::error::{EngineError, EngineResult};
use crate::progress::ProgressSink;

/// An operation the engine runs over its artifacts. Both kinds copy streams
/// without re-encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineOp {
    /// Cut `input` down to `range` into `output`.
    Trim {
        input: String,
        range: TrimRange,
        output: String,
    },
    /// Join the files listed in the `manifest` artifact into `output`.
    Concat { manifest: String, output: String },
}

impl EngineOp {
    /// Name of the artifact this operation produces.
    pub fn output(&self) -> &str {
        match self {
            Self::Trim { output, .. } | Self::Concat { output, .. } => output,
        }
    }

    /// Short label for logs and errors.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Trim { .. } => "trim",
            Self::Concat { .. } => "concat",
        }
    }

    /// FFmpeg arguments for this operation, relative to the engine's sandbox.
    pub fn ffmpeg_args(&self) -> Vec<String> {
        match self {
            Self::Trim {
                input,
                range,
                output,
            } => vec![
                "-i".into(),
                input.clone(),
                "-ss".into(),
                format_timecode(range.start),
                "-to".into(),
                format_timecode(range.end),
                "-c".into(),
                "copy".into(),
                output.clone(),
            ],
            Self::Concat { manifest, output } => vec![
                "-f".into(),
                "concat".into(),
                "-safe".into(),
                "0".into(),
                "-i".into(),
                manifest.clone(),
                "-c".into(),
                "copy".into(),
                output.clone(),
            ],
        }
    }
}

impl fmt::Display for EngineOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trim {
                input,
                range,
                output,
            } => write!(f, "trim {input} [{range}] -> {output}"),
            Self::Concat { manifest, output } => write!(f, "concat {manifest} -> {output}"),
        }
    }
}

/// Build a concat-demuxer manifest listing `files` in order.
pub fn concat_manifest<S: AsRef<str>>(files: &[S]) -> String {
    files
        .iter()
        .map(|file| format!("file '{}'", file.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse a manifest produced by [`concat_manifest`] back into file names.
pub fn parse_manifest(manifest: &str) -> Vec<String> {
    manifest
        .lines()
        .filter_map(|line| {
            line.trim()
                .strip_prefix("file '")
                .and_then(|rest| rest.strip_suffix('\''))
                .map(str::to_string)
        })
        .collect()
}

/// Artifact names are bare file names: no separators, no parent references.
pub fn check_artifact_name(name: &str) -> EngineResult<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || name.contains('\0');
    if invalid {
        return Err(EngineError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// A sandboxed engine holding named artifacts.
pub trait EncodeEngine: Send {
    /// Store `bytes` under `name`, replacing any previous artifact.
    fn ingest(&mut self, name: &str, bytes: Vec<u8>) -> impl Future<Output = EngineResult<()>> + Send;

    /// Run one operation to completion.
    fn execute(&mut self, op: &EngineOp) -> impl Future<Output = EngineResult<()>> + Send;

    /// Read an artifact's bytes.
    fn read_artifact(&mut self, name: &str) -> impl Future<Output = EngineResult<Vec<u8>>> + Send;

    /// Delete an artifact.
    fn delete_artifact(&mut self, name: &str) -> impl Future<Output = EngineResult<()>> + Send;
}

/// Creates an engine. Called at most once per export service.
pub trait EngineLoader: Send + Sync {
    /// Engine type produced by this loader.
    type Engine: EncodeEngine;

    /// Create and initialise the engine. `progress` receives fractional
    /// progress for every operation the engine runs from then on.
    fn load(&self, progress: ProgressSink) -> impl Future<Output = EngineResult<Self::Engine>> + Send;
}

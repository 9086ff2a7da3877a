//! Montage Media - probing and export through FFmpeg
//!
//! This crate handles:
//! - Duration probing of imported sources (ffprobe)
//! - The encode engine interface and its FFmpeg sidecar implementation
//! - The export pipeline: ingest, trim, concat, collect, clean up
//! - The session-scoped export service (lazy engine, one job at a time)

pub mod engine;
pub mod error;
pub mod export;
pub mod probe;
pub mod progress;
pub mod service;
pub mod sidecar;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use engine::{EncodeEngine, EngineLoader, EngineOp};
pub use error::{CleanupError, EngineError, EngineResult, ExportError};
pub use export::{ExportArtifact, ExportClip, ExportJob};
pub use probe::{DurationProber, FfprobeProber};
pub use progress::{ExportProgress, ExportStage, ProgressSink};
pub use service::ExportService;
pub use sidecar::{SidecarEngine, SidecarLoader};

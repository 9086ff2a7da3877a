//! Error types for the media subsystem.

use thiserror::Error;

/// Failure inside the encode engine. Aborts the running export.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine could not be created or its binaries are missing.
    #[error("Failed to load the encode engine: {0}")]
    Load(String),

    /// Source bytes could not be written into the engine.
    #[error("Failed to ingest {name}: {reason}")]
    Ingest { name: String, reason: String },

    /// A trim or concat operation failed.
    #[error("{op} failed: {reason}")]
    Execute { op: String, reason: String },

    /// An artifact could not be read back.
    #[error("Failed to read {name}: {reason}")]
    Read { name: String, reason: String },

    /// An artifact could not be deleted.
    #[error("Failed to delete {name}: {reason}")]
    Delete { name: String, reason: String },

    /// Artifact names must be plain file names inside the engine's sandbox.
    #[error("Invalid artifact name: {0}")]
    InvalidName(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure deleting an intermediate artifact. Logged and collected, never
/// reported as the outcome of an export.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Could not remove {artifact}: {reason}")]
pub struct CleanupError {
    pub artifact: String,
    pub reason: String,
}

/// Why an export request produced no artifact.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Another export holds the engine. The request is dropped, not queued.
    #[error("An export is already running")]
    Busy,

    /// The timeline has no clips.
    #[error("Nothing to export")]
    EmptyTimeline,

    /// The engine failed; intermediates were cleaned up.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Result type alias for engine operations.
pub type EngineResult<T> = std::result::Result<T, EngineError>;

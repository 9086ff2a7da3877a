//! User-facing status line.

use montage_media::ExportStage;
use std::fmt;

/// The single status message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StatusMessage {
    #[default]
    Empty,
    NoValidVideos,
    Analyzing,
    ClipsAdded,
    /// Some files were added, the named ones could not be read.
    ClipsPartiallyAdded { failed: Vec<String> },
    /// None of the accepted files could be read.
    ProbeFailed { failed: Vec<String> },
    AddClipsBeforePreview,
    PreviewPlaying,
    AddClipsBeforeExport,
    ExportBusy,
    PreparingExport,
    Exporting(ExportStage),
    ExportDone,
    ExportFailed,
}

impl StatusMessage {
    /// True for messages reporting a failure.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::NoValidVideos
                | Self::ProbeFailed { .. }
                | Self::ClipsPartiallyAdded { .. }
                | Self::ExportFailed
        )
    }
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::NoValidVideos => f.write_str("No valid video files were found."),
            Self::Analyzing => f.write_str("Analyzing the uploaded files..."),
            Self::ClipsAdded => f.write_str("Clips added successfully."),
            Self::ClipsPartiallyAdded { failed } => {
                write!(f, "Clips added. Could not read: {}.", failed.join(", "))
            }
            Self::ProbeFailed { failed } => {
                write!(f, "Could not read: {}.", failed.join(", "))
            }
            Self::AddClipsBeforePreview => f.write_str("Add clips before previewing."),
            Self::PreviewPlaying => f.write_str("Preview is playing."),
            Self::AddClipsBeforeExport => f.write_str("Add clips before exporting."),
            Self::ExportBusy => f.write_str("An export is already running."),
            Self::PreparingExport | Self::Exporting(ExportStage::Idle) => {
                f.write_str("Preparing the export...")
            }
            Self::Exporting(stage) => f.write_str(&stage.display_name()),
            Self::ExportDone => f.write_str("The final video is ready. You can save it now."),
            Self::ExportFailed => f.write_str("An error occurred during export. Please try again."),
        }
    }
}

//! Media source handles.
//!
//! A [`SourceHandle`] owns the reference to a clip's media bytes. It is not
//! `Clone`: exactly one timeline entry owns it, and dropping that entry
//! releases the source. Export jobs read through a [`SourceView`], a shared
//! read-only view that keeps the bytes alive until the job has ingested them.

use crate::error::ValidationError;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Extensions accepted as video, with their MIME types.
const VIDEO_EXTENSIONS: &[(&str, &str)] = &[
    ("mp4", "video/mp4"),
    ("m4v", "video/x-m4v"),
    ("mov", "video/quicktime"),
    ("mkv", "video/x-matroska"),
    ("webm", "video/webm"),
    ("avi", "video/x-msvideo"),
    ("mpg", "video/mpeg"),
    ("mpeg", "video/mpeg"),
    ("ts", "video/mp2t"),
    ("3gp", "video/3gpp"),
];

enum MediaData {
    File(PathBuf),
    Memory(Arc<[u8]>),
}

/// Owning reference to a clip's media.
pub struct SourceHandle {
    name: String,
    data: Arc<MediaData>,
}

impl SourceHandle {
    /// Reference a file on disk. The file is not read until needed.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self {
            name,
            data: Arc::new(MediaData::File(path)),
        }
    }

    /// Wrap bytes already held in memory.
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            data: Arc::new(MediaData::Memory(bytes.into())),
        }
    }

    /// Original file name of the source.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path on disk, if the source is file-backed.
    pub fn path(&self) -> Option<&Path> {
        match self.data.as_ref() {
            MediaData::File(path) => Some(path),
            MediaData::Memory(_) => None,
        }
    }

    /// Shared read-only view for consumers that outlive a borrow (export jobs).
    pub fn view(&self) -> SourceView {
        SourceView {
            name: self.name.clone(),
            data: Arc::clone(&self.data),
        }
    }
}

impl Drop for SourceHandle {
    fn drop(&mut self) {
        debug!(source = %self.name, "Released media source");
    }
}

impl fmt::Debug for SourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceHandle")
            .field("name", &self.name)
            .field("path", &self.path())
            .finish()
    }
}

/// Read-only view of a source's bytes.
#[derive(Clone)]
pub struct SourceView {
    name: String,
    data: Arc<MediaData>,
}

impl SourceView {
    /// Original file name of the source.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path on disk, if the source is file-backed.
    pub fn path(&self) -> Option<&Path> {
        match self.data.as_ref() {
            MediaData::File(path) => Some(path),
            MediaData::Memory(_) => None,
        }
    }

    /// Read the whole source into memory.
    pub async fn read_bytes(&self) -> std::io::Result<Vec<u8>> {
        match self.data.as_ref() {
            MediaData::File(path) => tokio::fs::read(path).await,
            MediaData::Memory(bytes) => Ok(bytes.to_vec()),
        }
    }
}

impl fmt::Debug for SourceView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceView").field("name", &self.name).finish()
    }
}

/// Broad media category, decided from MIME type or extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Audio,
    Image,
    Other,
}

impl MediaKind {
    /// Classify a MIME type such as `video/mp4`.
    pub fn from_mime(mime: &str) -> Self {
        match mime.split('/').next().unwrap_or_default() {
            "video" => Self::Video,
            "audio" => Self::Audio,
            "image" => Self::Image,
            _ => Self::Other,
        }
    }

    /// Classify by file extension.
    pub fn from_path(path: &Path) -> Self {
        mime_for_path(path)
            .map(Self::from_mime)
            .unwrap_or(Self::Other)
    }
}

/// MIME type guessed from a video file extension.
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    VIDEO_EXTENSIONS
        .iter()
        .find(|(candidate, _)| *candidate == ext)
        .map(|(_, mime)| *mime)
}

/// File extensions recognised as video, for file pickers.
pub fn video_extensions() -> Vec<&'static str> {
    VIDEO_EXTENSIONS.iter().map(|(ext, _)| *ext).collect()
}

/// A file offered for import, before it is probed.
#[derive(Debug)]
pub struct MediaFile {
    /// MIME type reported by the picker, or guessed from the extension.
    pub mime: Option<String>,
    /// The source itself.
    pub source: SourceHandle,
}

impl MediaFile {
    /// A file on disk, with its MIME type guessed from the extension.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mime = mime_for_path(&path).map(str::to_string);
        Self {
            mime,
            source: SourceHandle::from_path(path),
        }
    }

    /// Bytes with an explicit MIME type.
    pub fn from_bytes(
        name: impl Into<String>,
        mime: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            mime: Some(mime.into()),
            source: SourceHandle::from_bytes(name, bytes),
        }
    }

    /// File name shown to the user.
    pub fn name(&self) -> &str {
        self.source.name()
    }

    /// Media category of this file.
    pub fn kind(&self) -> MediaKind {
        match &self.mime {
            Some(mime) => MediaKind::from_mime(mime),
            None => self
                .source
                .path()
                .map(MediaKind::from_path)
                .unwrap_or(MediaKind::Other),
        }
    }

    /// Accept only video files.
    pub fn into_video_source(self) -> Result<SourceHandle, ValidationError> {
        if self.kind() == MediaKind::Video {
            Ok(self.source)
        } else {
            Err(ValidationError::NotVideo {
                name: self.source.name().to_string(),
            })
        }
    }
}

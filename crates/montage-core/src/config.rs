//! Editor configuration.
//!
//! The minimum clip length and the preview boundary guard band depend on how
//! often the playback surface reports its position, so they are configurable
//! rather than baked into the timeline and scheduler.

use crate::defaults;
use crate::error::{Result, ValidationError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Environment variable naming an alternative configuration file.
pub const CONFIG_ENV_VAR: &str = "MONTAGE_CONFIG";

/// Configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "montage.json";

/// Tunables shared by the timeline, preview scheduler and export pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MontageConfig {
    /// Shortest allowed trimmed clip, in seconds.
    pub min_clip_length: f64,
    /// Preview advances when the position reaches `trim_end - boundary_guard`.
    pub boundary_guard: f64,
    /// File name offered for the exported montage.
    pub output_file_name: String,
    /// Parent directory for the encode engine's scratch space (system temp if unset).
    pub work_dir: Option<PathBuf>,
    /// Interval between position reports of the app's playback surface.
    pub time_update_interval_ms: u64,
}

impl Default for MontageConfig {
    fn default() -> Self {
        Self {
            min_clip_length: defaults::MIN_CLIP_LENGTH,
            boundary_guard: defaults::BOUNDARY_GUARD,
            output_file_name: defaults::OUTPUT_FILE_NAME.to_string(),
            work_dir: None,
            time_update_interval_ms: defaults::TIME_UPDATE_INTERVAL_MS,
        }
    }
}

impl MontageConfig {
    /// Parse a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&text)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Load from `$MONTAGE_CONFIG`, else `./montage.json`, else defaults.
    pub fn discover() -> Result<Self> {
        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
            return Self::load(PathBuf::from(path));
        }
        let local = Path::new(CONFIG_FILE_NAME);
        if local.exists() {
            return Self::load(local);
        }
        Ok(Self::default())
    }

    /// Reject values that would make the trim invariant unsatisfiable.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        if !self.min_clip_length.is_finite() || self.min_clip_length <= 0.0 {
            return Err(ValidationError::Config(format!(
                "min_clip_length must be positive, got {}",
                self.min_clip_length
            )));
        }
        if !self.boundary_guard.is_finite() || self.boundary_guard < 0.0 {
            return Err(ValidationError::Config(format!(
                "boundary_guard must be non-negative, got {}",
                self.boundary_guard
            )));
        }
        if self.boundary_guard >= self.min_clip_length {
            return Err(ValidationError::Config(format!(
                "boundary_guard ({}) must be smaller than min_clip_length ({})",
                self.boundary_guard, self.min_clip_length
            )));
        }
        if self.output_file_name.trim().is_empty() {
            return Err(ValidationError::Config(
                "output_file_name must not be empty".into(),
            ));
        }
        if self.time_update_interval_ms == 0 {
            return Err(ValidationError::Config(
                "time_update_interval_ms must be positive".into(),
            ));
        }
        Ok(())
    }
}

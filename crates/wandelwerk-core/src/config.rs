// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{EngineError, Result};
use crate::types::{Canvas, CompressionPreset};

/// Environment variable overriding [`EngineConfig::ffmpeg_path`].
pub const ENV_FFMPEG: &str = "WANDELWERK_FFMPEG";
/// Environment variable overriding [`EngineConfig::transcode_timeout_secs`].
pub const ENV_TIMEOUT_SECS: &str = "WANDELWERK_TIMEOUT_SECS";

/// Settings shared by every engine operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Path (or bare name resolved via `PATH`) of the external transcoder.
    pub ffmpeg_path: PathBuf,
    /// Wall-clock limit for a single transcoder invocation.
    pub transcode_timeout_secs: u64,
    /// Parent directory for per-job scratch directories. `None` uses the
    /// system temporary directory.
    pub temp_root: Option<PathBuf>,
    /// Target page for image pagination.
    pub canvas: Canvas,
    /// Compression preset used when the caller does not pick one.
    pub default_preset: CompressionPreset,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            transcode_timeout_secs: 600,
            temp_root: None,
            canvas: Canvas::A4,
            default_preset: CompressionPreset::Ultrafast,
        }
    }
}

impl EngineConfig {
    /// Load settings from a JSON file; absent fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        info!(path = %path.display(), "Loaded engine configuration");
        Ok(config)
    }

    /// Apply `WANDELWERK_*` environment overrides on top of the current values.
    pub fn apply_env(self) -> Result<Self> {
        self.apply_overrides(
            std::env::var(ENV_FFMPEG).ok(),
            std::env::var(ENV_TIMEOUT_SECS).ok(),
        )
    }

    fn apply_overrides(mut self, ffmpeg: Option<String>, timeout: Option<String>) -> Result<Self> {
        if let Some(path) = ffmpeg.filter(|p| !p.trim().is_empty()) {
            debug!(%path, "ffmpeg path overridden from environment");
            self.ffmpeg_path = PathBuf::from(path);
        }
        if let Some(raw) = timeout {
            self.transcode_timeout_secs = raw.trim().parse().map_err(|_| {
                EngineError::Config(format!("{ENV_TIMEOUT_SECS} must be an integer, got '{raw}'"))
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Reject settings no operation could run with.
    pub fn validate(&self) -> Result<()> {
        if self.transcode_timeout_secs == 0 {
            return Err(EngineError::Config(
                "transcode_timeout_secs must be greater than zero".into(),
            ));
        }
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(EngineError::Config(format!(
                "canvas must be non-empty, got {}x{}",
                self.canvas.width, self.canvas.height
            )));
        }
        Ok(())
    }

    pub fn transcode_timeout(&self) -> Duration {
        Duration::from_secs(self.transcode_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(&path, r#"{ "transcode_timeout_secs": 30 }"#).unwrap();

        let config = EngineConfig::from_json_file(&path).unwrap();
        assert_eq!(config.transcode_timeout(), Duration::from_secs(30));
        assert_eq!(config.ffmpeg_path, PathBuf::from("ffmpeg"));
        assert_eq!(config.canvas, Canvas::A4);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = EngineConfig {
            transcode_timeout_secs: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(EngineError::Config(_))));
    }

    #[test]
    fn overrides_replace_path_and_timeout() {
        let config = EngineConfig::default()
            .apply_overrides(Some("/opt/ffmpeg/bin/ffmpeg".into()), Some("45".into()))
            .unwrap();
        assert_eq!(config.ffmpeg_path, PathBuf::from("/opt/ffmpeg/bin/ffmpeg"));
        assert_eq!(config.transcode_timeout_secs, 45);
    }

    #[test]
    fn non_numeric_timeout_override_fails() {
        let result = EngineConfig::default().apply_overrides(None, Some("soon".into()));
        assert!(matches!(result, Err(EngineError::Config(_))));
    }
}

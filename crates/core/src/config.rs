use crate::error::{EngineError, Result};
use chrono::TimeDelta;
use folio_types::RenderOptions;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Engine configuration. Every field has a default, so a partial file (or
/// none at all) is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub preview: PreviewConfig,
    pub limits: LimitsConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Pixels per PDF point. Higher is sharper, larger and slower.
    pub scale: f32,
    /// JPEG quality, `1..=100`.
    pub quality: u8,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        let defaults = RenderOptions::default();
        Self { scale: defaults.scale, quality: defaults.quality }
    }
}

impl PreviewConfig {
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions { scale: self.scale, quality: self.quality }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Largest accepted upload (original, fragment or merge input).
    pub max_upload_bytes: usize,
    /// Most pages in an original upload or in a composed output.
    pub max_pages: usize,
    /// Most documents in one merge request.
    pub max_documents: usize,
    /// Most fragment blobs in one commit.
    pub max_fragments: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: 50 * 1024 * 1024,
            max_pages: 2000,
            max_documents: 20,
            max_fragments: 20,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Filesystem,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Root directory for the filesystem backend.
    pub path: PathBuf,
    /// Sessions older than this are retired by `purge_expired`.
    pub session_ttl_hours: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            path: std::env::temp_dir().join("folio-sessions"),
            session_ttl_hours: 24,
        }
    }
}

impl StorageConfig {
    pub fn session_ttl(&self) -> TimeDelta {
        TimeDelta::try_hours(self.session_ttl_hours.min(i64::MAX as u64) as i64)
            .unwrap_or(TimeDelta::MAX)
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        let preview = &self.preview;
        if !preview.scale.is_finite() || preview.scale <= 0.0 {
            return Err(EngineError::Config(format!(
                "preview.scale must be a positive number, got {}",
                preview.scale
            )));
        }
        if !(1..=100).contains(&preview.quality) {
            return Err(EngineError::Config(format!(
                "preview.quality must be within 1..=100, got {}",
                preview.quality
            )));
        }
        if self.limits.max_pages == 0 || self.limits.max_upload_bytes == 0 {
            return Err(EngineError::Config(
                "limits.max_pages and limits.max_upload_bytes must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        config.validate().unwrap();
        assert_eq!(config.preview.render_options(), RenderOptions::default());
        assert_eq!(config.storage.session_ttl(), TimeDelta::hours(24));
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: EngineConfig = serde_json::from_str(
            r#"{ "preview": { "quality": 95 }, "storage": { "backend": "filesystem" } }"#,
        )
        .unwrap();
        assert_eq!(config.preview.quality, 95);
        assert_eq!(config.preview.scale, 1.5);
        assert_eq!(config.storage.backend, StorageBackend::Filesystem);
        assert_eq!(config.limits, LimitsConfig::default());
    }

    #[test]
    fn test_validate_rejects_bad_preview_settings() {
        let mut config = EngineConfig::default();
        config.preview.quality = 0;
        assert!(matches!(config.validate(), Err(EngineError::Config(_))));

        let mut config = EngineConfig::default();
        config.preview.scale = f32::NAN;
        assert!(matches!(config.validate(), Err(EngineError::Config(_))));
    }

    #[test]
    fn test_huge_ttl_saturates() {
        let storage = StorageConfig { session_ttl_hours: u64::MAX, ..StorageConfig::default() };
        assert_eq!(storage.session_ttl(), TimeDelta::MAX);
    }
}

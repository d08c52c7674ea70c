//! Loading `EngineConfig` from a file and the environment.
//!
//! Sources, lowest precedence first:
//! 1. Built-in defaults
//! 2. The file passed explicitly, or else the one named by `FOLIO_CONFIG`
//! 3. `FOLIO__`-prefixed environment variables, e.g.
//!    `FOLIO__PREVIEW__QUALITY=90` or `FOLIO__STORAGE__BACKEND=filesystem`

use folio_core::{EngineConfig, EngineError};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "FOLIO_CONFIG";

/// Prefix for per-field environment overrides.
pub const ENV_PREFIX: &str = "FOLIO";

#[derive(Error, Debug)]
pub enum ConfigLoadError {
    #[error("Configuration file {0} does not exist")]
    Missing(PathBuf),

    #[error("Failed to read configuration: {0}")]
    Source(#[from] config::ConfigError),

    #[error(transparent)]
    Invalid(#[from] EngineError),
}

/// Loads and validates the engine configuration.
pub fn load_config(explicit: Option<&Path>) -> Result<EngineConfig, ConfigLoadError> {
    let mut builder = config::Config::builder();

    let file = explicit.map(Path::to_path_buf).or_else(|| {
        std::env::var_os(CONFIG_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
    });
    if let Some(path) = file {
        if !path.exists() {
            return Err(ConfigLoadError::Missing(path));
        }
        log::debug!("Loading configuration from {}", path.display());
        builder = builder.add_source(config::File::from(path.as_path()));
    }

    // Always layer environment variables on top
    builder = builder.add_source(
        config::Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true),
    );

    let config: EngineConfig = builder.build()?.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::StorageBackend;

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("folio.toml");
        std::fs::write(
            &path,
            "[preview]\nquality = 95\n\n[storage]\nbackend = \"filesystem\"\nsession_ttl_hours = 2\n",
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.preview.quality, 95);
        assert_eq!(config.preview.scale, 1.5);
        assert_eq!(config.storage.backend, StorageBackend::Filesystem);
        assert_eq!(config.storage.session_ttl_hours, 2);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, ConfigLoadError::Missing(_)));
    }

    #[test]
    fn test_invalid_values_are_rejected_after_loading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("folio.toml");
        std::fs::write(&path, "[preview]\nquality = 0\n").unwrap();

        let err = load_config(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigLoadError::Invalid(EngineError::Config(_))));
    }
}

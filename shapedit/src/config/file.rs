//! Loading and saving `~/.shapedit/config.ini`.

use ini::Ini;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use super::settings::ConfigFile;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

impl ConfigFile {
    /// Loads from the default path, falling back to defaults when the file
    /// does not exist.
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Loads from a specific path; a missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }
        let content = super::writer::to_config_string(self);
        std::fs::write(path, content).map_err(|e| ConfigFileError::WriteError(e.to_string()))?;
        info!(path = %path.display(), "Config file written");
        Ok(())
    }

    /// Writes the defaults to `path` unless a file is already there.
    ///
    /// Returns true when a new file was created.
    pub fn ensure_exists_at(path: &Path) -> Result<bool, ConfigFileError> {
        if path.exists() {
            return Ok(false);
        }
        Self::default().save_to(path)?;
        Ok(true)
    }
}

/// The config directory (`~/.shapedit`).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".shapedit")
}

/// The config file (`~/.shapedit/config.ini`).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderKind;
    use tempfile::TempDir;

    #[test]
    fn test_load_nonexistent_returns_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = ConfigFile::load_from(&temp_dir.path().join("missing.ini")).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_default_paths() {
        assert!(config_directory().ends_with(".shapedit"));
        assert!(config_file_path().ends_with(".shapedit/config.ini"));
    }

    #[test]
    fn test_ensure_exists_does_not_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.ini");

        assert!(ConfigFile::ensure_exists_at(&path).unwrap());
        std::fs::write(&path, "[basemap]\nprovider = osm\n").unwrap();
        assert!(!ConfigFile::ensure_exists_at(&path).unwrap());

        let config = ConfigFile::load_from(&path).unwrap();
        assert_eq!(config.basemap.provider, ProviderKind::Osm);
    }

    #[test]
    fn test_unparseable_file_is_read_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.ini");
        std::fs::write(&path, "[basemap\nprovider = osm\n").unwrap();
        assert!(matches!(
            ConfigFile::load_from(&path),
            Err(ConfigFileError::ReadError(_))
        ));
    }
}

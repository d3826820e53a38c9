use crate::config::schema::{Settings, ValidationError};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read settings from {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("failed to parse settings ({path}): {source}")]
    Toml {
        path: PathBuf,
        source: toml_edit::de::Error,
    },

    #[error("invalid settings ({path}): {source}")]
    Validation {
        path: PathBuf,
        source: ValidationError,
    },
}

/// Read, parse and validate the settings file at `path`.
pub fn load_from_path(path: &Path) -> Result<Settings, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let settings: Settings =
        toml_edit::de::from_str(&contents).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
    settings
        .validate()
        .map_err(|source| ConfigError::Validation {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(settings)
}

/// `~/.config/acme-fmt/config.toml`, if a home directory is known.
pub fn default_path() -> Option<PathBuf> {
    home::home_dir().map(|home| home.join(".config").join("acme-fmt").join("config.toml"))
}

/// Resolve settings.
///
/// An explicit path must exist. Without one, the default path is used when
/// present, otherwise built-in defaults apply.
pub fn load(explicit: Option<&Path>) -> Result<Settings, ConfigError> {
    if let Some(path) = explicit {
        return load_from_path(path);
    }
    match default_path() {
        Some(path) if path.is_file() => {
            log::debug!("loading settings from {}", path.display());
            load_from_path(&path)
        }
        _ => Ok(Settings::default()),
    }
}

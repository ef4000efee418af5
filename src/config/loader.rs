// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ExecerConfig, RawExecerConfig};
use crate::errors::{ExecError, Result};

/// Load a configuration file from a given path and return the raw
/// `RawExecerConfig`.
///
/// This only performs TOML deserialization; use [`load_and_validate`] to get
/// checked settings.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawExecerConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .map_err(|e| ExecError::Config(format!("reading {}: {}", path.display(), e)))?;

    let config: RawExecerConfig = toml::from_str(&contents)
        .map_err(|e| ExecError::Config(format!("parsing {}: {}", path.display(), e)))?;

    Ok(config)
}

/// Load a configuration file from path and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ExecerConfig> {
    let raw_config = load_from_path(&path)?;
    ExecerConfig::try_from(raw_config)
}

/// Like [`load_and_validate`], but a missing file yields the defaults.
///
/// Used for the implicit default path; an explicitly requested file should go
/// through [`load_and_validate`] so that a typo is reported.
pub fn load_or_default(path: impl AsRef<Path>) -> Result<ExecerConfig> {
    let path = path.as_ref();
    if !path.exists() {
        debug!(path = %path.display(), "no config file; using defaults");
        return Ok(ExecerConfig::default());
    }
    load_and_validate(path)
}

/// `Execer.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Execer.toml")
}

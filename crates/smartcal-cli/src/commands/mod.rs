pub mod config;
pub mod preview;

use std::path::{Path, PathBuf};

use smartcal_core::{Config, ConfigError};

/// Load the config from `--config`, or from the default location.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let config = match path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    tracing::debug!(path = ?path, timezone = %config.preview.timezone, "config loaded");
    Ok(config)
}

/// Where `config set` and `config reset` write.
pub fn config_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    match path {
        Some(path) => Ok(path.to_path_buf()),
        None => Config::path(),
    }
}

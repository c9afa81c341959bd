// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Parse the TOML file at `path` into a [`RawConfigFile`].
///
/// Missing keys take their defaults; nothing is validated yet.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;
    debug!(?path, "loaded config file");

    Ok(config)
}

/// Parse and validate in one go.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Load the raw config the CLI asked for.
///
/// - An explicit path must exist.
/// - Without one, [`default_config_path`] is used if present; otherwise the
///   built-in defaults apply.
pub fn load_raw_or_default(explicit: Option<&Path>) -> Result<RawConfigFile> {
    match explicit {
        Some(path) => load_from_path(path),
        None => {
            let default = default_config_path();
            if default.is_file() {
                load_from_path(default)
            } else {
                debug!("no config file found; using built-in defaults");
                Ok(RawConfigFile::default())
            }
        }
    }
}

/// `maildirlearn.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("maildirlearn.toml")
}

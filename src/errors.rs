// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::classify::ClassifyError;
use crate::watch::WatchError;

#[derive(Error, Debug)]
pub enum LearnError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Invalid pattern: {0}")]
    PatternError(#[from] regex::Error),

    #[error(transparent)]
    Watch(#[from] WatchError),

    #[error(transparent)]
    Classify(#[from] ClassifyError),
}

pub type Result<T> = std::result::Result<T, LearnError>;

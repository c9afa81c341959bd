#![allow(dead_code)]

use std::path::PathBuf;

use maildirlearn::config::{ConfigFile, RawConfigFile};
use maildirlearn::engine::PathRules;
use maildirlearn::watch::WatchSettings;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.watch.root = root.into();
        self
    }

    pub fn max_path_len(mut self, len: usize) -> Self {
        self.config.watch.max_path_len = len;
        self
    }

    pub fn read_buffer_size(mut self, len: usize) -> Self {
        self.config.watch.read_buffer_size = len;
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.config.rules.exclude = pattern.to_string();
        self
    }

    pub fn spam(mut self, pattern: &str) -> Self {
        self.config.rules.spam = pattern.to_string();
        self
    }

    pub fn program(mut self, program: &str) -> Self {
        self.config.classifier.program = program.to_string();
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Settings for a manager rooted at `root` with default limits.
pub fn settings(root: impl Into<PathBuf>) -> WatchSettings {
    ConfigFileBuilder::new().root(root).build().watch_settings()
}

/// Rules with the default patterns.
pub fn default_rules() -> PathRules {
    PathRules::from_config(&ConfigFileBuilder::new().build()).expect("default rules compile")
}

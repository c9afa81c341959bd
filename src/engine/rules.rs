// src/engine/rules.rs

use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use regex::bytes::Regex;

use crate::classify::Label;
use crate::config::ConfigFile;
use crate::errors::Result;

/// Path patterns deciding what the dispatcher does with an event.
///
/// Both patterns are matched (unanchored) against the absolute path as built
/// from the configured root, e.g. `mail/.Junk/cur/1234:2,S`. Matching works on
/// raw bytes so file names that are not valid UTF-8 are handled exactly.
#[derive(Debug, Clone)]
pub struct PathRules {
    exclude: Regex,
    spam: Regex,
}

impl PathRules {
    pub fn new(exclude: &str, spam: &str) -> Result<Self> {
        Ok(Self {
            exclude: Regex::new(exclude)?,
            spam: Regex::new(spam)?,
        })
    }

    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        Self::new(&cfg.rules.exclude, &cfg.rules.spam)
    }

    /// Paths that must never be watched or classified (temporary files,
    /// trashed messages, the Unsure folder, server metadata).
    pub fn is_excluded(&self, path: &Path) -> bool {
        self.exclude.is_match(path.as_os_str().as_bytes())
    }

    /// Label implied by where the message was filed.
    pub fn desired_label(&self, path: &Path) -> Label {
        if self.spam.is_match(path.as_os_str().as_bytes()) {
            Label::Spam
        } else {
            Label::Ham
        }
    }
}

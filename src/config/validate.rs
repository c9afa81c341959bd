// src/config/validate.rs

use std::path::{Path, PathBuf};

use regex::bytes::Regex;
use tracing::{debug, warn};

use crate::config::model::{
    ConfigFile, DEFAULT_ROOT, RawConfigFile, RulesSection, default_exclude, default_spam,
    exclude_pattern_under, spam_pattern_under,
};
use crate::errors::{LearnError, Result};
use crate::watch::path_utils::with_trailing_separator;
use crate::watch::record::MAX_RECORD_LEN;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::LearnError;

    fn try_from(mut raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        raw.watch.root = PathBuf::from(with_trailing_separator(raw.watch.root.into_os_string()));
        rebase_default_rules(&mut raw.rules, &raw.watch.root);
        validate_rules(&raw.rules)?;
        Ok(ConfigFile::new_unchecked(raw.watch, raw.rules, raw.classifier))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_watch_section(cfg)?;
    validate_classifier(cfg)?;
    Ok(())
}

fn validate_watch_section(cfg: &RawConfigFile) -> Result<()> {
    let watch = &cfg.watch;

    if watch.root.as_os_str().is_empty() {
        return Err(LearnError::ConfigError(
            "[watch].root must not be empty".to_string(),
        ));
    }

    if watch.registry_capacity == 0 {
        return Err(LearnError::ConfigError(
            "[watch].registry_capacity must be >= 1 (got 0)".to_string(),
        ));
    }

    // The root itself plus its separator must fit.
    let root_len = watch.root.as_os_str().len() + 1;
    if watch.max_path_len < root_len {
        return Err(LearnError::ConfigError(format!(
            "[watch].max_path_len ({}) is shorter than the root path ({} bytes)",
            watch.max_path_len, root_len
        )));
    }

    if watch.read_buffer_size < MAX_RECORD_LEN {
        return Err(LearnError::ConfigError(format!(
            "[watch].read_buffer_size must be >= {} to hold one record (got {})",
            MAX_RECORD_LEN, watch.read_buffer_size
        )));
    }

    Ok(())
}

/// Point patterns still at their defaults at `root` instead of `mail/`.
///
/// Patterns set explicitly are left alone. `root` already carries its
/// trailing separator.
fn rebase_default_rules(rules: &mut RulesSection, root: &Path) {
    if root == Path::new(DEFAULT_ROOT) {
        return;
    }
    let exclude_is_default = rules.exclude == default_exclude();
    let spam_is_default = rules.spam == default_spam();
    if !exclude_is_default && !spam_is_default {
        return;
    }

    let Some(root_str) = root.to_str() else {
        warn!(
            root = %root.display(),
            "root is not valid UTF-8; default rules still expect `mail/`"
        );
        return;
    };
    let prefix = regex::escape(root_str);

    if exclude_is_default {
        rules.exclude = exclude_pattern_under(&prefix);
    }
    if spam_is_default {
        rules.spam = spam_pattern_under(&prefix);
    }
    debug!(exclude = %rules.exclude, spam = %rules.spam, "default rules follow the root");
}

fn validate_rules(rules: &RulesSection) -> Result<()> {
    Regex::new(&rules.exclude)?;
    Regex::new(&rules.spam)?;
    Ok(())
}

fn validate_classifier(cfg: &RawConfigFile) -> Result<()> {
    if cfg.classifier.program.trim().is_empty() {
        return Err(LearnError::ConfigError(
            "[classifier].program must not be empty".to_string(),
        ));
    }
    Ok(())
}

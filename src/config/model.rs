// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::watch::WatchSettings;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [watch]
/// root = "mail/"
///
/// [rules]
/// exclude = 'mail/(\.Unsure/|[^/]+/(tmp|.*:2,[A-S]*T[U-Z]*$)|.*dovecot)'
/// spam = 'mail/\.Junk/'
///
/// [classifier]
/// program = "bogofilter"
/// ```
///
/// All sections are optional and default to the values above.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub rules: RulesSection,

    #[serde(default)]
    pub classifier: ClassifierSection,
}

impl RawConfigFile {
    /// Replace `[watch].root`, as `--root` does.
    ///
    /// Rules left at their defaults follow the new root once validated.
    pub fn override_root(&mut self, root: PathBuf) {
        self.watch.root = root;
    }
}

/// Validated configuration. Build it with `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub watch: WatchSection,
    pub rules: RulesSection,
    pub classifier: ClassifierSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        watch: WatchSection,
        rules: RulesSection,
        classifier: ClassifierSection,
    ) -> Self {
        Self {
            watch,
            rules,
            classifier,
        }
    }

    pub fn watch_settings(&self) -> WatchSettings {
        WatchSettings {
            root: self.watch.root.clone(),
            registry_capacity: self.watch.registry_capacity,
            max_path_len: self.watch.max_path_len,
            read_buffer_size: self.watch.read_buffer_size,
        }
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    /// Maildir root. A trailing `/` is added if missing.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Number of watches the registry is sized for at startup.
    #[serde(default = "default_registry_capacity")]
    pub registry_capacity: usize,

    /// Longest absolute path (bytes) that will be watched or classified.
    #[serde(default = "default_max_path_len")]
    pub max_path_len: usize,

    /// Buffer size for reading inotify records.
    #[serde(default = "default_read_buffer_size")]
    pub read_buffer_size: usize,
}

/// Root used when none is configured; the default patterns are written for it.
pub const DEFAULT_ROOT: &str = "mail/";

fn default_root() -> PathBuf {
    PathBuf::from(DEFAULT_ROOT)
}

fn default_registry_capacity() -> usize {
    128
}

fn default_max_path_len() -> usize {
    1024
}

fn default_read_buffer_size() -> usize {
    4096
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            root: default_root(),
            registry_capacity: default_registry_capacity(),
            max_path_len: default_max_path_len(),
            read_buffer_size: default_read_buffer_size(),
        }
    }
}

/// `[rules]` section: regular expressions matched against absolute paths.
///
/// A pattern left at its default follows `[watch].root`: the `mail/` prefix
/// is replaced by the configured root during validation.
#[derive(Debug, Clone, Deserialize)]
pub struct RulesSection {
    /// Paths never watched nor classified.
    ///
    /// The default skips the Unsure folder, maildir `tmp/` directories,
    /// messages flagged as trashed (`T` in the `:2,` info) and dovecot's own
    /// files.
    #[serde(default = "default_exclude")]
    pub exclude: String,

    /// Messages whose path matches are spam; everything else is ham.
    #[serde(default = "default_spam")]
    pub spam: String,
}

pub(crate) fn default_exclude() -> String {
    exclude_pattern_under(DEFAULT_ROOT)
}

pub(crate) fn default_spam() -> String {
    spam_pattern_under(DEFAULT_ROOT)
}

/// Default exclusion below `root`, which must already be a regex fragment.
pub(crate) fn exclude_pattern_under(root: &str) -> String {
    format!(r"{root}(\.Unsure/|[^/]+/(tmp|.*:2,[A-S]*T[U-Z]*$)|.*dovecot)")
}

/// Default spam folder below `root`, which must already be a regex fragment.
pub(crate) fn spam_pattern_under(root: &str) -> String {
    format!(r"{root}\.Junk/")
}

impl Default for RulesSection {
    fn default() -> Self {
        Self {
            exclude: default_exclude(),
            spam: default_spam(),
        }
    }
}

/// `[classifier]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierSection {
    /// Program to run; looked up in `PATH` unless it contains a `/`.
    #[serde(default = "default_program")]
    pub program: String,

    /// Extra arguments placed before the per-call options.
    #[serde(default)]
    pub args: Vec<String>,
}

fn default_program() -> String {
    "bogofilter".to_string()
}

impl Default for ClassifierSection {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: Vec::new(),
        }
    }
}

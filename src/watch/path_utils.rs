// src/watch/path_utils.rs

//! Path handling for the watcher.
//!
//! Every watched directory is remembered by its path relative to the mail
//! root, always ending in `/` (the root itself is the empty path). Absolute
//! paths are then plain concatenations `root + relative + name`, which keeps
//! them byte-for-byte identical to what the exclusion and spam patterns are
//! written against.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use super::WatchError;

const SEPARATOR: u8 = b'/';

/// Directory path relative to the watch root, with a trailing separator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RelPath(OsString);

impl RelPath {
    /// The root directory itself (empty relative path).
    pub fn root() -> Self {
        RelPath(OsString::new())
    }

    /// Build a relative directory path, appending the trailing separator if
    /// it is missing.
    pub fn new(path: impl Into<OsString>) -> Self {
        RelPath(with_trailing_separator(path.into()))
    }

    /// The relative path of subdirectory `name` of this directory.
    pub fn child_dir(&self, name: &OsStr) -> Self {
        let mut path = self.0.clone();
        path.push(name);
        RelPath(with_trailing_separator(path))
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_os_str(&self) -> &OsStr {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Number of directory levels below the root.
    pub fn depth(&self) -> usize {
        self.as_bytes().iter().filter(|&&b| b == SEPARATOR).count()
    }
}

impl fmt::Display for RelPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

/// Builds absolute paths below the watch root, refusing to produce paths
/// longer than a fixed limit.
///
/// Over-long paths are rejected, never truncated: a truncated path could name
/// a different file than the one the event was about.
#[derive(Debug, Clone)]
pub struct PathBuilder {
    root: OsString,
    max_len: usize,
}

impl PathBuilder {
    pub fn new(root: impl Into<OsString>, max_len: usize) -> Self {
        Self {
            root: with_trailing_separator(root.into()),
            max_len,
        }
    }

    /// Root directory, with its trailing separator.
    pub fn root(&self) -> &Path {
        Path::new(&self.root)
    }

    /// `root + rel + name`.
    ///
    /// An absent or empty `name` yields the directory's own path.
    pub fn join(&self, rel: &RelPath, name: Option<&OsStr>) -> Result<PathBuf, WatchError> {
        let name = name.filter(|n| !n.is_empty());
        let len = self.root.len() + rel.as_os_str().len() + name.map_or(0, |n| n.len());
        if len > self.max_len {
            return Err(WatchError::PathTooLong {
                len,
                limit: self.max_len,
            });
        }

        let mut path = OsString::with_capacity(len);
        path.push(&self.root);
        path.push(rel.as_os_str());
        if let Some(name) = name {
            path.push(name);
        }
        Ok(PathBuf::from(path))
    }
}

pub(crate) fn with_trailing_separator(mut path: OsString) -> OsString {
    let needs_separator = path
        .as_bytes()
        .last()
        .is_some_and(|&last| last != SEPARATOR);
    if needs_separator {
        path.push("/");
    }
    path
}

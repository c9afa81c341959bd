// src/watch/mod.rs

//! Recursive directory watching on top of inotify.
//!
//! This module is responsible for:
//! - Keeping the table of live watches (`registry`), keyed by the identifier
//!   the kernel hands back for each watch.
//! - Walking directories that already existed when their watch was created
//!   (`enumeration`) and reporting their subdirectories as if they had just
//!   been created.
//! - Reading and decoding raw inotify records (`channel`, `record`).
//! - Merging both sources into one ordered stream of [`WatchEvent`]s
//!   (`manager`).
//!
//! It does **not** know about spam, ham or exclusion rules; it only turns
//! filesystem changes into events about watched directories.

use std::ffi::OsString;
use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub mod channel;
pub mod enumeration;
pub mod manager;
pub mod path_utils;
pub mod record;
pub mod registry;

pub use channel::{InotifyChannel, NotifyChannel, WATCH_MASK};
pub use enumeration::EnumerationQueue;
pub use manager::{WatchManager, WatchSettings};
pub use path_utils::{PathBuilder, RelPath};
pub use registry::{WatchEntry, WatchRegistry};

/// Identifier the kernel assigned to a watch (inotify's `wd`).
///
/// Identifiers are only unique among *live* watches; the kernel may hand out
/// the same number again once a watch is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatchId(pub i32);

impl WatchId {
    pub fn raw(self) -> i32 {
        self.0
    }
}

impl From<i32> for WatchId {
    fn from(wd: i32) -> Self {
        WatchId(wd)
    }
}

impl fmt::Display for WatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The subset of inotify event bits the rest of the crate cares about.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventFlags {
    /// The subject of the event is a directory.
    pub is_dir: bool,
    /// An entry was created in, or moved into, the watched directory.
    pub created: bool,
    /// The watch itself is gone (directory deleted, unmounted, or removed).
    pub invalidated: bool,
}

impl EventFlags {
    pub fn from_mask(mask: u32) -> Self {
        Self {
            is_dir: mask & libc::IN_ISDIR != 0,
            created: mask & (libc::IN_CREATE | libc::IN_MOVED_TO) != 0,
            invalidated: mask & (libc::IN_IGNORED | libc::IN_DELETE_SELF | libc::IN_UNMOUNT) != 0,
        }
    }

    /// Flags for a subdirectory found while walking an existing directory.
    pub fn discovered_dir() -> Self {
        Self {
            is_dir: true,
            created: true,
            invalidated: false,
        }
    }
}

/// One event about a watched directory.
///
/// Events read from the kernel and events synthesized while walking
/// pre-existing directories have exactly the same shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    /// The watched directory this event concerns.
    pub entry: WatchEntry,
    /// Child name inside that directory; `None` when the event is about the
    /// directory itself.
    pub name: Option<OsString>,
    pub flags: EventFlags,
}

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("failed to open notification channel: {0}")]
    ChannelOpen(#[source] io::Error),

    #[error("failed to watch root directory: {0}")]
    RootWatch(#[source] Box<WatchError>),

    #[error("failed to add watch for {path:?}: {source}")]
    AddWatch {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read notification channel: {0}")]
    ChannelRead(#[source] io::Error),

    #[error("notification channel returned end of file")]
    ChannelClosed,

    #[error("event for unknown watch {0}")]
    UnknownWatch(WatchId),

    #[error("truncated notification record ({available} of {needed} bytes)")]
    TruncatedRecord { needed: usize, available: usize },

    #[error("path of {len} bytes exceeds the {limit} byte limit")]
    PathTooLong { len: usize, limit: usize },
}

impl WatchError {
    /// Whether the watcher can keep running after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            WatchError::ChannelOpen(_)
                | WatchError::RootWatch(_)
                | WatchError::ChannelRead(_)
                | WatchError::ChannelClosed
        )
    }
}

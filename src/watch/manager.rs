// src/watch/manager.rs

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::PathBuf;

use tracing::{debug, info, trace, warn};

use super::channel::{InotifyChannel, NotifyChannel};
use super::enumeration::EnumerationQueue;
use super::path_utils::{PathBuilder, RelPath};
use super::record::parse_record;
use super::registry::{WatchEntry, WatchRegistry};
use super::{EventFlags, WatchError, WatchEvent, WatchId};

/// Static parameters of a [`WatchManager`].
#[derive(Debug, Clone)]
pub struct WatchSettings {
    /// Directory everything is watched below.
    pub root: PathBuf,
    /// Number of watches the registry is sized for up front.
    pub registry_capacity: usize,
    /// Longest absolute path (in bytes) the watcher will build.
    pub max_path_len: usize,
    /// Size of the buffer notification records are read into.
    pub read_buffer_size: usize,
}

/// Owns the notification channel, the table of watches and the queue of
/// directories still to be walked, and turns them into a single stream of
/// [`WatchEvent`]s.
///
/// Synthetic events from directory walks always take priority over records
/// from the kernel: a tree that exists when a watch is added is fully
/// discovered before any live event is looked at.
pub struct WatchManager<C: NotifyChannel = InotifyChannel> {
    channel: C,
    paths: PathBuilder,
    registry: WatchRegistry,
    pending: EnumerationQueue,
    buf: Vec<u8>,
    /// Bytes of `buf` filled by the last read.
    filled: usize,
    /// Offset of the next unread record in `buf`.
    cursor: usize,
}

impl<C: NotifyChannel> fmt::Debug for WatchManager<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchManager")
            .field("root", &self.paths.root())
            .field("watches", &self.registry.len())
            .field("pending_walks", &self.pending.len())
            .finish_non_exhaustive()
    }
}

impl WatchManager<InotifyChannel> {
    /// Open an inotify channel and start watching `settings.root`.
    pub fn open(settings: &WatchSettings) -> Result<Self, WatchError> {
        let channel = InotifyChannel::open().map_err(WatchError::ChannelOpen)?;
        Self::with_channel(channel, settings)
    }
}

impl<C: NotifyChannel> WatchManager<C> {
    /// Build a manager around an already opened channel and watch the root.
    ///
    /// Failing to watch the root is fatal: nothing below it could ever be
    /// observed.
    pub fn with_channel(channel: C, settings: &WatchSettings) -> Result<Self, WatchError> {
        let mut manager = Self {
            channel,
            paths: PathBuilder::new(settings.root.clone(), settings.max_path_len),
            registry: WatchRegistry::with_capacity(settings.registry_capacity),
            pending: EnumerationQueue::new(),
            buf: vec![0; settings.read_buffer_size],
            filled: 0,
            cursor: 0,
        };

        manager
            .watch(&RelPath::root())
            .map_err(|err| WatchError::RootWatch(Box::new(err)))?;
        info!(root = ?manager.paths.root(), "watching mail root");

        Ok(manager)
    }

    pub fn registry(&self) -> &WatchRegistry {
        &self.registry
    }

    pub fn paths(&self) -> &PathBuilder {
        &self.paths
    }

    /// `root + entry's relative path + name`; over-long results are refused,
    /// never truncated.
    pub fn absolute_path(
        &self,
        entry: &WatchEntry,
        name: Option<&OsStr>,
    ) -> Result<PathBuf, WatchError> {
        self.paths.join(entry.relative_path(), name)
    }

    /// Number of directory walks not yet finished.
    pub fn pending_walks(&self) -> usize {
        self.pending.len()
    }

    /// Watch the directory at `rel` (relative to the root).
    ///
    /// Returns `false` if the watch could not be created; the subtree below
    /// `rel` then simply goes unobserved.
    pub fn start_watching(&mut self, rel: &RelPath) -> bool {
        match self.watch(rel) {
            Ok(_) => true,
            Err(err) => {
                warn!(path = %rel, error = %err, "not watching directory");
                false
            }
        }
    }

    /// Forget the watch `id` after the kernel reported it gone.
    ///
    /// The kernel side of the watch is already invalid, so nothing is
    /// cancelled there.
    pub fn stop_watching(&mut self, id: WatchId) -> bool {
        self.pending.forget(id);
        self.registry.remove(id)
    }

    /// Next synthetic event from walking pre-existing directories, if any.
    ///
    /// Never touches the notification channel.
    pub fn next_discovered(&mut self) -> Option<WatchEvent> {
        if self.pending.is_empty() {
            return None;
        }
        self.pending.produce_next(&self.paths, &self.registry)
    }

    /// Next event, synthetic or real.
    ///
    /// Pending directory walks are drained first; only then is the channel
    /// read, waiting for records if none are buffered. Errors for which
    /// [`WatchError::is_fatal`] is false concern this one record only.
    pub async fn next_event(&mut self) -> Result<WatchEvent, WatchError> {
        loop {
            if let Some(event) = self.next_discovered() {
                return Ok(event);
            }

            if self.cursor >= self.filled {
                self.fill().await?;
            }

            let (wd, mask, name) = match parse_record(&self.buf[self.cursor..self.filled]) {
                Ok((record, consumed)) => {
                    self.cursor += consumed;
                    (
                        WatchId(record.wd),
                        record.mask,
                        record.name.map(OsStr::to_os_string),
                    )
                }
                Err(err) => {
                    // The rest of this buffer can't be trusted.
                    self.cursor = self.filled;
                    return Err(err);
                }
            };
            trace!(id = %wd, mask, ?name, "notification record");

            if mask & libc::IN_Q_OVERFLOW != 0 {
                warn!("kernel event queue overflowed; rescanning watched tree");
                self.rescan();
                continue;
            }

            let Some(entry) = self.registry.lookup(wd) else {
                return Err(WatchError::UnknownWatch(wd));
            };

            return Ok(WatchEvent {
                entry: entry.clone(),
                name,
                flags: EventFlags::from_mask(mask),
            });
        }
    }

    /// Walk every watched directory again.
    ///
    /// Used after the kernel dropped events: subdirectories created in the
    /// meantime get discovered and watched. Shallow directories are walked
    /// first.
    pub fn rescan(&mut self) {
        let mut entries: Vec<(usize, OsString, WatchId)> = self
            .registry
            .iter()
            .map(|e| {
                let rel = e.relative_path();
                (rel.depth(), rel.as_os_str().to_os_string(), e.id())
            })
            .collect();
        entries.sort();

        for (_, _, id) in entries {
            if !self.pending.contains(id) {
                self.pending.enqueue(id);
            }
        }
        info!(walks = self.pending.len(), "scheduled rescan");
    }

    /// Release every watch and close the channel.
    ///
    /// Returns how many watches were released.
    pub fn close(mut self) -> usize {
        self.pending.clear();
        let released = self.registry.clear();
        info!(released, "watch manager closed");
        released
    }

    fn watch(&mut self, rel: &RelPath) -> Result<WatchId, WatchError> {
        let path = self.paths.join(rel, None)?;
        let id = self
            .channel
            .add_watch(&path)
            .map_err(|source| WatchError::AddWatch { path, source })?;

        if let Some(existing) = self.registry.lookup(id) {
            if existing.relative_path() == rel {
                // Already watched and walked; a second walk would only repeat
                // the same discoveries.
                debug!(id = %id, path = %rel, "directory already watched");
                return Ok(id);
            }
            // Same identifier, different path: the directory was moved or
            // renamed. Keep the path the kernel is reporting now.
            warn!(
                id = %id,
                old = %existing.relative_path(),
                new = %rel,
                "watch identifier now refers to a different path; rebinding"
            );
            self.stop_watching(id);
        }

        self.registry.add(id, rel.clone());
        self.pending.enqueue(id);
        Ok(id)
    }

    async fn fill(&mut self) -> Result<(), WatchError> {
        let n = self
            .channel
            .read(&mut self.buf[..])
            .await
            .map_err(WatchError::ChannelRead)?;
        if n == 0 {
            return Err(WatchError::ChannelClosed);
        }
        trace!(bytes = n, "read notification records");
        self.filled = n;
        self.cursor = 0;
        Ok(())
    }
}

// src/watch/enumeration.rs

//! Discovery of directories that existed before their parent was watched.
//!
//! Every new watch appends a task to the queue. Tasks are walked strictly in
//! the order they were added, so a tree present at startup is discovered
//! breadth first. Each subdirectory found is reported as a synthetic
//! "directory created" event, which makes the dispatcher watch it and, in
//! turn, append a task for it.

use std::collections::VecDeque;
use std::fs::{self, ReadDir};

use tracing::{debug, trace, warn};

use super::path_utils::PathBuilder;
use super::registry::WatchRegistry;
use super::{EventFlags, WatchEvent, WatchId};

/// Walk of one watched directory.
#[derive(Debug)]
struct EnumerationTask {
    watch: WatchId,
    /// Open listing once the walk has started.
    cursor: Option<ReadDir>,
}

enum Step {
    Found(WatchEvent),
    Exhausted,
}

/// FIFO of directories waiting to be walked.
#[derive(Debug, Default)]
pub struct EnumerationQueue {
    tasks: VecDeque<EnumerationTask>,
}

impl EnumerationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a walk of the directory watched by `watch`.
    pub fn enqueue(&mut self, watch: WatchId) {
        trace!(id = %watch, "queued directory walk");
        self.tasks.push_back(EnumerationTask {
            watch,
            cursor: None,
        });
    }

    /// Drop pending walks for a watch that no longer exists.
    pub fn forget(&mut self, watch: WatchId) {
        self.tasks.retain(|task| task.watch != watch);
    }

    pub fn contains(&self, watch: WatchId) -> bool {
        self.tasks.iter().any(|task| task.watch == watch)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    /// Produce the next synthetic "directory created" event.
    ///
    /// Directories that cannot be opened (typically because they vanished)
    /// are skipped. Returns `None` once every queued walk is finished.
    pub fn produce_next(
        &mut self,
        paths: &PathBuilder,
        registry: &WatchRegistry,
    ) -> Option<WatchEvent> {
        loop {
            let task = self.tasks.front_mut()?;
            match advance(task, paths, registry) {
                Step::Found(event) => return Some(event),
                Step::Exhausted => {
                    // Dropping the task closes its directory handle.
                    self.tasks.pop_front();
                }
            }
        }
    }
}

fn advance(task: &mut EnumerationTask, paths: &PathBuilder, registry: &WatchRegistry) -> Step {
    let Some(entry) = registry.lookup(task.watch) else {
        debug!(id = %task.watch, "watch removed before its directory was walked");
        return Step::Exhausted;
    };

    if task.cursor.is_none() {
        let dir = match paths.join(entry.relative_path(), None) {
            Ok(dir) => dir,
            Err(err) => {
                warn!(path = %entry.relative_path(), error = %err, "cannot walk directory");
                return Step::Exhausted;
            }
        };
        match fs::read_dir(&dir) {
            Ok(listing) => task.cursor = Some(listing),
            Err(err) => {
                debug!(?dir, error = %err, "directory vanished before it could be walked");
                return Step::Exhausted;
            }
        }
    }

    let Some(listing) = task.cursor.as_mut() else {
        return Step::Exhausted;
    };

    // `read_dir` never yields the `.` and `..` pseudo-entries.
    for child in listing {
        let child = match child {
            Ok(child) => child,
            Err(err) => {
                debug!(path = %entry.relative_path(), error = %err, "error reading directory entry");
                continue;
            }
        };
        let name = child.file_name();

        let full = match paths.join(entry.relative_path(), Some(&name)) {
            Ok(full) => full,
            Err(err) => {
                warn!(
                    path = %entry.relative_path(),
                    name = %name.to_string_lossy(),
                    error = %err,
                    "skipping entry"
                );
                continue;
            }
        };

        // stat, not lstat: a symlink to a directory is walked like one.
        match fs::metadata(&full) {
            Ok(meta) if meta.is_dir() => {
                trace!(?full, "discovered existing directory");
                return Step::Found(WatchEvent {
                    entry: entry.clone(),
                    name: Some(name),
                    flags: EventFlags::discovered_dir(),
                });
            }
            Ok(_) => {}
            Err(err) => debug!(?full, error = %err, "stat failed"),
        }
    }

    Step::Exhausted
}

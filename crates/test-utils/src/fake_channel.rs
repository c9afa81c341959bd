use std::collections::{HashMap, HashSet, VecDeque};
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use maildirlearn::watch::record::HEADER_LEN;
use maildirlearn::watch::{NotifyChannel, WatchId};

#[derive(Default)]
struct State {
    next_id: i32,
    ids: HashMap<PathBuf, WatchId>,
    forced: HashMap<PathBuf, WatchId>,
    failing: HashSet<PathBuf>,
    watched: Vec<PathBuf>,
    reads: VecDeque<io::Result<Vec<u8>>>,
}

/// A notification channel that never touches the kernel.
///
/// - hands out increasing watch ids, one per distinct path (a path watched
///   twice gets the same id, like inotify does)
/// - replays scripted reads in order
/// - once the script is exhausted, `read` waits forever
///
/// Clones share state, so a test can keep one handle and give the other to
/// the watch manager.
#[derive(Clone, Default)]
pub struct ScriptedChannel {
    state: Arc<Mutex<State>>,
}

impl ScriptedChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `add_watch` fail with `ENOENT` for this path.
    pub fn fail_watch_for(&self, path: impl Into<PathBuf>) -> &Self {
        self.state.lock().unwrap().failing.insert(path.into());
        self
    }

    /// Return `id` the next time `path` is watched, even if it is already
    /// in use for another path.
    pub fn assign_id(&self, path: impl Into<PathBuf>, id: WatchId) -> &Self {
        self.state.lock().unwrap().forced.insert(path.into(), id);
        self
    }

    /// Queue one successful read returning exactly these bytes.
    pub fn push_records(&self, bytes: Vec<u8>) -> &Self {
        self.state.lock().unwrap().reads.push_back(Ok(bytes));
        self
    }

    /// Queue one failing read.
    pub fn push_read_error(&self, kind: io::ErrorKind) -> &Self {
        self.state
            .lock()
            .unwrap()
            .reads
            .push_back(Err(io::Error::new(kind, "scripted read failure")));
        self
    }

    /// Every path passed to `add_watch`, in call order.
    pub fn watched_paths(&self) -> Vec<PathBuf> {
        self.state.lock().unwrap().watched.clone()
    }

    /// Id most recently handed out for `path`.
    pub fn wd_for(&self, path: impl AsRef<Path>) -> Option<WatchId> {
        self.state.lock().unwrap().ids.get(path.as_ref()).copied()
    }
}

impl NotifyChannel for ScriptedChannel {
    fn add_watch(&mut self, path: &Path) -> io::Result<WatchId> {
        let mut state = self.state.lock().unwrap();
        state.watched.push(path.to_path_buf());

        if state.failing.contains(path) {
            return Err(io::Error::from_raw_os_error(libc::ENOENT));
        }

        if let Some(id) = state.forced.remove(path) {
            state.ids.insert(path.to_path_buf(), id);
            return Ok(id);
        }

        if let Some(id) = state.ids.get(path) {
            return Ok(*id);
        }

        state.next_id += 1;
        let id = WatchId(state.next_id);
        state.ids.insert(path.to_path_buf(), id);
        Ok(id)
    }

    fn read<'a>(
        &'a mut self,
        buf: &'a mut [u8],
    ) -> Pin<Box<dyn Future<Output = io::Result<usize>> + Send + 'a>> {
        let next = self.state.lock().unwrap().reads.pop_front();
        Box::pin(async move {
            match next {
                Some(Ok(bytes)) => {
                    if bytes.len() > buf.len() {
                        return Err(io::Error::from_raw_os_error(libc::EINVAL));
                    }
                    buf[..bytes.len()].copy_from_slice(&bytes);
                    Ok(bytes.len())
                }
                Some(Err(err)) => Err(err),
                None => std::future::pending().await,
            }
        })
    }
}

/// Encode one inotify record the way the kernel lays it out.
///
/// The name is NUL terminated and padded to a multiple of four bytes.
pub fn encode_record(wd: WatchId, mask: u32, name: Option<&str>) -> Vec<u8> {
    let padded_len = match name {
        Some(n) => (n.len() + 1).div_ceil(4) * 4,
        None => 0,
    };

    let mut out = Vec::with_capacity(HEADER_LEN + padded_len);
    out.extend_from_slice(&wd.raw().to_ne_bytes());
    out.extend_from_slice(&mask.to_ne_bytes());
    out.extend_from_slice(&0u32.to_ne_bytes());
    out.extend_from_slice(&(padded_len as u32).to_ne_bytes());
    if let Some(n) = name {
        out.extend_from_slice(n.as_bytes());
        out.resize(HEADER_LEN + padded_len, 0);
    }
    out
}

/// Concatenate several records into one read.
pub fn batch(records: impl IntoIterator<Item = Vec<u8>>) -> Vec<u8> {
    records.into_iter().flatten().collect()
}

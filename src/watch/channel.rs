// src/watch/channel.rs

//! The OS notification channel.
//!
//! The watch manager talks to a `NotifyChannel` instead of a raw inotify
//! descriptor. Production code uses [`InotifyChannel`]; tests can provide a
//! scripted channel that hands out identifiers and replays prepared records
//! without touching the kernel.

use std::ffi::CString;
use std::future::Future;
use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::pin::Pin;

use tokio::io::unix::AsyncFd;
use tracing::debug;

use super::WatchId;

/// Events requested for every watched directory: entries created in it and
/// entries moved into it. `IN_ONLYDIR` makes the watch fail if the path was
/// replaced by something that is not a directory.
pub const WATCH_MASK: u32 = libc::IN_CREATE | libc::IN_MOVED_TO | libc::IN_ONLYDIR;

/// Source of watch identifiers and raw notification records.
pub trait NotifyChannel: Send {
    /// Start watching the directory at `path` for [`WATCH_MASK`] events.
    ///
    /// Watching a directory that is already watched returns its existing
    /// identifier.
    fn add_watch(&mut self, path: &Path) -> io::Result<WatchId>;

    /// Wait until records are available and copy as many as fit into `buf`,
    /// returning the number of bytes written. Records are never split.
    fn read<'a>(
        &'a mut self,
        buf: &'a mut [u8],
    ) -> Pin<Box<dyn Future<Output = io::Result<usize>> + Send + 'a>>;
}

/// A non-blocking inotify descriptor registered with the Tokio reactor.
///
/// Dropping the channel closes the descriptor, which also drops every watch
/// created through it.
pub struct InotifyChannel {
    fd: AsyncFd<OwnedFd>,
}

impl std::fmt::Debug for InotifyChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InotifyChannel")
            .field("fd", &self.fd.get_ref().as_raw_fd())
            .finish()
    }
}

impl InotifyChannel {
    /// Open a new inotify instance. Must be called from within a Tokio runtime.
    pub fn open() -> io::Result<Self> {
        let raw = unsafe { libc::inotify_init1(libc::IN_NONBLOCK | libc::IN_CLOEXEC) };
        if raw < 0 {
            return Err(io::Error::last_os_error());
        }
        // SAFETY: `raw` is a freshly created descriptor nobody else owns.
        let fd = unsafe { OwnedFd::from_raw_fd(raw) };
        debug!(fd = raw, "opened inotify descriptor");
        Ok(Self {
            fd: AsyncFd::new(fd)?,
        })
    }
}

impl NotifyChannel for InotifyChannel {
    fn add_watch(&mut self, path: &Path) -> io::Result<WatchId> {
        let c_path = CString::new(path.as_os_str().as_bytes()).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidInput, "path contains a NUL byte")
        })?;

        let wd = unsafe {
            libc::inotify_add_watch(self.fd.get_ref().as_raw_fd(), c_path.as_ptr(), WATCH_MASK)
        };
        if wd < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(WatchId(wd))
    }

    fn read<'a>(
        &'a mut self,
        buf: &'a mut [u8],
    ) -> Pin<Box<dyn Future<Output = io::Result<usize>> + Send + 'a>> {
        Box::pin(async move {
            loop {
                let mut guard = self.fd.readable().await?;
                let result = guard.try_io(|inner| {
                    let n = unsafe {
                        libc::read(
                            inner.get_ref().as_raw_fd(),
                            buf.as_mut_ptr().cast(),
                            buf.len(),
                        )
                    };
                    if n < 0 {
                        Err(io::Error::last_os_error())
                    } else {
                        Ok(n as usize)
                    }
                });

                match result {
                    Ok(read) => return read,
                    // Readiness was stale; wait for the next wakeup.
                    Err(_would_block) => continue,
                }
            }
        })
    }
}

// src/watch/record.rs

//! Decoding of raw inotify records.
//!
//! A single `read(2)` on an inotify descriptor returns any number of records
//! packed back to back:
//!
//! ```text
//! i32 wd | u32 mask | u32 cookie | u32 len | name[len]
//! ```
//!
//! all in native byte order. `name` is NUL padded to `len` bytes and is only
//! present (`len > 0`) for events about a child of the watched directory.

use std::ffi::OsStr;
use std::mem;
use std::os::unix::ffi::OsStrExt;

use super::WatchError;

/// Size of the fixed part of a record.
pub const HEADER_LEN: usize = mem::size_of::<libc::inotify_event>();

const NAME_MAX: usize = 255;

/// Longest possible record: header plus a maximal file name and its NUL.
pub const MAX_RECORD_LEN: usize = HEADER_LEN + NAME_MAX + 1;

/// One decoded record, borrowing its name from the read buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawRecord<'a> {
    pub wd: i32,
    pub mask: u32,
    pub name: Option<&'a OsStr>,
}

/// Decode the record at the start of `buf`.
///
/// Returns the record and the number of bytes it occupies.
pub fn parse_record(buf: &[u8]) -> Result<(RawRecord<'_>, usize), WatchError> {
    if buf.len() < HEADER_LEN {
        return Err(WatchError::TruncatedRecord {
            needed: HEADER_LEN,
            available: buf.len(),
        });
    }

    let wd = i32::from_ne_bytes(field(buf, 0));
    let mask = u32::from_ne_bytes(field(buf, 4));
    let name_len = u32::from_ne_bytes(field(buf, 12)) as usize;

    let total = HEADER_LEN + name_len;
    if buf.len() < total {
        return Err(WatchError::TruncatedRecord {
            needed: total,
            available: buf.len(),
        });
    }

    // len == 0 means "no name"; never read the name bytes in that case.
    let name = if name_len == 0 {
        None
    } else {
        let raw = &buf[HEADER_LEN..total];
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        Some(OsStr::from_bytes(&raw[..end])).filter(|n| !n.is_empty())
    };

    Ok((
        RawRecord { wd, mask, name },
        total,
    ))
}

fn field(buf: &[u8], offset: usize) -> [u8; 4] {
    let mut out = [0u8; 4];
    out.copy_from_slice(&buf[offset..offset + 4]);
    out
}

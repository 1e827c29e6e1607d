//! Various MP4 demux read/parse errors.

use std::fmt;

/// Errors raised while opening or querying an MP4 file.
#[derive(Debug)]
pub enum Mp4Error {
    /// Structural violation in the box tree,
    /// e.g. a declared payload smaller than the
    /// grammar's fixed minimum, or a nested zero-sized box.
    Invalid(String),
    /// Read/seek failure on the underlying file,
    /// including EOF before expected bytes.
    Io(std::io::Error),
    /// Allocation failure for one of the per-sample tables.
    Oom,
    /// Sample count mismatch between the compact sample tables,
    /// e.g. `stsc`+`stco` expansion vs. `stsz`,
    /// or `stts` vs. `stsz`.
    Protocol{got: u64, expected: u64},
    /// No such track, sample or atom.
    NotFound(String),
    /// Caller-provided buffer smaller than the data it should receive.
    BufTooSmall{got: usize, needed: usize},
    /// Recognised but unsupported construct,
    /// e.g. file sizes beyond the 63-bit offset range.
    Unsupported(String),
}

impl std::error::Error for Mp4Error {}

impl fmt::Display for Mp4Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mp4Error::Invalid(msg) => write!(f, "Invalid MP4 structure: {msg}"),
            Mp4Error::Io(err) => write!(f, "IO error: {err}"),
            Mp4Error::Oom => write!(f, "Allocation failed"),
            Mp4Error::Protocol{got, expected} => write!(f, "Sample count mismatch: {got} vs. {expected}"),
            Mp4Error::NotFound(what) => write!(f, "Not found: {what}"),
            Mp4Error::BufTooSmall{got, needed} => write!(f, "Buffer too small ({got} bytes, {needed} needed)"),
            Mp4Error::Unsupported(what) => write!(f, "Unsupported: {what}"),
        }
    }
}

/// Converts std::io::Error to Mp4Error
impl From<std::io::Error> for Mp4Error {
    fn from(err: std::io::Error) -> Self {
        Mp4Error::Io(err)
    }
}

/// Converts std::string::FromUtf8Error to Mp4Error
/// (`&str` requires `std::str::Utf8Error`)
impl From<std::string::FromUtf8Error> for Mp4Error {
    fn from(err: std::string::FromUtf8Error) -> Mp4Error {
        Mp4Error::Invalid(err.to_string())
    }
}

/// Converts Mp4Error to std::io::Error
impl From<Mp4Error> for std::io::Error {
    fn from(err: Mp4Error) -> Self {
        std::io::Error::new(std::io::ErrorKind::Other, err)
    }
}

/// Converts binrw::Error to Mp4Error.
///
/// All binrw reads in this crate run over in-memory cursors bounded
/// by the declared box payload, so a short read here means the box
/// was smaller than its grammar requires.
impl From<binrw::Error> for Mp4Error {
    fn from(err: binrw::Error) -> Mp4Error {
        Mp4Error::Invalid(err.to_string())
    }
}

/// Converts std::collections::TryReserveError to Mp4Error
impl From<std::collections::TryReserveError> for Mp4Error {
    fn from(_err: std::collections::TryReserveError) -> Mp4Error {
        Mp4Error::Oom
    }
}

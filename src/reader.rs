//! Positioned reader over the MP4 file.
//!
//! All multi-byte values in an MP4 are big-endian; every typed read
//! goes through `binrw` so native byte order never leaks out.

use std::{
    fs::File,
    io::{BufReader, Cursor, Read, Seek, SeekFrom},
};

use binrw::{BinRead, BinReaderExt};

use crate::Mp4Error;

/// `BufReader` over a `File` with a known total length.
#[derive(Debug)]
pub(crate) struct Mp4Reader {
    /// File size.
    len: u64,
    /// Reader over the full MP4 file.
    inner: BufReader<File>,
}

impl Mp4Reader {
    /// Creates a reader over `file`; `None` keeps the default
    /// `BufReader` capacity (8KiB).
    pub(crate) fn with_capacity(
        file: File,
        capacity: Option<usize>
    ) -> Result<Self, Mp4Error> {
        let len = file.metadata()?.len();
        if len > i64::MAX as u64 {
            return Err(Mp4Error::Unsupported(
                format!("file size {len} exceeds 63-bit offset range")
            ));
        }
        let inner = match capacity {
            Some(cap) => BufReader::with_capacity(cap, file),
            None => BufReader::new(file),
        };
        Ok(Self { len, inner })
    }

    /// Returns total file size in bytes.
    pub(crate) fn len(&self) -> u64 {
        self.len
    }

    /// Returns current position/byte offset in the MP4 file.
    pub(crate) fn pos(&mut self) -> Result<u64, Mp4Error> {
        Ok(self.inner.stream_position()?)
    }

    /// Seeks to absolute or relative position `pos`.
    pub(crate) fn seek(&mut self, pos: SeekFrom) -> Result<u64, Mp4Error> {
        Ok(self.inner.seek(pos)?)
    }

    /// Seeks `n` bytes forward from the current position.
    pub(crate) fn skip(&mut self, n: u64) -> Result<u64, Mp4Error> {
        self.seek(SeekFrom::Current(i64::try_from(n).map_err(
            |_| Mp4Error::Invalid(format!("cannot skip {n} bytes"))
        )?))
    }

    /// Read a single big endian type `T`.
    pub(crate) fn read_be<T>(&mut self) -> Result<T, Mp4Error>
    where
        T: BinRead,
        <T as BinRead>::Args<'static>: Sized + Clone + Default,
    {
        Ok(self.inner.read_be::<T>()?)
    }

    /// Read `n` big endian types `T`.
    pub(crate) fn read_many_be<T>(&mut self, n: usize) -> Result<Vec<T>, Mp4Error>
    where
        T: BinRead,
        <T as BinRead>::Args<'static>: Sized + Clone + Default,
    {
        (0..n)
            .map(|_| self.read_be::<T>())
            .collect()
    }

    /// Reads `n` bytes at the current position.
    pub(crate) fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>, Mp4Error> {
        let mut buf = vec![0_u8; n];
        self.inner.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Reads `n` bytes as a UTF-8 string,
    /// decoding invalid sequences lossily.
    pub(crate) fn read_string(&mut self, n: usize) -> Result<String, Mp4Error> {
        let buf = self.read_bytes(n)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Reads `len` bytes starting at the current position
    /// and returns them as an in-memory `Cursor<Vec<u8>>`.
    pub(crate) fn cursor(&mut self, len: u64) -> Result<Cursor<Vec<u8>>, Mp4Error> {
        let n = usize::try_from(len)
            .map_err(|_| Mp4Error::Invalid(format!("box payload of {len} bytes")))?;
        Ok(Cursor::new(self.read_bytes(n)?))
    }

    /// Fills `buf` with the bytes at absolute offset `pos`.
    pub(crate) fn read_exact_at(&mut self, buf: &mut [u8], pos: u64) -> Result<(), Mp4Error> {
        self.seek(SeekFrom::Start(pos))?;
        self.inner.read_exact(buf)?;
        Ok(())
    }
}

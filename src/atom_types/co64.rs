//! Chunk offset box for file sizes above the 32bit limit (`co64`).
//! The 64-bit equivalent of the `stco` box.
//!
//! Location: `moov/trak[multiple]/mdia/minf/stbl/co64`

use log::debug;

use crate::{reader::Mp4Reader, Mp4Error};

/// Chunk offset box with 64-bit offsets (`co64`).
#[derive(Debug, Default)]
pub struct Co64 {
    /// Absolute file offset of each chunk.
    pub(crate) offsets: Vec<u64>,
}

impl Co64 {
    pub(crate) fn read(reader: &mut Mp4Reader, max_bytes: u64) -> Result<Self, Mp4Error> {
        if max_bytes < 8 {
            return Err(Mp4Error::Invalid(format!(
                "'co64' payload of {max_bytes} bytes, expected 8 min"
            )));
        }

        let _version_flags = reader.read_be::<u32>()?;
        let entry_count = reader.read_be::<u32>()?;
        debug!("# co64: entry_count={entry_count}");

        if max_bytes < 8 + entry_count as u64 * 8 {
            return Err(Mp4Error::Invalid(format!(
                "'co64' payload of {max_bytes} bytes for {entry_count} entries"
            )));
        }

        let mut offsets = Vec::new();
        offsets.try_reserve_exact(entry_count as usize)?;
        for _ in 0..entry_count {
            offsets.push(reader.read_be::<u64>()?);
        }

        Ok(Self { offsets })
    }
}

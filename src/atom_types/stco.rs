//! Chunk offset box for file sizes below the 32bit limit (`stco`).
//!
//! Location: `moov/trak[multiple]/mdia/minf/stbl/stco`
//!
//! Offsets are widened to `u64` on read so the rest of the
//! demuxer only ever sees one chunk-offset representation.
//!
//! See: <https://developer.apple.com/documentation/quicktime-file-format/chunk_offset_atom>

use log::debug;

use crate::{reader::Mp4Reader, Mp4Error};

/// Chunk offset box (`stco`), offsets widened to 64 bits.
#[derive(Debug, Default)]
pub struct Stco {
    /// Absolute file offset of each chunk.
    pub(crate) offsets: Vec<u64>,
}

impl Stco {
    pub(crate) fn read(reader: &mut Mp4Reader, max_bytes: u64) -> Result<Self, Mp4Error> {
        if max_bytes < 8 {
            return Err(Mp4Error::Invalid(format!(
                "'stco' payload of {max_bytes} bytes, expected 8 min"
            )));
        }

        let _version_flags = reader.read_be::<u32>()?;
        let entry_count = reader.read_be::<u32>()?;
        debug!("# stco: entry_count={entry_count}");

        if max_bytes < 8 + entry_count as u64 * 4 {
            return Err(Mp4Error::Invalid(format!(
                "'stco' payload of {max_bytes} bytes for {entry_count} entries"
            )));
        }

        let mut offsets = Vec::new();
        offsets.try_reserve_exact(entry_count as usize)?;
        for _ in 0..entry_count {
            offsets.push(reader.read_be::<u32>()? as u64);
        }

        Ok(Self { offsets })
    }
}

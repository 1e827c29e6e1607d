//! Sample-to-chunk box (`stsc`).
//!
//! Location: `moov/trak[multiple]/mdia/minf/stbl/stsc`
//!
//! Run-length encoded mapping from chunks to samples-per-chunk,
//! ordered by ascending 1-based `first_chunk`. Each entry applies
//! from its `first_chunk` up to (excluding) the next entry's
//! `first_chunk`; the last entry runs to the final chunk.
//!
//! See:
//! - <https://developer.apple.com/documentation/quicktime-file-format/sample-to-chunk_atom>

use binrw::BinRead;
use log::debug;

use crate::{reader::Mp4Reader, Mp4Error};

/// One `stsc` run.
#[derive(Debug, Clone, Copy, BinRead)]
#[br(big)]
pub struct SampleToChunkEntry {
    /// 1-based index of the first chunk this run applies to.
    pub(crate) first_chunk: u32,
    /// Number of samples in each chunk of the run.
    pub(crate) samples_per_chunk: u32,
    /// 1-based `stsd` entry describing the samples.
    pub(crate) sample_description_index: u32,
}

/// Sample-to-chunk box (`stsc`).
#[derive(Debug, Default)]
pub struct Stsc {
    pub(crate) entries: Vec<SampleToChunkEntry>,
}

impl Stsc {
    pub(crate) fn read(reader: &mut Mp4Reader, max_bytes: u64) -> Result<Self, Mp4Error> {
        if max_bytes < 8 {
            return Err(Mp4Error::Invalid(format!(
                "'stsc' payload of {max_bytes} bytes, expected 8 min"
            )));
        }

        let _version_flags = reader.read_be::<u32>()?;
        let entry_count = reader.read_be::<u32>()?;
        debug!("# stsc: entry_count={entry_count}");

        if max_bytes < 8 + entry_count as u64 * 12 {
            return Err(Mp4Error::Invalid(format!(
                "'stsc' payload of {max_bytes} bytes for {entry_count} entries"
            )));
        }

        let entries = reader.read_many_be::<SampleToChunkEntry>(entry_count as usize)?;

        Ok(Self { entries })
    }
}

//! Decoding-time-to-sample box (`stts`).
//!
//! Location: `moov/trak[multiple]/mdia/minf/stbl/stts`
//!
//! Run-length encoded: each entry covers `sample_count` samples
//! spaced `sample_delta` ticks apart.
//!
//! See <https://developer.apple.com/documentation/quicktime-file-format/time-to-sample_atom>

use binrw::BinRead;
use log::debug;

use crate::{reader::Mp4Reader, Mp4Error};

/// One `stts` run.
#[derive(Debug, Clone, Copy, BinRead)]
#[br(big)]
pub struct TimeToSampleEntry {
    pub(crate) sample_count: u32,
    pub(crate) sample_delta: u32,
}

/// Decoding-time-to-sample box (`stts`).
#[derive(Debug, Default)]
pub struct Stts {
    pub(crate) entries: Vec<TimeToSampleEntry>,
}

impl Stts {
    pub(crate) fn read(reader: &mut Mp4Reader, max_bytes: u64) -> Result<Self, Mp4Error> {
        if max_bytes < 8 {
            return Err(Mp4Error::Invalid(format!(
                "'stts' payload of {max_bytes} bytes, expected 8 min"
            )));
        }

        let _version_flags = reader.read_be::<u32>()?;
        let entry_count = reader.read_be::<u32>()?;
        debug!("# stts: entry_count={entry_count}");

        if max_bytes < 8 + entry_count as u64 * 8 {
            return Err(Mp4Error::Invalid(format!(
                "'stts' payload of {max_bytes} bytes for {entry_count} entries"
            )));
        }

        let entries = reader.read_many_be::<TimeToSampleEntry>(entry_count as usize)?;

        Ok(Self { entries })
    }

    /// Total number of samples covered by the table.
    pub fn sample_sum(&self) -> u64 {
        self.entries.iter()
            .map(|e| e.sample_count as u64)
            .sum()
    }
}

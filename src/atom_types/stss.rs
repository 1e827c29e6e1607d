//! Sync sample box (`stss`).
//!
//! Lists the 1-based sample numbers of the random access points.
//! When the box is absent every sample is a sync sample.
//!
//! Location: `moov/trak[multiple]/mdia/minf/stbl/stss`
//!
//! See: <https://developer.apple.com/documentation/quicktime-file-format/sync_sample_atom>

use log::debug;

use crate::{reader::Mp4Reader, Mp4Error};

/// Sync sample box (`stss`).
#[derive(Debug, Default)]
pub struct Stss {
    /// 1-based sample numbers, ascending.
    pub(crate) sample_numbers: Vec<u32>,
}

impl Stss {
    pub(crate) fn read(reader: &mut Mp4Reader, max_bytes: u64) -> Result<Self, Mp4Error> {
        if max_bytes < 8 {
            return Err(Mp4Error::Invalid(format!(
                "'stss' payload of {max_bytes} bytes, expected 8 min"
            )));
        }

        let _version_flags = reader.read_be::<u32>()?;
        let entry_count = reader.read_be::<u32>()?;
        debug!("# stss: entry_count={entry_count}");

        if max_bytes < 8 + entry_count as u64 * 4 {
            return Err(Mp4Error::Invalid(format!(
                "'stss' payload of {max_bytes} bytes for {entry_count} entries"
            )));
        }

        let sample_numbers = reader.read_many_be::<u32>(entry_count as usize)?;

        Ok(Self { sample_numbers })
    }
}

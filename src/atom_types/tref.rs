//! Track reference box (`tref`).
//!
//! Links one track to another by id and relation
//! (`chap` for chapters, `cdsc` for timed metadata, ...).
//!
//! Location: `moov/trak[multiple]/tref`
//!
//! The payload is itself a sequence of typed reference boxes;
//! only the first reference box and its first track id are kept,
//! further ids are discarded.

use binrw::{BinRead, BinReaderExt};
use log::debug;

use crate::{reader::Mp4Reader, support::string_from_be_u32, Mp4Error};

/// Track reference box (`tref`), reduced to its first entry.
#[derive(Debug, Default, BinRead)]
#[br(big)]
pub struct Tref {
    /// Size of the first nested reference box.
    pub(crate) entry_size: u32,
    /// Relation FourCC, e.g. `chap` or `cdsc`.
    pub(crate) reference_type: u32,
    /// First referenced track id.
    pub(crate) track_id: u32,
}

impl Tref {
    /// Minimum payload (C: 3 * 4 bytes).
    const MIN_SIZE: u64 = 12;

    pub(crate) fn read(reader: &mut Mp4Reader, max_bytes: u64) -> Result<Self, Mp4Error> {
        if max_bytes < Self::MIN_SIZE {
            return Err(Mp4Error::Invalid(format!(
                "'tref' payload of {max_bytes} bytes, expected {} min",
                Self::MIN_SIZE
            )));
        }
        let mut crs = reader.cursor(Self::MIN_SIZE)?;
        let tref: Tref = crs.read_be()?;
        debug!(
            "# tref: reference_type={} track_id={}",
            string_from_be_u32(tref.reference_type),
            tref.track_id
        );
        Ok(tref)
    }
}

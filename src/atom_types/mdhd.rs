//! Media header box (`mdhd`).
//!
//! Similar to `mvhd`, but only describes a single track (`trak`).
//! Carries the track's own time scale, which may differ greatly
//! from the movie time scale.
//!
//! Location: `moov/trak/mdia/mdhd`
//!
//! See: <https://developer.apple.com/documentation/quicktime-file-format/media_header_atom>

use binrw::{BinRead, BinReaderExt};
use log::debug;

use crate::{reader::Mp4Reader, support::versioned_u64, Mp4Error};

/// Media header box (`mdhd`). One per track (`trak`).
///
/// Path: `moov/trak/mdia/mdhd`
#[derive(Debug, Default, BinRead)]
#[br(big)]
pub struct Mdhd {
    pub(crate) version: u8,
    _flags: [u8; 3],
    /// Seconds since midnight, 1904-01-01 UTC.
    #[br(parse_with = versioned_u64, args(version))]
    pub(crate) creation_time: u64,
    /// Seconds since midnight, 1904-01-01 UTC.
    #[br(parse_with = versioned_u64, args(version))]
    pub(crate) modification_time: u64,
    /// Ticks per second for this track.
    pub(crate) time_scale: u32,
    /// Unscaled duration in this track's own `time_scale`.
    #[br(parse_with = versioned_u64, args(version))]
    pub(crate) duration: u64,
    /// ISO-639-2/T language code,
    /// packed as 1 pad bit + three 5-bit letters.
    #[br(map = |data: u16| derive_language_code(data))]
    pub(crate) language: String,
    pub(crate) quality: u16,
}

impl Mdhd {
    /// Minimum payload for a version 0 box (C: 6 * 4 bytes).
    const MIN_SIZE: u64 = 24;

    pub(crate) fn read(reader: &mut Mp4Reader, max_bytes: u64) -> Result<Self, Mp4Error> {
        if max_bytes < Self::MIN_SIZE {
            return Err(Mp4Error::Invalid(format!(
                "'mdhd' payload of {max_bytes} bytes, expected {} min",
                Self::MIN_SIZE
            )));
        }
        // 36 bytes covers a version 1 box.
        let mut crs = reader.cursor(max_bytes.min(36))?;
        let mdhd: Mdhd = crs.read_be()?;
        debug!("# mdhd: version={}", mdhd.version);
        debug!("# mdhd: timescale={}", mdhd.time_scale);
        debug!("# mdhd: duration={}", mdhd.duration);
        debug!("# mdhd: language={}", mdhd.language);
        Ok(mdhd)
    }

    pub fn time_scale(&self) -> u32 {
        self.time_scale
    }

    /// ISO-639-2/T language code.
    pub fn language(&self) -> &str {
        &self.language
    }
}

/// Derive three letter ISO639-2/T language code.
///
/// Packed in 16 bits `X u5 u5 u5`:
/// - most significant bit is padding (BE so left most)
/// - 3 x `u5` + `0x60`
fn derive_language_code(data: u16) -> String {
    [
        // value between 0-31 + 96 = ascii range so casting to u8 is ok
        (((0b0111_1100_0000_0000 & data) >> 10) as u8 + 0x60) as char,
        (((0b0000_0011_1110_0000 & data) >> 5) as u8 + 0x60) as char,
        ((0b0000_0000_0001_1111 & data) as u8 + 0x60) as char,
    ]
    .iter()
    .collect()
}

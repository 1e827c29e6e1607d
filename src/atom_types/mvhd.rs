//! Movie header box (`mvhd`).
//!
//! Location: `moov/mvhd`
//!
//! See: <https://developer.apple.com/documentation/quicktime-file-format/movie_header_atom>

use binrw::{BinRead, BinReaderExt};
use log::debug;
use time::{Duration, PrimitiveDateTime};

use crate::{
    consts::mp4_time_zero, reader::Mp4Reader, support::versioned_u64, Mp4Error,
};

/// Movie header box (`mvhd`).
///
/// Location: `moov/mvhd`
///
/// Creation/modification times and duration are stored 64-bit
/// on version 1 of the box and 32-bit otherwise.
#[derive(Debug, BinRead)]
#[br(big)]
pub struct Mvhd {
    pub(crate) version: u8,
    _flags: [u8; 3],
    /// Seconds since midnight, 1904-01-01 UTC
    #[br(parse_with = versioned_u64, args(version))]
    pub(crate) creation_time: u64,
    /// Seconds since midnight, 1904-01-01 UTC
    #[br(parse_with = versioned_u64, args(version))]
    pub(crate) modification_time: u64,
    /// Number of time units that pass in one second
    pub(crate) time_scale: u32,
    /// Unscaled duration of the longest track,
    /// in `time_scale` ticks.
    #[br(parse_with = versioned_u64, args(version))]
    pub(crate) duration: u64,
    /// Fixed point number (16.16)
    /// representing preferred play rate
    /// (1.0 = normal playback).
    pub(crate) preferred_rate: u32,
    /// Fixed point number (8.8)
    /// representing preferred volume
    /// (1.0 = full volume).
    pub(crate) preferred_volume: u16,
    _reserved: [u8; 10],
    pub(crate) matrix: [u8; 36], // row-major matrix
    _pre_defined: [u8; 24],
    pub(crate) next_track_id: u32,
}

impl Mvhd {
    /// Minimum payload for a version 0 box (C: 25 * 4 bytes).
    const MIN_SIZE: u64 = 100;

    pub(crate) fn read(reader: &mut Mp4Reader, max_bytes: u64) -> Result<Self, Mp4Error> {
        if max_bytes < Self::MIN_SIZE {
            return Err(Mp4Error::Invalid(format!(
                "'mvhd' payload of {max_bytes} bytes, expected {} min",
                Self::MIN_SIZE
            )));
        }
        // 112 bytes covers a version 1 box; trailing payload is skipped
        // by the caller.
        let mut crs = reader.cursor(max_bytes.min(112))?;
        let mvhd: Mvhd = crs.read_be()?;
        debug!("# mvhd: version={}", mvhd.version);
        debug!("# mvhd: timescale={}", mvhd.time_scale);
        debug!("# mvhd: duration={}", mvhd.duration);
        debug!("# mvhd: rate={:.4}", mvhd.preferred_rate as f64 / 65536.);
        debug!("# mvhd: next_track_ID={}", mvhd.next_track_id);
        Ok(mvhd)
    }

    /// Creation time as UTC datetime.
    /// May default to MP4 default time
    /// `1904-01-01 00:00:00` depending on device and settings.
    pub fn creation_time(&self) -> PrimitiveDateTime {
        mp4_time_zero() + Duration::seconds(self.creation_time as i64)
    }

    /// Modification time as UTC datetime.
    pub fn modification_time(&self) -> PrimitiveDateTime {
        mp4_time_zero() + Duration::seconds(self.modification_time as i64)
    }
}

//! Track header box (`tkhd`).
//!
//! Location: `moov/trak[multiple]/tkhd`
//!
//! See: <https://developer.apple.com/documentation/quicktime-file-format/track_header_atom>

use binrw::{BinRead, BinReaderExt};
use log::debug;

use crate::{reader::Mp4Reader, support::versioned_u64, Mp4Error};

/// Track header box (`tkhd`).
///
/// Location: `moov/trak[multiple]/tkhd`
///
/// Width and height here are 16.16 fixed-point presentation values;
/// the native pixel counts live in the `stsd` sample entry.
#[derive(Debug, BinRead)]
#[br(big)]
pub struct Tkhd {
    pub(crate) version: u8,
    _flags: [u8; 3],
    /// Seconds since midnight, 1904-01-01 UTC.
    #[br(parse_with = versioned_u64, args(version))]
    pub(crate) creation_time: u64,
    /// Seconds since midnight, 1904-01-01 UTC.
    #[br(parse_with = versioned_u64, args(version))]
    pub(crate) modification_time: u64,
    /// Uniquely identifies the track.
    /// Value 0 cannot be used.
    pub(crate) track_id: u32,
    _reserved1: [u8; 4],
    /// Duration in the movie's time coordinate system.
    #[br(parse_with = versioned_u64, args(version))]
    pub(crate) duration: u64,
    _reserved2: [u8; 8],
    /// This track's spatial priority in its movie.
    pub(crate) layer: i16,
    /// Identifies a collection of movie tracks that contain
    /// alternate data for one another.
    pub(crate) alternate_group: i16,
    /// 8.8 fixed-point playback volume. 1.0 indicates normal volume.
    pub(crate) volume: u16,
    _reserved3: [u8; 2],
    /// The matrix structure associated with this track.
    pub(crate) matrix: [u8; 36],
    /// 16.16 fixed-point track width in pixels.
    pub(crate) track_width: u32,
    /// 16.16 fixed-point track height in pixels.
    pub(crate) track_height: u32,
}

impl Tkhd {
    /// Minimum payload for a version 0 box (C: 21 * 4 bytes).
    const MIN_SIZE: u64 = 84;

    pub(crate) fn read(reader: &mut Mp4Reader, max_bytes: u64) -> Result<Self, Mp4Error> {
        if max_bytes < Self::MIN_SIZE {
            return Err(Mp4Error::Invalid(format!(
                "'tkhd' payload of {max_bytes} bytes, expected {} min",
                Self::MIN_SIZE
            )));
        }
        // 96 bytes covers a version 1 box.
        let mut crs = reader.cursor(max_bytes.min(96))?;
        let tkhd: Tkhd = crs.read_be()?;
        debug!("# tkhd: version={}", tkhd.version);
        debug!("# tkhd: track_ID={}", tkhd.track_id);
        debug!("# tkhd: duration={}", tkhd.duration);
        debug!("# tkhd: layer={} alternate_group={}", tkhd.layer, tkhd.alternate_group);
        debug!("# tkhd: width={:.2} height={:.2}", tkhd.width(), tkhd.height());
        Ok(tkhd)
    }

    pub fn track_id(&self) -> u32 {
        self.track_id
    }

    /// Presentation width in pixels.
    pub fn width(&self) -> f64 {
        self.track_width as f64 / 65536.
    }

    /// Presentation height in pixels.
    pub fn height(&self) -> f64 {
        self.track_height as f64 / 65536.
    }

    /// Playback volume. 1.0 is normal volume.
    pub fn volume(&self) -> f64 {
        self.volume as f64 / 256.
    }
}

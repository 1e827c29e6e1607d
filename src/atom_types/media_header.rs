//! Media information header boxes (`vmhd`, `smhd`, `hmhd`, `nmhd`).
//!
//! One of these sits in every `minf`; the values are logged only.
//!
//! Location: `moov/trak[multiple]/mdia/minf`

use binrw::{BinRead, BinReaderExt};
use log::debug;

use crate::{reader::Mp4Reader, Mp4Error};

/// Video media information header box (`vmhd`).
#[derive(Debug, Default, BinRead)]
#[br(big)]
pub struct Vmhd {
    _version: u8,
    _flags: [u8; 3],
    pub(crate) graphics_mode: u16,
    pub(crate) op_color: [u16; 3],
}

impl Vmhd {
    /// Minimum payload (C: 3 * 4 bytes).
    const MIN_SIZE: u64 = 12;

    pub(crate) fn read(reader: &mut Mp4Reader, max_bytes: u64) -> Result<Self, Mp4Error> {
        if max_bytes < Self::MIN_SIZE {
            return Err(Mp4Error::Invalid(format!(
                "'vmhd' payload of {max_bytes} bytes, expected {} min",
                Self::MIN_SIZE
            )));
        }
        let mut crs = reader.cursor(Self::MIN_SIZE)?;
        let vmhd: Vmhd = crs.read_be()?;
        debug!("# vmhd: graphicsmode={}", vmhd.graphics_mode);
        debug!(
            "# vmhd: opcolor=({},{},{})",
            vmhd.op_color[0], vmhd.op_color[1], vmhd.op_color[2]
        );
        Ok(vmhd)
    }
}

/// Sound media information header box (`smhd`).
#[derive(Debug, Default, BinRead)]
#[br(big)]
pub struct Smhd {
    _version: u8,
    _flags: [u8; 3],
    /// 8.8 fixed-point stereo balance, 0 = center.
    pub(crate) balance: i16,
    _reserved: u16,
}

impl Smhd {
    /// Minimum payload (C: 2 * 4 bytes).
    const MIN_SIZE: u64 = 8;

    pub(crate) fn read(reader: &mut Mp4Reader, max_bytes: u64) -> Result<Self, Mp4Error> {
        if max_bytes < Self::MIN_SIZE {
            return Err(Mp4Error::Invalid(format!(
                "'smhd' payload of {max_bytes} bytes, expected {} min",
                Self::MIN_SIZE
            )));
        }
        let mut crs = reader.cursor(Self::MIN_SIZE)?;
        let smhd: Smhd = crs.read_be()?;
        debug!("# smhd: balance={:.2}", smhd.balance as f64 / 256.);
        Ok(smhd)
    }
}

/// Hint media information header box (`hmhd`).
#[derive(Debug, Default, BinRead)]
#[br(big)]
pub struct Hmhd {
    _version: u8,
    _flags: [u8; 3],
    pub(crate) max_pdu_size: u16,
    pub(crate) avg_pdu_size: u16,
    pub(crate) max_bitrate: u32,
    pub(crate) avg_bitrate: u32,
    _reserved: u32,
}

impl Hmhd {
    /// Minimum payload (C: 5 * 4 bytes).
    const MIN_SIZE: u64 = 20;

    pub(crate) fn read(reader: &mut Mp4Reader, max_bytes: u64) -> Result<Self, Mp4Error> {
        if max_bytes < Self::MIN_SIZE {
            return Err(Mp4Error::Invalid(format!(
                "'hmhd' payload of {max_bytes} bytes, expected {} min",
                Self::MIN_SIZE
            )));
        }
        let mut crs = reader.cursor(Self::MIN_SIZE)?;
        let hmhd: Hmhd = crs.read_be()?;
        debug!(
            "# hmhd: maxPDUsize={} avgPDUsize={} maxbitrate={} avgbitrate={}",
            hmhd.max_pdu_size, hmhd.avg_pdu_size, hmhd.max_bitrate, hmhd.avg_bitrate
        );
        Ok(hmhd)
    }
}

/// Null media information header box (`nmhd`).
/// Version and flags only.
#[derive(Debug, Default, BinRead)]
#[br(big)]
pub struct Nmhd {
    _version: u8,
    _flags: [u8; 3],
}

impl Nmhd {
    const MIN_SIZE: u64 = 4;

    pub(crate) fn read(reader: &mut Mp4Reader, max_bytes: u64) -> Result<Self, Mp4Error> {
        if max_bytes < Self::MIN_SIZE {
            return Err(Mp4Error::Invalid(format!(
                "'nmhd' payload of {max_bytes} bytes, expected {} min",
                Self::MIN_SIZE
            )));
        }
        let mut crs = reader.cursor(Self::MIN_SIZE)?;
        let nmhd: Nmhd = crs.read_be()?;
        debug!("# nmhd: parsed");
        Ok(nmhd)
    }
}

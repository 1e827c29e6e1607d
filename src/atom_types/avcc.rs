//! AVC decoder configuration record (`avcC`).
//!
//! Nested inside an `avc1` sample entry of a video `stsd` box.
//! The first SPS and the first PPS are captured verbatim; any
//! further parameter sets are skipped.

use std::io::{Cursor, Read, Seek, SeekFrom};

use binrw::BinReaderExt;
use log::debug;

use crate::Mp4Error;

/// AVC decoder configuration (`avcC`): NALU length size plus the
/// first SPS/PPS blobs, kept exactly as stored.
#[derive(Debug, Default)]
pub struct AvcConfiguration {
    /// Bytes used for NALU length prefixes (1, 2 or 4).
    pub(crate) length_size: u8,
    pub(crate) sps: Option<Vec<u8>>,
    pub(crate) pps: Option<Vec<u8>>,
}

impl AvcConfiguration {
    pub(crate) fn read(
        crs: &mut Cursor<Vec<u8>>,
        max_bytes: u64,
    ) -> Result<Self, Mp4Error> {
        let mut min_bytes = 6_u64;
        if max_bytes < min_bytes {
            return Err(Mp4Error::Invalid(format!(
                "'avcC' payload of {max_bytes} bytes, expected {min_bytes} min"
            )));
        }

        // version, profile, profile compatibility, level
        let head = crs.read_be::<u32>()?;
        debug!(
            "# avcC: version={} profile={} profile_compat={} level={}",
            (head >> 24) & 0xFF,
            (head >> 16) & 0xFF,
            (head >> 8) & 0xFF,
            head & 0xFF
        );

        let val16 = crs.read_be::<u16>()?;
        let length_size = (((val16 >> 8) & 0x3) + 1) as u8;
        let sps_count = (val16 & 0x1F) as usize;
        debug!("# avcC: length_size={length_size} sps_count={sps_count}");

        let mut config = Self {
            length_size,
            sps: None,
            pps: None,
        };

        min_bytes += 2 * sps_count as u64;
        if max_bytes < min_bytes {
            return Err(Mp4Error::Invalid(format!(
                "'avcC' payload of {max_bytes} bytes for {sps_count} SPS"
            )));
        }

        for _ in 0..sps_count {
            let sps_length = crs.read_be::<u16>()? as usize;
            debug!("# avcC: sps_length={sps_length}");

            min_bytes += sps_length as u64;
            if max_bytes < min_bytes {
                return Err(Mp4Error::Invalid(format!(
                    "'avcC' payload of {max_bytes} bytes, SPS of {sps_length}"
                )));
            }

            if config.sps.is_none() && sps_length > 0 {
                // first SPS found
                let mut sps = vec![0_u8; sps_length];
                crs.read_exact(&mut sps)?;
                config.sps = Some(sps);
            } else {
                // ignore any other SPS
                crs.seek(SeekFrom::Current(sps_length as i64))?;
            }
        }

        min_bytes += 1;
        if max_bytes < min_bytes {
            return Err(Mp4Error::Invalid(format!(
                "'avcC' payload of {max_bytes} bytes, missing PPS count"
            )));
        }

        let pps_count = crs.read_be::<u8>()? as usize;
        debug!("# avcC: pps_count={pps_count}");

        min_bytes += 2 * pps_count as u64;
        if max_bytes < min_bytes {
            return Err(Mp4Error::Invalid(format!(
                "'avcC' payload of {max_bytes} bytes for {pps_count} PPS"
            )));
        }

        for _ in 0..pps_count {
            let pps_length = crs.read_be::<u16>()? as usize;
            debug!("# avcC: pps_length={pps_length}");

            min_bytes += pps_length as u64;
            if max_bytes < min_bytes {
                return Err(Mp4Error::Invalid(format!(
                    "'avcC' payload of {max_bytes} bytes, PPS of {pps_length}"
                )));
            }

            if config.pps.is_none() && pps_length > 0 {
                // first PPS found
                let mut pps = vec![0_u8; pps_length];
                crs.read_exact(&mut pps)?;
                config.pps = Some(pps);
            } else {
                // ignore any other PPS
                crs.seek(SeekFrom::Current(pps_length as i64))?;
            }
        }

        Ok(config)
    }
}

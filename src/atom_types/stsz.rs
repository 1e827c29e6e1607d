//! Sample size box (`stsz`).
//!
//! Location: `moov/trak[multiple]/mdia/minf/stbl/stsz`
//!
//! A uniform `sample_size` of 0 means every sample has its own
//! entry in the table; otherwise the single value applies to all
//! `sample_count` samples. Note that `stsz` lists sample sizes,
//! not chunk sizes.
//!
//! See: <https://developer.apple.com/documentation/quicktime-file-format/sample_size_atom>

use log::debug;

use crate::{reader::Mp4Reader, Mp4Error};

/// Sample size box (`stsz`), expanded to one size per sample.
#[derive(Debug, Default)]
pub struct Stsz {
    pub(crate) sample_count: u32,
    /// One entry per sample, literal or replicated
    /// from the uniform size.
    pub(crate) sizes: Vec<u32>,
}

impl Stsz {
    pub(crate) fn read(reader: &mut Mp4Reader, max_bytes: u64) -> Result<Self, Mp4Error> {
        if max_bytes < 12 {
            return Err(Mp4Error::Invalid(format!(
                "'stsz' payload of {max_bytes} bytes, expected 12 min"
            )));
        }

        let _version_flags = reader.read_be::<u32>()?;
        let sample_size = reader.read_be::<u32>()?;
        let sample_count = reader.read_be::<u32>()?;
        debug!("# stsz: sample_size={sample_size}");
        debug!("# stsz: sample_count={sample_count}");

        let mut sizes = Vec::new();
        sizes.try_reserve_exact(sample_count as usize)?;

        if sample_size == 0 {
            if max_bytes < 12 + sample_count as u64 * 4 {
                return Err(Mp4Error::Invalid(format!(
                    "'stsz' payload of {max_bytes} bytes for {sample_count} entries"
                )));
            }
            for _ in 0..sample_count {
                sizes.push(reader.read_be::<u32>()?);
            }
        } else {
            sizes.resize(sample_count as usize, sample_size);
        }

        Ok(Self {
            sample_count,
            sizes,
        })
    }
}

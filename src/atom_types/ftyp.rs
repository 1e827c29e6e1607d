//! File type compatibility box (`ftyp`).
//!
//! Location: `ftyp` (usually the very first box in an MP4 file)
//!
//! Parsed and logged only; no brand allow-list is enforced.
//!
//! See: <https://developer.apple.com/documentation/quicktime-file-format/file_type_compatibility_atom>

use log::debug;

use crate::{reader::Mp4Reader, support::string_from_be_u32, Mp4Error};

/// File type compatibility box (`ftyp`).
#[derive(Debug, Default)]
pub struct Ftyp {
    pub(crate) major_brand: u32,
    pub(crate) minor_version: u32,
    pub(crate) compatible_brands: Vec<u32>,
}

impl Ftyp {
    pub(crate) fn read(reader: &mut Mp4Reader, max_bytes: u64) -> Result<Self, Mp4Error> {
        if max_bytes < 8 {
            return Err(Mp4Error::Invalid(format!(
                "'ftyp' payload of {max_bytes} bytes, expected 8 min"
            )));
        }

        let major_brand = reader.read_be::<u32>()?;
        let minor_version = reader.read_be::<u32>()?;
        debug!("# ftyp: major_brand={}", string_from_be_u32(major_brand));
        debug!("# ftyp: minor_version={minor_version}");

        let n = ((max_bytes - 8) / 4) as usize;
        let compatible_brands = reader.read_many_be::<u32>(n)?;
        for (k, brand) in compatible_brands.iter().enumerate() {
            debug!("# ftyp: compatible_brands[{k}]={}", string_from_be_u32(*brand));
        }

        Ok(Self {
            major_brand,
            minor_version,
            compatible_brands,
        })
    }

    pub fn major_brand(&self) -> String {
        string_from_be_u32(self.major_brand)
    }

    pub fn compatible_brands(&self) -> Vec<String> {
        self.compatible_brands
            .iter()
            .map(|b| string_from_be_u32(*b))
            .collect()
    }
}

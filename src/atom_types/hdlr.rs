//! Handler reference box (`hdlr`).
//!
//! Declares the media type of a track when found under `mdia`;
//! also appears under `meta`, where it names the metadata handler.
//!
//! See: <https://developer.apple.com/documentation/quicktime-file-format/handler_reference_atom>

use std::io::Read;

use binrw::{BinRead, BinReaderExt};
use log::debug;

use crate::{reader::Mp4Reader, support::string_from_be_u32, Mp4Error};

/// Handler reference box (`hdlr`).
#[derive(Debug, Default, BinRead)]
#[br(big)]
pub struct Hdlr {
    _version: u8,
    _flags: [u8; 3],
    _pre_defined: u32,
    /// Four CC for the type of media handled,
    /// e.g. `vide`, `soun`, `hint`, `meta`, `text`.
    pub(crate) handler_type: u32,
    _reserved: [u32; 3],
    /// Human-readable handler name, null terminated.
    ///
    /// Parsed separately since old QuickTime files store it
    /// as a counted string instead.
    #[br(ignore)]
    pub(crate) name: String,
}

impl Hdlr {
    /// Minimum payload (C: 6 * 4 bytes).
    const MIN_SIZE: u64 = 24;

    pub(crate) fn read(reader: &mut Mp4Reader, max_bytes: u64) -> Result<Self, Mp4Error> {
        if max_bytes < Self::MIN_SIZE {
            return Err(Mp4Error::Invalid(format!(
                "'hdlr' payload of {max_bytes} bytes, expected {} min",
                Self::MIN_SIZE
            )));
        }
        let mut crs = reader.cursor(max_bytes)?;
        let mut hdlr: Hdlr = crs.read_be()?;

        // Remainder of the payload is the handler name; stop at the
        // first NUL, tolerate its absence.
        let mut raw = Vec::new();
        crs.read_to_end(&mut raw)?;
        let end = raw.iter().position(|b| *b == 0).unwrap_or(raw.len());
        hdlr.name = raw[..end].iter().map(|b| *b as char).collect();

        debug!("# hdlr: handler_type={}", string_from_be_u32(hdlr.handler_type));
        debug!("# hdlr: name={}", hdlr.name);
        Ok(hdlr)
    }

    /// Handler type as a printable string.
    pub fn handler_type(&self) -> String {
        string_from_be_u32(self.handler_type)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

//! Box header decoding.
//!
//! ```ignore
//! | [X X X X] [Y Y Y Y] [Z Z Z Z Z Z Z Z] [16 bytes]   |
//!    |         |         |                 |
//!    |         |         |                 extended `uuid` type
//!    |         |         |                 (only if FourCC == "uuid")
//!    |         |         64bit size (only if 32 bit size == 1)
//!    |         FourCC
//!    32bit size
//! ```

use crate::{reader::Mp4Reader, FourCC, Mp4Error};

/// Decoded box header. 8, 16, 24 or 32 bytes in the file,
/// depending on the 64-bit size escape and the `uuid` extension.
#[derive(Debug, Clone, Default)]
pub struct BoxHeader {
    /// FourCC.
    pub(crate) name: FourCC,
    /// Raw big-endian box type. Needed where the "FourCC" is
    /// not a character code at all, e.g. the integer-indexed
    /// `ilst` children of the `meta` metadata dialect.
    pub(crate) raw_type: u32,
    /// Absolute byte offset for start of box in the MP4,
    /// i.e. byte offset of its 32-bit size field.
    pub(crate) offset: u64,
    /// Total box size in bytes including the header.
    pub(crate) size: u64,
    /// Header size in bytes as stored.
    pub(crate) header_size: u8,
    /// Extended type, present when the FourCC is `uuid`.
    pub(crate) uuid: Option<[u8; 16]>,
    /// Set when the 32-bit size field was 0,
    /// i.e. the box extends to the end of the file.
    /// Only valid at the outermost level.
    pub(crate) to_eof: bool,
}

impl BoxHeader {
    /// Reads the box header at the current position.
    ///
    /// `budget` is the number of bytes the surrounding box (or the
    /// file, at the outermost level) still grants; a declared size
    /// exceeding it is a hard error. `root` permits the `size == 0`
    /// run-to-end-of-file escape, which is a format error when nested.
    ///
    /// On return the reader is positioned at the first payload byte.
    pub(crate) fn read(
        reader: &mut Mp4Reader,
        budget: u64,
        root: bool,
    ) -> Result<Self, Mp4Error> {
        let offset = reader.pos()?;

        let size32 = reader.read_be::<u32>()?;
        let raw_type = reader.read_be::<u32>()?;
        let name = FourCC::from_u32(raw_type);

        let mut header_size = 8_u8;
        let mut to_eof = false;

        let size = match size32 {
            0 => {
                // Box extends to end of file; nesting this would
                // swallow the remainder of the parent.
                if !root {
                    return Err(Mp4Error::Invalid(format!(
                        "nested zero-sized box '{name}' @ offset {offset}"
                    )));
                }
                to_eof = true;
                reader.len() - offset
            }
            1 => {
                if budget < 16 {
                    return Err(Mp4Error::Invalid(format!(
                        "truncated 64-bit box header @ offset {offset}"
                    )));
                }
                let largesize = reader.read_be::<u64>()?;
                header_size = 16;
                if largesize < 16 {
                    return Err(Mp4Error::Invalid(format!(
                        "64-bit box size {largesize} @ offset {offset}"
                    )));
                }
                largesize
            }
            2..=7 => {
                return Err(Mp4Error::Invalid(format!(
                    "box size {size32} @ offset {offset}"
                )));
            }
            n => n as u64,
        };

        let mut header = Self {
            name,
            raw_type,
            offset,
            size,
            header_size,
            uuid: None,
            to_eof,
        };

        if header.name == FourCC::Uuid {
            if header.data_size() < 16 {
                return Err(Mp4Error::Invalid(format!(
                    "'uuid' box without extended type @ offset {offset}"
                )));
            }
            let uuid = reader.read_be::<[u8; 16]>()?;
            header.uuid = Some(uuid);
            header.header_size += 16;
        }

        if header.size > budget {
            return Err(Mp4Error::Invalid(format!(
                "box '{}' size {} exceeds remaining {budget} bytes @ offset {offset}",
                header.name, header.size
            )));
        }

        Ok(header)
    }

    pub fn name(&self) -> &FourCC {
        &self.name
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Total box size including the header.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Data load absolute offset,
    /// i.e. position after the header,
    /// adjusted for 64-bit size and `uuid` extension.
    pub fn data_offset(&self) -> u64 {
        self.offset + self.header_size as u64
    }

    /// Size of the data load (excludes the header).
    pub fn data_size(&self) -> u64 {
        self.size - self.header_size as u64
    }

    /// Absolute offset of the next sibling box.
    pub fn offset_next_abs(&self) -> u64 {
        self.offset + self.size
    }
}

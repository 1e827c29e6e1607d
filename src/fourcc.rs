//! MP4 box FourCC.
//! See box type in <https://developer.apple.com/documentation/quicktime-file-format/atoms>.
//!
//! Only box types the demuxer extracts fields from are enumerated.
//! Everything else maps to `FourCC::Custom`, including the
//! integer-typed `ilst` index boxes of the `meta` metadata dialect.

use std::fmt::Display;

/// MP4 box Four CC.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FourCC {
    /// AVC decoder configuration (inside `stsd` video entry)
    AvcC,
    /// Chunk offset, 64-bit values
    Co64,
    /// Metadata value box (`ilst` child payload)
    Data,
    /// Data Information Box
    Dinf,
    Free,
    Ftyp,
    Hdlr,
    /// Hint media header
    Hmhd,
    /// Metadata item list
    Ilst,
    /// Metadata key table
    Keys,
    Mdat,
    Mdhd,
    Mdia,
    /// Metadata container (`moov/meta` or `moov/udta/meta`)
    Meta,
    Minf,
    /// Movie Box
    Moov,
    /// Movie Header Box
    Mvhd,
    /// Null media header
    Nmhd,
    Smhd,
    Stbl,
    /// Chunk offset, 32-bit values
    Stco,
    Stsc,
    Stsd,
    Stss,
    Stsz,
    Stts,
    Tkhd,
    /// Track description
    Trak,
    Tref,
    /// User data
    Udta,
    /// Extended box type with 16-byte identifier
    Uuid,
    Vmhd,
    /// Location string (`©xyz`, inside `udta`)
    Xyz,

    Custom(String),
}

impl Display for FourCC {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FourCC {
    pub fn from_slice(fourcc: &[u8]) -> Self {
        assert_eq!(fourcc.len(), 4, "FourCC must have size 4.");
        match fourcc {
            b"avcC" => Self::AvcC,
            b"co64" => Self::Co64,
            b"data" => Self::Data,
            b"dinf" => Self::Dinf,
            b"free" => Self::Free,
            b"ftyp" => Self::Ftyp,
            b"hdlr" => Self::Hdlr,
            b"hmhd" => Self::Hmhd,
            b"ilst" => Self::Ilst,
            b"keys" => Self::Keys,
            b"mdat" => Self::Mdat,
            b"mdhd" => Self::Mdhd,
            b"mdia" => Self::Mdia,
            b"meta" => Self::Meta,
            b"minf" => Self::Minf,
            b"moov" => Self::Moov,
            b"mvhd" => Self::Mvhd,
            b"nmhd" => Self::Nmhd,
            b"smhd" => Self::Smhd,
            b"stbl" => Self::Stbl,
            b"stco" => Self::Stco,
            b"stsc" => Self::Stsc,
            b"stsd" => Self::Stsd,
            b"stss" => Self::Stss,
            b"stsz" => Self::Stsz,
            b"stts" => Self::Stts,
            b"tkhd" => Self::Tkhd,
            b"trak" => Self::Trak,
            b"tref" => Self::Tref,
            b"udta" => Self::Udta,
            b"uuid" => Self::Uuid,
            b"vmhd" => Self::Vmhd,
            // '©' is 0xA9, i.e. outside ASCII but valid ISO8859-1
            [0xa9, b'x', b'y', b'z'] => Self::Xyz,

            // UTF-8 does not work for single-byte char above 127
            // but ISO8859-1 mapping works for range 128-255
            _ => Self::Custom(
                fourcc
                    .iter()
                    .map(|n| *n as char)
                    .collect::<String>()
                ),
        }
    }

    pub fn from_u32(value: u32) -> Self {
        Self::from_slice(&value.to_be_bytes())
    }

    pub fn to_str(&self) -> &str {
        match self {
            Self::AvcC => "avcC",
            Self::Co64 => "co64",
            Self::Data => "data",
            Self::Dinf => "dinf",
            Self::Free => "free",
            Self::Ftyp => "ftyp",
            Self::Hdlr => "hdlr",
            Self::Hmhd => "hmhd",
            Self::Ilst => "ilst",
            Self::Keys => "keys",
            Self::Mdat => "mdat",
            Self::Mdhd => "mdhd",
            Self::Mdia => "mdia",
            Self::Meta => "meta",
            Self::Minf => "minf",
            Self::Moov => "moov",
            Self::Mvhd => "mvhd",
            Self::Nmhd => "nmhd",
            Self::Smhd => "smhd",
            Self::Stbl => "stbl",
            Self::Stco => "stco",
            Self::Stsc => "stsc",
            Self::Stsd => "stsd",
            Self::Stss => "stss",
            Self::Stsz => "stsz",
            Self::Stts => "stts",
            Self::Tkhd => "tkhd",
            Self::Trak => "trak",
            Self::Tref => "tref",
            Self::Udta => "udta",
            Self::Uuid => "uuid",
            Self::Vmhd => "vmhd",
            Self::Xyz => "\u{a9}xyz",
            Self::Custom(s) => s.as_str(),
        }
    }
}

impl Default for FourCC {
    fn default() -> Self {
        Self::Custom("Unknown".to_owned())
    }
}

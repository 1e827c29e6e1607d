//! User metadata extraction and consolidation.
//!
//! Two dialects coexist in `moov`:
//! - the QuickTime `udta` dialect, where each `ilst` child box is a
//!   four-char tag (`©ART`, `©nam`, ..., `covr`) holding a `data` box;
//! - the ISO `meta` dialect, where a `keys` box lists namespaced key
//!   strings and each `ilst` child box type is the 1-based integer
//!   index of its key.
//!
//! Which dialect an `ilst` belongs to is decided by its parent chain
//! (a `udta` ancestor or not), never by inspecting the integer value.
//! The separately parsed `©xyz` location box joins the final
//! dictionary as a third source.

use log::debug;

use crate::{
    consts::METADATA_KEY_COVER,
    reader::Mp4Reader,
    support::string_from_be_u32,
    Mp4Error,
};

/// Which metadata dialect the surrounding `ilst` belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IlstScope {
    /// `moov/udta/meta/ilst` (or `moov/udta/ilst`): four-char tags.
    Udta,
    /// `moov/meta/ilst`: integer indices into the `keys` table.
    Meta,
}

/// `data` box payload classes.
const CLASS_UTF8: u32 = 1;
const CLASS_JPEG: u32 = 13;
const CLASS_PNG: u32 = 14;
const CLASS_BMP: u32 = 27;

/// The `udta` tags whose UTF-8 payload is kept, compared with the
/// leading `©` byte masked off.
const TAG_ARTIST: u32 = u32::from_be_bytes([0, b'A', b'R', b'T']);
const TAG_TITLE: u32 = u32::from_be_bytes([0, b'n', b'a', b'm']);
const TAG_DATE: u32 = u32::from_be_bytes([0, b'd', b'a', b'y']);
const TAG_COMMENT: u32 = u32::from_be_bytes([0, b'c', b'm', b't']);
const TAG_COPYRIGHT: u32 = u32::from_be_bytes([0, b'c', b'p', b'y']);
const TAG_MAKER: u32 = u32::from_be_bytes([0, b'm', b'a', b'k']);
const TAG_MODEL: u32 = u32::from_be_bytes([0, b'm', b'o', b'd']);
const TAG_VERSION: u32 = u32::from_be_bytes([0, b's', b'w', b'r']);
const TAG_ENCODER: u32 = u32::from_be_bytes([0, b't', b'o', b'o']);
const TAG_COVER: u32 = u32::from_be_bytes(*b"covr");

/// One consolidated metadata string pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataEntry {
    pub key: String,
    pub value: String,
}

/// Image format of an embedded cover blob,
/// implied by the `data` class byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverKind {
    Jpeg,
    Png,
    Bmp,
}

/// Embedded cover art, addressed by absolute file offset and length.
#[derive(Debug, Clone, Copy)]
pub struct Cover {
    pub(crate) offset: u64,
    pub(crate) size: u32,
    pub(crate) kind: CoverKind,
}

impl Cover {
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn kind(&self) -> CoverKind {
        self.kind
    }
}

/// Parse-time scratch for the metadata sources; consolidated once
/// the tree walk completes.
#[derive(Debug, Default)]
pub(crate) struct MetadataBuckets {
    /// Ordered keys from `moov/meta/keys` (1-based in the file).
    pub(crate) meta_keys: Vec<String>,
    /// Values collected for `meta_keys`, index-aligned.
    pub(crate) meta_values: Vec<Option<String>>,
    /// Tag/value pairs from the `udta` dialect, in document order.
    pub(crate) udta_entries: Vec<(String, String)>,
    /// The `©xyz` location pair.
    pub(crate) location: Option<(String, String)>,
    pub(crate) udta_cover: Option<Cover>,
    pub(crate) meta_cover: Option<Cover>,
}

impl MetadataBuckets {
    /// Parses the `keys` box (`moov/meta/keys`): an entry count,
    /// then `(size, namespace, bytes)` per key.
    pub(crate) fn parse_keys(
        &mut self,
        reader: &mut Mp4Reader,
        max_bytes: u64,
    ) -> Result<(), Mp4Error> {
        if max_bytes < 8 {
            return Err(Mp4Error::Invalid(format!(
                "'keys' payload of {max_bytes} bytes, expected 8 min"
            )));
        }

        let _version_flags = reader.read_be::<u32>()?;
        let entry_count = reader.read_be::<u32>()?;
        debug!("# keys: entry_count={entry_count}");

        if max_bytes < 4 + entry_count as u64 * 8 {
            return Err(Mp4Error::Invalid(format!(
                "'keys' payload of {max_bytes} bytes for {entry_count} entries"
            )));
        }

        let mut read = 8_u64;
        for i in 0..entry_count {
            let key_size = reader.read_be::<u32>()?;
            if key_size < 8 {
                return Err(Mp4Error::Invalid(format!(
                    "'keys' key_size {key_size}, expected 8 min"
                )));
            }
            let key_size = key_size as u64 - 8;

            let namespace = reader.read_be::<u32>()?;
            debug!("# keys: key_namespace={}", string_from_be_u32(namespace));
            read += 8;

            if max_bytes - read < key_size {
                return Err(Mp4Error::Invalid(format!(
                    "'keys' payload of {max_bytes} bytes, key of {key_size}"
                )));
            }
            let key = reader.read_string(key_size as usize)?;
            read += key_size;
            debug!("# keys: key_value[{i}]={key}");
            self.meta_keys.push(key);
        }

        self.meta_values = vec![None; self.meta_keys.len()];
        Ok(())
    }

    /// Parses the `©xyz` location box under `udta`:
    /// `u16` size, `u16` language code, then the ISO 6709 string.
    pub(crate) fn parse_xyz(
        &mut self,
        reader: &mut Mp4Reader,
        max_bytes: u64,
        box_type: u32,
    ) -> Result<(), Mp4Error> {
        if max_bytes < 4 {
            return Err(Mp4Error::Invalid(format!(
                "'\u{a9}xyz' payload of {max_bytes} bytes, expected 4 min"
            )));
        }

        let location_size = reader.read_be::<u16>()? as u64;
        let language_code = reader.read_be::<u16>()?;
        debug!("# xyz: location_size={location_size} language_code={language_code}");

        if max_bytes < 4 + location_size {
            return Err(Mp4Error::Invalid(format!(
                "'\u{a9}xyz' payload of {max_bytes} bytes, location of {location_size}"
            )));
        }

        let value = reader.read_string(location_size as usize)?;
        debug!("# xyz: location={value}");
        self.location = Some((string_from_be_u32(box_type), value));
        Ok(())
    }

    /// Parses a `data` box inside an `ilst` child: version + class,
    /// reserved, then a payload interpreted per class.
    ///
    /// `tag` is the raw type of the enclosing `ilst` child box: a
    /// four-char tag in the `udta` dialect, a 1-based key index in
    /// the `meta` dialect.
    pub(crate) fn parse_data(
        &mut self,
        reader: &mut Mp4Reader,
        max_bytes: u64,
        tag: u32,
        scope: IlstScope,
    ) -> Result<(), Mp4Error> {
        if max_bytes < 9 {
            return Err(Mp4Error::Invalid(format!(
                "'data' payload of {max_bytes} bytes, expected 9 min"
            )));
        }

        let class = reader.read_be::<u32>()? & 0xFF;
        let _reserved = reader.read_be::<u32>()?;
        debug!("# data: class={class}");

        let value_len = max_bytes - 8;

        match class {
            CLASS_UTF8 => match scope {
                IlstScope::Udta => {
                    // the tag carries a leading '©' byte; compare without it
                    match tag & 0x00FF_FFFF {
                        TAG_ARTIST | TAG_TITLE | TAG_DATE | TAG_COMMENT
                        | TAG_COPYRIGHT | TAG_MAKER | TAG_MODEL | TAG_VERSION
                        | TAG_ENCODER => {
                            let key = string_from_be_u32(tag);
                            let value = reader.read_string(value_len as usize)?;
                            debug!("# data: value[{key}]={value}");
                            self.udta_entries.push((key, value));
                        }
                        _ => {}
                    }
                }
                IlstScope::Meta => {
                    if tag >= 1 && (tag as usize) <= self.meta_keys.len() {
                        let value = reader.read_string(value_len as usize)?;
                        debug!("# data: value[{}]={value}", self.meta_keys[tag as usize - 1]);
                        self.meta_values[tag as usize - 1] = Some(value);
                    }
                }
            },
            CLASS_JPEG | CLASS_PNG | CLASS_BMP => {
                let kind = match class {
                    CLASS_PNG => CoverKind::Png,
                    CLASS_BMP => CoverKind::Bmp,
                    _ => CoverKind::Jpeg,
                };
                let cover = Cover {
                    offset: reader.pos()?,
                    size: value_len as u32,
                    kind,
                };
                match scope {
                    IlstScope::Udta if tag == TAG_COVER => {
                        debug!(
                            "# data: udta cover offset={:#x} size={} kind={:?}",
                            cover.offset, cover.size, cover.kind
                        );
                        self.udta_cover = Some(cover);
                    }
                    IlstScope::Meta
                        if tag >= 1
                            && (tag as usize) <= self.meta_keys.len()
                            && self.meta_keys[tag as usize - 1] == METADATA_KEY_COVER =>
                    {
                        debug!(
                            "# data: meta cover offset={:#x} size={} kind={:?}",
                            cover.offset, cover.size, cover.kind
                        );
                        self.meta_cover = Some(cover);
                    }
                    _ => {}
                }
            }
            _ => {}
        }

        Ok(())
    }

    /// Merges the three sources into the final dictionary: `meta`
    /// entries first, then `udta` entries, then the location pair,
    /// skipping pairs with an empty key or value. The final cover
    /// prefers the `meta` blob over the `udta` one.
    pub(crate) fn consolidate(self) -> (Vec<MetadataEntry>, Option<Cover>) {
        let mut entries = Vec::new();

        for (key, value) in self.meta_keys.iter().zip(self.meta_values.iter()) {
            if let Some(value) = value {
                if !key.is_empty() && !value.is_empty() {
                    entries.push(MetadataEntry {
                        key: key.clone(),
                        value: value.clone(),
                    });
                }
            }
        }

        for (key, value) in self.udta_entries {
            if !key.is_empty() && !value.is_empty() {
                entries.push(MetadataEntry { key, value });
            }
        }

        if let Some((key, value)) = self.location {
            if !key.is_empty() && !value.is_empty() {
                entries.push(MetadataEntry { key, value });
            }
        }

        let cover = self.meta_cover.or(self.udta_cover);
        (entries, cover)
    }
}

//! Recursive box-tree walk and handler dispatch.
//!
//! A single routine reads sibling boxes until the parent's byte
//! budget is exhausted, allocates a tree node for every box, and
//! hands recognised types to their grammar decoder. Unknown box
//! types are never an error: the node is kept and the payload
//! skipped. Handlers that consume less than the declared payload
//! are tolerated the same way, by an absolute seek to the next box.

use std::io::SeekFrom;

use log::debug;

use crate::{
    atom::{BoxHeader, BoxTree, NodeId},
    atom_types::{
        Co64, Ftyp, Hdlr, Hmhd, Mdhd, Mvhd, Nmhd, Smhd, Stco, Stsc, Stsd, StsdEntry,
        Stss, Stsz, Stts, Tkhd, Tref, Vmhd,
    },
    metadata::{IlstScope, MetadataBuckets},
    reader::Mp4Reader,
    track::{Track, TrackType},
    FourCC, Mp4Error,
};

/// Everything the tree walk produces; consumed by `Mp4Demux::open`.
#[derive(Debug, Default)]
pub(crate) struct Parsed {
    pub(crate) tree: BoxTree,
    pub(crate) movie: MovieHeader,
    pub(crate) tracks: Vec<Track>,
    pub(crate) buckets: MetadataBuckets,
}

/// Movie-global fields from `mvhd`.
#[derive(Debug, Default)]
pub(crate) struct MovieHeader {
    pub(crate) time_scale: u32,
    pub(crate) duration: u64,
    /// Seconds since 1904-01-01 UTC.
    pub(crate) creation_time: u64,
    /// Seconds since 1904-01-01 UTC.
    pub(crate) modification_time: u64,
}

/// Parsing context, passed explicitly instead of threading a
/// "current track" pointer through global state.
#[derive(Debug, Clone, Copy, Default)]
struct Scope {
    /// Tree node of the surrounding box; `None` at the file level.
    parent: Option<NodeId>,
    /// Track under construction while inside its `trak`.
    track: Option<usize>,
    /// Metadata dialect while inside an `ilst`.
    ilst: Option<IlstScope>,
}

pub(crate) struct Parser<'a> {
    reader: &'a mut Mp4Reader,
    parsed: Parsed,
}

impl<'a> Parser<'a> {
    /// Walks the whole file and returns the collected tree, movie
    /// header, tracks and metadata buckets.
    pub(crate) fn run(reader: &'a mut Mp4Reader) -> Result<Parsed, Mp4Error> {
        let budget = reader.len();
        let mut parser = Self {
            reader,
            parsed: Parsed::default(),
        };
        parser.parse_children(Scope::default(), budget)?;
        Ok(parser.parsed)
    }

    /// Reads sibling boxes until fewer than 8 bytes of `budget`
    /// remain. Returns the number of bytes consumed.
    fn parse_children(&mut self, scope: Scope, budget: u64) -> Result<u64, Mp4Error> {
        let mut read = 0_u64;

        while read + 8 <= budget {
            let header = BoxHeader::read(self.reader, budget - read, scope.parent.is_none())?;
            debug!(
                "offset {:#x} box '{}' size {}",
                header.offset, header.name, header.size
            );

            let node = self.parsed.tree.push(scope.parent, header.clone());
            let payload_start = self.reader.pos()?;
            let payload_len = header.data_size();

            self.dispatch(&header, node, scope, payload_len)?;

            // Consume exactly the declared payload, skipping
            // whatever the handler did not recognise.
            self.reader.seek(SeekFrom::Start(payload_start + payload_len))?;
            read += header.size;

            if header.to_eof {
                break;
            }
        }

        Ok(read)
    }

    fn dispatch(
        &mut self,
        header: &BoxHeader,
        node: NodeId,
        scope: Scope,
        payload_len: u64,
    ) -> Result<(), Mp4Error> {
        let child_scope = Scope {
            parent: Some(node),
            ..scope
        };

        match header.name {
            // plain containers
            FourCC::Moov
            | FourCC::Udta
            | FourCC::Mdia
            | FourCC::Minf
            | FourCC::Dinf
            | FourCC::Stbl => {
                self.parse_children(child_scope, payload_len)?;
            }

            // the extended type was already consumed with the header
            FourCC::Uuid => {}

            FourCC::Ftyp => {
                // brands are logged, not validated
                let _ = Ftyp::read(self.reader, payload_len)?;
            }

            FourCC::Mvhd => {
                let mvhd = Mvhd::read(self.reader, payload_len)?;
                self.parsed.movie = MovieHeader {
                    time_scale: mvhd.time_scale,
                    duration: mvhd.duration,
                    creation_time: mvhd.creation_time,
                    modification_time: mvhd.modification_time,
                };
            }

            FourCC::Trak => {
                let idx = self.parsed.tracks.len();
                self.parsed.tracks.push(Track::default());
                self.parse_children(
                    Scope {
                        track: Some(idx),
                        ..child_scope
                    },
                    payload_len,
                )?;
            }

            FourCC::Tkhd => {
                let tkhd = Tkhd::read(self.reader, payload_len)?;
                let track = self.track_mut(scope, "tkhd")?;
                track.id = tkhd.track_id;
            }

            FourCC::Tref => {
                let tref = Tref::read(self.reader, payload_len)?;
                let track = self.track_mut(scope, "tref")?;
                track.reference_type = tref.reference_type;
                track.reference_track_id = tref.track_id;
            }

            FourCC::Mdhd => {
                let mdhd = Mdhd::read(self.reader, payload_len)?;
                let track = self.track_mut(scope, "mdhd")?;
                track.time_scale = mdhd.time_scale;
                track.duration = mdhd.duration;
                track.creation_time = mdhd.creation_time;
                track.modification_time = mdhd.modification_time;
            }

            FourCC::Hdlr => {
                let hdlr = Hdlr::read(self.reader, payload_len)?;
                // Only the hdlr of a `mdia` declares the track kind;
                // the one under `meta` names the metadata handler.
                if self.parsed.tree.parent_name(node) == Some(&FourCC::Mdia) {
                    if let Some(idx) = scope.track {
                        self.parsed.tracks[idx].kind =
                            TrackType::from_handler_type(hdlr.handler_type);
                    }
                }
            }

            FourCC::Vmhd => {
                let _ = Vmhd::read(self.reader, payload_len)?;
            }
            FourCC::Smhd => {
                let _ = Smhd::read(self.reader, payload_len)?;
            }
            FourCC::Hmhd => {
                let _ = Hmhd::read(self.reader, payload_len)?;
            }
            FourCC::Nmhd => {
                let _ = Nmhd::read(self.reader, payload_len)?;
            }

            FourCC::Stsd => {
                let kind = self.track_mut(scope, "stsd")?.kind;
                let stsd = Stsd::read(self.reader, payload_len, kind)?;
                let track = self.track_mut(scope, "stsd")?;
                match stsd.entry {
                    Some(StsdEntry::Video(v)) => track.video = Some(v),
                    Some(StsdEntry::Audio(a)) => track.audio = Some(a),
                    Some(StsdEntry::TimedMetadata(m)) => track.timed_metadata = Some(m),
                    None => {}
                }
            }

            FourCC::Stts => {
                let track = self.track_mut(scope, "stts")?;
                if !track.time_to_sample.is_empty() {
                    return Err(Mp4Error::Invalid(
                        "time to sample table already defined".to_owned(),
                    ));
                }
                let stts = Stts::read(self.reader, payload_len)?;
                self.track_mut(scope, "stts")?.time_to_sample = stts.entries;
            }

            FourCC::Stss => {
                let track = self.track_mut(scope, "stss")?;
                if track.sync_samples.is_some() {
                    return Err(Mp4Error::Invalid(
                        "sync sample table already defined".to_owned(),
                    ));
                }
                let stss = Stss::read(self.reader, payload_len)?;
                self.track_mut(scope, "stss")?.sync_samples = Some(stss.sample_numbers);
            }

            FourCC::Stsz => {
                let track = self.track_mut(scope, "stsz")?;
                if !track.sample_size.is_empty() {
                    return Err(Mp4Error::Invalid(
                        "sample size table already defined".to_owned(),
                    ));
                }
                let stsz = Stsz::read(self.reader, payload_len)?;
                let track = self.track_mut(scope, "stsz")?;
                track.sample_count = stsz.sample_count;
                track.sample_size = stsz.sizes;
            }

            FourCC::Stsc => {
                let track = self.track_mut(scope, "stsc")?;
                if !track.sample_to_chunk.is_empty() {
                    return Err(Mp4Error::Invalid(
                        "sample to chunk table already defined".to_owned(),
                    ));
                }
                let stsc = Stsc::read(self.reader, payload_len)?;
                self.track_mut(scope, "stsc")?.sample_to_chunk = stsc.entries;
            }

            FourCC::Stco => {
                let track = self.track_mut(scope, "stco")?;
                if !track.chunk_offset.is_empty() {
                    return Err(Mp4Error::Invalid(
                        "chunk offset table already defined".to_owned(),
                    ));
                }
                let stco = Stco::read(self.reader, payload_len)?;
                self.track_mut(scope, "stco")?.chunk_offset = stco.offsets;
            }

            FourCC::Co64 => {
                let track = self.track_mut(scope, "co64")?;
                if !track.chunk_offset.is_empty() {
                    return Err(Mp4Error::Invalid(
                        "chunk offset table already defined".to_owned(),
                    ));
                }
                let co64 = Co64::read(self.reader, payload_len)?;
                self.track_mut(scope, "co64")?.chunk_offset = co64.offsets;
            }

            FourCC::Meta => match self.parent_name(scope) {
                // the `udta` flavor is a full box with version/flags
                Some(FourCC::Udta) => {
                    if payload_len < 4 {
                        return Err(Mp4Error::Invalid(format!(
                            "'meta' payload of {payload_len} bytes, expected 4 min"
                        )));
                    }
                    // version & flags
                    self.reader.skip(4)?;
                    self.parse_children(child_scope, payload_len - 4)?;
                }
                // the QuickTime flavor directly under `moov` is not
                Some(FourCC::Moov) => {
                    self.parse_children(child_scope, payload_len)?;
                }
                _ => {}
            },

            FourCC::Ilst => {
                let ilst = match self.parsed.tree.has_ancestor(node, &FourCC::Udta) {
                    true => IlstScope::Udta,
                    false => IlstScope::Meta,
                };
                self.parse_children(
                    Scope {
                        ilst: Some(ilst),
                        ..child_scope
                    },
                    payload_len,
                )?;
            }

            FourCC::Keys => {
                if self.parent_name(scope) == Some(FourCC::Meta) {
                    self.parsed
                        .buckets
                        .parse_keys(self.reader, payload_len)?;
                }
            }

            FourCC::Xyz => {
                if self.parent_name(scope) == Some(FourCC::Udta) {
                    self.parsed
                        .buckets
                        .parse_xyz(self.reader, payload_len, header.raw_type)?;
                }
            }

            FourCC::Data => {
                if let (Some(ilst), Some(parent)) = (scope.ilst, scope.parent) {
                    let tag = self.parsed.tree.get(parent).header().raw_type;
                    self.parsed
                        .buckets
                        .parse_data(self.reader, payload_len, tag, ilst)?;
                }
            }

            // Direct children of `ilst` are tag (or key index) boxes
            // wrapping a `data` box; everything else unrecognised is
            // kept in the tree and skipped.
            _ => {
                if scope.ilst.is_some() && self.parent_name(scope) == Some(FourCC::Ilst) {
                    self.parse_children(child_scope, payload_len)?;
                }
            }
        }

        Ok(())
    }

    fn track_mut(&mut self, scope: Scope, fourcc: &str) -> Result<&mut Track, Mp4Error> {
        scope
            .track
            .and_then(|idx| self.parsed.tracks.get_mut(idx))
            .ok_or_else(|| Mp4Error::Invalid(format!("'{fourcc}' box outside a track")))
    }

    fn parent_name(&self, scope: Scope) -> Option<FourCC> {
        scope
            .parent
            .map(|p| self.parsed.tree.get(p).name().clone())
    }
}

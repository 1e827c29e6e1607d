//! Read-only demultiplexer for the ISO Base Media File Format
//! (ISO/IEC 14496-12, commonly "MP4").
//!
//! Walks the nested box tree of a seekable file, expands the compact
//! `stsc`/`stsz`/`stco`/`co64`/`stts`/`stss` sample tables into a
//! dense per-sample index of `(file offset, size, decode timestamp,
//! keyframe?)`, resolves chapter and timed-metadata track links, and
//! consolidates the `udta` and `meta` metadata dialects (including
//! embedded cover art). Does not and will not support any kind of
//! video de/encoding.
//!
//! The implementation was mostly done with help from
//! <https://developer.apple.com/library/archive/documentation/QuickTime/QTFF/QTFFPreface/qtffPreface.html>
//! and ISO/IEC 14496-12.
//!
//! ```rs
//! use mp4demux::Mp4Demux;
//! use std::path::Path;
//!
//! fn main() -> std::io::Result<()> {
//!     let mut demux = Mp4Demux::open(Path::new("VIDEO.MP4"))?;
//!
//!     println!("{:#?}", demux.media_info());
//!
//!     for idx in 0..demux.track_count() {
//!         println!("{:#?}", demux.track_info(idx)?);
//!     }
//!
//!     for chapter in demux.chapters() {
//!         println!("{} µs '{}'", chapter.time_us, chapter.name);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! Fragmented MP4 (`moof`), edit lists (`elst`), composition time
//! offsets (`ctts`) and encrypted files are out of scope; the parser
//! assumes the full file is present and seekable.

pub mod atom;
pub mod atom_types;
pub mod consts;
pub mod demux;
pub mod errors;
pub mod fourcc;
pub mod metadata;
pub mod track;

// Internal reader and tree walk
pub(crate) mod parser;
pub(crate) mod reader;
pub(crate) mod support;

pub mod tests;

pub use atom::{BoxHeader, BoxNode, BoxTree};
pub use atom_types::{
    AudioDescription,
    AvcConfiguration,
    Ftyp,
    Hdlr,
    Mdhd,
    MetadataDescription,
    Mvhd,
    Stsd,
    Tkhd,
    VideoDescription,
};
pub use consts::{mp4_time_zero, CHAPTERS_MAX, CONTAINER, MAC_TO_UNIX_EPOCH_OFFSET};
pub use demux::{
    AudioInfo, AvcDecoderConfig, MediaInfo, Mp4Demux, TrackInfo, TrackSample, VideoInfo,
};
pub use errors::Mp4Error;
pub use fourcc::FourCC;
pub use metadata::{Cover, CoverKind, MetadataEntry};
pub use track::{AudioCodec, Chapter, Track, TrackType, VideoCodec};

//! Track records, the sample-index builder and chapter extraction.

pub(crate) mod builder;
mod track;

pub use builder::Chapter;
pub use track::{AudioCodec, Track, TrackType, VideoCodec};

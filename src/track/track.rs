//! A single MP4 track: header fields, compact sample tables as
//! parsed, and the dense per-sample index derived from them.

use crate::atom_types::{
    AudioDescription, MetadataDescription, SampleToChunkEntry, TimeToSampleEntry,
    VideoDescription,
};

/// Media kind of a track, from the `hdlr` handler type.
///
/// `Text` is reclassified to `Chapters` when another track
/// references it with a `chap` track reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackType {
    Video,
    Audio,
    Hint,
    Metadata,
    Text,
    Chapters,
    #[default]
    Unknown,
}

impl TrackType {
    /// Maps an `hdlr` handler type FourCC.
    pub(crate) fn from_handler_type(handler_type: u32) -> Self {
        match &handler_type.to_be_bytes() {
            b"vide" => Self::Video,
            b"soun" => Self::Audio,
            b"hint" => Self::Hint,
            b"meta" => Self::Metadata,
            b"text" => Self::Text,
            _ => Self::Unknown,
        }
    }
}

/// Video codec carried by a video track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoCodec {
    /// H.264, signalled by a nested `avcC` box.
    Avc,
    #[default]
    Unknown,
}

/// Audio codec carried by an audio track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioCodec {
    #[default]
    Unknown,
}

/// Track reference FourCC `cdsc`: timed metadata describing another track.
pub(crate) const REFERENCE_TYPE_DESCRIPTION: u32 = u32::from_be_bytes(*b"cdsc");
/// Track reference FourCC `chap`: chapter list for another track.
pub(crate) const REFERENCE_TYPE_CHAPTERS: u32 = u32::from_be_bytes(*b"chap");

/// One MP4 track (`trak`).
///
/// Populated box by box during the tree walk, then finalized by the
/// track builder, which expands the compact `stsc`/`stco`/`stsz`
/// encoding into the dense per-sample arrays. All arrays share the
/// length `sample_count` afterwards.
#[derive(Debug, Default)]
pub struct Track {
    /// `tkhd.track_id`; unique within the movie, 0 is invalid.
    pub(crate) id: u32,
    pub(crate) kind: TrackType,
    /// Ticks per second, from `mdhd`.
    pub(crate) time_scale: u32,
    /// Unscaled duration in this track's own time scale.
    pub(crate) duration: u64,
    /// Seconds since 1904-01-01 UTC.
    pub(crate) creation_time: u64,
    /// Seconds since 1904-01-01 UTC.
    pub(crate) modification_time: u64,

    /// Read cursor, advanced by `next_sample`, repositioned by `seek`.
    pub(crate) current_sample: u32,

    /// From `stsz`.
    pub(crate) sample_count: u32,
    /// Bytes on disk per sample. Length `sample_count`.
    pub(crate) sample_size: Vec<u32>,
    /// Cumulative decode timestamp in track ticks. Length `sample_count`.
    pub(crate) sample_decoding_time: Vec<u64>,
    /// Absolute file offset per sample. Length `sample_count`.
    pub(crate) sample_offset: Vec<u64>,

    /// Chunk offsets from `stco`/`co64`, always widened to 64 bits.
    pub(crate) chunk_offset: Vec<u64>,
    /// Compact `stts` runs.
    pub(crate) time_to_sample: Vec<TimeToSampleEntry>,
    /// Compact `stsc` runs.
    pub(crate) sample_to_chunk: Vec<SampleToChunkEntry>,
    /// 1-based, strictly ascending sync sample numbers from `stss`.
    /// `None` means every sample is a sync sample.
    pub(crate) sync_samples: Option<Vec<u32>>,

    /// `tref` relation FourCC, 0 when the track references nothing.
    pub(crate) reference_type: u32,
    /// `tref` target track id, 0 when the track references nothing.
    pub(crate) reference_track_id: u32,

    /// Codec-specific description from `stsd`.
    pub(crate) video: Option<VideoDescription>,
    pub(crate) audio: Option<AudioDescription>,
    pub(crate) timed_metadata: Option<MetadataDescription>,

    /// Resolved `tref` target (index into the movie's track list).
    pub(crate) ref_track: Option<usize>,
    /// Timed metadata track describing this track.
    pub(crate) metadata_track: Option<usize>,
    /// Chapter text track attached to this track.
    pub(crate) chapters_track: Option<usize>,
}

impl Track {
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn kind(&self) -> TrackType {
        self.kind
    }

    pub fn time_scale(&self) -> u32 {
        self.time_scale
    }

    /// Unscaled duration in this track's own time scale.
    pub fn duration(&self) -> u64 {
        self.duration
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    /// Bytes on disk per sample.
    pub fn sample_sizes(&self) -> &[u32] {
        &self.sample_size
    }

    /// Absolute file offset per sample.
    pub fn sample_offsets(&self) -> &[u64] {
        &self.sample_offset
    }

    /// Cumulative decode timestamps in track ticks.
    pub fn sample_decoding_times(&self) -> &[u64] {
        &self.sample_decoding_time
    }

    /// 1-based sync sample numbers; `None` when every sample
    /// is a sync sample.
    pub fn sync_samples(&self) -> Option<&[u32]> {
        self.sync_samples.as_deref()
    }

    /// 0-based cursor of the next sample `next_sample` will yield.
    pub fn current_sample(&self) -> u32 {
        self.current_sample
    }

    /// Index of the timed metadata track describing this track.
    pub fn metadata_track(&self) -> Option<usize> {
        self.metadata_track
    }

    /// Index of the chapter text track attached to this track.
    pub fn chapters_track(&self) -> Option<usize> {
        self.chapters_track
    }

    /// Index of the resolved `tref` target.
    pub fn ref_track(&self) -> Option<usize> {
        self.ref_track
    }

    pub fn video(&self) -> Option<&VideoDescription> {
        self.video.as_ref()
    }

    pub fn audio(&self) -> Option<&AudioDescription> {
        self.audio.as_ref()
    }

    pub fn timed_metadata(&self) -> Option<&MetadataDescription> {
        self.timed_metadata.as_ref()
    }

    /// Whether `sample_idx` (0-based) is a random access point.
    ///
    /// On a negative answer also reports the closest preceding
    /// sync sample, if one exists.
    pub(crate) fn is_sync_sample(&self, sample_idx: u32) -> (bool, Option<u32>) {
        let table = match &self.sync_samples {
            None => return (true, None),
            Some(t) => t,
        };

        let mut prev = None;
        for (i, number) in table.iter().enumerate() {
            // entries are 1-based
            if number - 1 == sample_idx {
                return (true, None);
            }
            if number - 1 > sample_idx {
                if i > 0 {
                    prev = Some(table[i - 1] - 1);
                }
                return (false, prev);
            }
        }

        if let Some(last) = table.last() {
            prev = Some(last - 1);
        }
        (false, prev)
    }
}

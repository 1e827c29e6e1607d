//! Core MP4 demuxer struct and its query surface.
//!
//! ```rs
//! use mp4demux::Mp4Demux;
//! use std::path::Path;
//!
//! fn main() -> std::io::Result<()> {
//!     let mut demux = Mp4Demux::open(Path::new("VIDEO.MP4"))?;
//!
//!     let info = demux.media_info();
//!     println!("{} tracks, {} µs", info.track_count, info.duration_us);
//!
//!     // Stream the first track's samples.
//!     let id = demux.track_info(0)?.id;
//!     let mut buf = vec![0_u8; 1024 * 1024];
//!     loop {
//!         let sample = demux.next_sample(id, Some(&mut buf), None)?;
//!         if sample.sample_size == 0 {
//!             break;
//!         }
//!         println!("{} bytes @ {} µs", sample.sample_size, sample.sample_dts_us);
//!     }
//!
//!     Ok(())
//! }
//! ```

use std::{
    fs::File,
    path::{Path, PathBuf},
};

use log::{info, warn};

use crate::{
    atom::BoxTree,
    consts::MAC_TO_UNIX_EPOCH_OFFSET,
    metadata::{Cover, MetadataEntry},
    parser::Parser,
    reader::Mp4Reader,
    support::{micros_to_ticks, ticks_to_micros},
    track::{builder, AudioCodec, Chapter, Track, TrackType, VideoCodec},
    Mp4Error,
};

/// Read-only MP4 demuxer.
///
/// Everything is parsed and indexed up front by [`Mp4Demux::open`];
/// the only state that changes afterwards is the per-track sample
/// cursor driven by [`Mp4Demux::next_sample`] and [`Mp4Demux::seek`].
#[derive(Debug)]
pub struct Mp4Demux {
    /// Path.
    path: PathBuf,
    /// Positioned reader over the file.
    reader: Mp4Reader,
    /// Box tree in document order.
    tree: BoxTree,

    /// Movie time scale (ticks/second), from `mvhd`.
    time_scale: u32,
    /// Movie duration in `time_scale` ticks.
    duration: u64,
    /// Seconds since 1904-01-01 UTC.
    creation_time: u64,
    /// Seconds since 1904-01-01 UTC.
    modification_time: u64,

    /// Tracks in document order.
    tracks: Vec<Track>,
    /// Consolidated metadata dictionary.
    metadata: Vec<MetadataEntry>,
    /// Selected cover blob, `meta` dialect preferred.
    cover: Option<Cover>,
    /// Chapter markers from the chapter text track.
    chapters: Vec<Chapter>,
}

/// Movie-global facts returned by [`Mp4Demux::media_info`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaInfo {
    pub duration_us: u64,
    /// Unix epoch seconds.
    pub creation_time: i64,
    /// Unix epoch seconds.
    pub modification_time: i64,
    pub track_count: u32,
}

/// Per-track facts returned by [`Mp4Demux::track_info`].
#[derive(Debug, Clone)]
pub struct TrackInfo<'a> {
    pub id: u32,
    pub kind: TrackType,
    pub duration_us: u64,
    /// Unix epoch seconds.
    pub creation_time: i64,
    /// Unix epoch seconds.
    pub modification_time: i64,
    pub sample_count: u32,
    /// Whether a timed metadata track describes this track.
    pub has_metadata: bool,
    pub metadata_content_encoding: Option<&'a str>,
    pub metadata_mime_format: Option<&'a str>,
    pub video: Option<VideoInfo>,
    pub audio: Option<AudioInfo>,
}

/// Codec facts of a video track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoInfo {
    pub codec: VideoCodec,
    /// Native pixel count from `stsd`, not the `tkhd` presentation size.
    pub width: u32,
    pub height: u32,
}

/// Codec facts of an audio track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioInfo {
    pub codec: AudioCodec,
    pub channel_count: u32,
    pub sample_size: u32,
    /// 16.16 fixed-point Hz, as stored.
    pub sample_rate: u32,
}

impl AudioInfo {
    /// Sample rate in integer Hz.
    pub fn sample_rate_hz(&self) -> u32 {
        self.sample_rate >> 16
    }

    /// Sample rate as a fraction, where the 16.16 precision matters.
    pub fn sample_rate_f32(&self) -> f32 {
        self.sample_rate as f32 / 65536.
    }
}

/// First SPS/PPS of an AVC track, verbatim from `avcC`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AvcDecoderConfig<'a> {
    pub sps: Option<&'a [u8]>,
    pub pps: Option<&'a [u8]>,
}

/// One sample step, returned by [`Mp4Demux::next_sample`].
/// All zeros past the end of the track.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackSample {
    pub sample_size: u32,
    /// Size of the matching timed metadata sample, when linked.
    pub metadata_size: u32,
    pub sample_dts_us: u64,
    /// Decode timestamp of the following sample, 0 at end of track.
    pub next_sample_dts_us: u64,
}

impl Mp4Demux {
    /// Opens `path`, reads the entire box tree, builds the per-track
    /// sample indexes and consolidates the metadata.
    ///
    /// Never partial: returns either a fully valid demuxer or an
    /// error, with everything allocated so far released.
    pub fn open(path: &Path) -> Result<Self, Mp4Error> {
        Self::open_inner(path, None)
    }

    /// Same as [`Mp4Demux::open`] with a custom buffer size for the
    /// underlying `BufReader`.
    pub fn open_with_capacity(path: &Path, capacity: usize) -> Result<Self, Mp4Error> {
        Self::open_inner(path, Some(capacity))
    }

    fn open_inner(path: &Path, capacity: Option<usize>) -> Result<Self, Mp4Error> {
        let file = File::open(path)?;
        let mut reader = Mp4Reader::with_capacity(file, capacity)?;
        let file_size = reader.len();

        let parsed = Parser::run(&mut reader)?;
        parsed.tree.log();

        let mut tracks = parsed.tracks;
        builder::build_tracks(&mut tracks, file_size)?;
        builder::resolve_references(&mut tracks);
        let chapters = builder::extract_chapters(&mut reader, &tracks)?;
        let (metadata, cover) = parsed.buckets.consolidate();

        Ok(Self {
            path: path.to_owned(),
            reader,
            tree: parsed.tree,
            time_scale: parsed.movie.time_scale,
            duration: parsed.movie.duration,
            creation_time: parsed.movie.creation_time,
            modification_time: parsed.movie.modification_time,
            tracks,
            metadata,
            cover,
            chapters,
        })
    }

    /// MP4 file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// MP4 file size in bytes.
    pub fn len(&self) -> u64 {
        self.reader.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reader.len() == 0
    }

    /// The box tree, in document order.
    pub fn tree(&self) -> &BoxTree {
        &self.tree
    }

    /// Tracks in document order.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Movie-global duration, times and track count.
    pub fn media_info(&self) -> MediaInfo {
        MediaInfo {
            duration_us: ticks_to_micros(self.duration, self.time_scale),
            creation_time: mac_to_unix(self.creation_time),
            modification_time: mac_to_unix(self.modification_time),
            track_count: self.tracks.len() as u32,
        }
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Facts for the track at list position `idx` (document order).
    pub fn track_info(&self, idx: usize) -> Result<TrackInfo<'_>, Mp4Error> {
        let track = self
            .tracks
            .get(idx)
            .ok_or_else(|| Mp4Error::NotFound(format!("track index {idx}")))?;

        // The MIME pair comes from the linked timed metadata track
        // when one exists, from the track itself when it is the
        // metadata track.
        let described_by = match track.metadata_track {
            Some(m) => self.tracks[m].timed_metadata.as_ref(),
            None if track.kind == TrackType::Metadata => track.timed_metadata.as_ref(),
            None => None,
        };

        Ok(TrackInfo {
            id: track.id,
            kind: track.kind,
            duration_us: ticks_to_micros(track.duration, track.time_scale),
            creation_time: mac_to_unix(track.creation_time),
            modification_time: mac_to_unix(track.modification_time),
            sample_count: track.sample_count,
            has_metadata: track.metadata_track.is_some(),
            metadata_content_encoding: described_by
                .and_then(|m| m.content_encoding.as_deref()),
            metadata_mime_format: described_by.and_then(|m| m.mime_format.as_deref()),
            video: track.video.as_ref().map(|v| VideoInfo {
                codec: v.codec,
                width: v.width as u32,
                height: v.height as u32,
            }),
            audio: track.audio.as_ref().map(|a| AudioInfo {
                codec: AudioCodec::Unknown,
                channel_count: a.channel_count as u32,
                sample_size: a.sample_size as u32,
                sample_rate: a.sample_rate,
            }),
        })
    }

    /// First SPS/PPS of the AVC track with id `track_id`.
    pub fn avc_decoder_config(&self, track_id: u32) -> Result<AvcDecoderConfig<'_>, Mp4Error> {
        let track = self.track_by_id(track_id)?;
        let avcc = track.video.as_ref().and_then(|v| v.avcc.as_ref());
        Ok(AvcDecoderConfig {
            sps: avcc.and_then(|c| c.sps.as_deref()),
            pps: avcc.and_then(|c| c.pps.as_deref()),
        })
    }

    /// Positions every track's sample cursor at `time_us`.
    ///
    /// Chapter tracks and timed metadata tracks slaved to a
    /// reference keep their cursor; a linked metadata track is
    /// positioned together with its reference when their decode
    /// timestamps match exactly. With `sync` set the cursor lands on
    /// a sync sample, falling back to the closest preceding one.
    pub fn seek(&mut self, time_us: u64, sync: bool) -> Result<(), Mp4Error> {
        for i in 0..self.tracks.len() {
            let track = &self.tracks[i];
            if track.kind == TrackType::Chapters {
                continue;
            }
            if track.kind == TrackType::Metadata && track.ref_track.is_some() {
                continue;
            }
            if track.sample_count == 0 {
                return Err(Mp4Error::NotFound(format!(
                    "no sample to seek to in track {}",
                    track.id
                )));
            }

            let ts = micros_to_ticks(time_us, track.time_scale);
            let count = track.sample_count as usize;

            // Estimated landing point, refined by a forward then a
            // backward scan over the decode timestamps.
            let mut start = match track.duration {
                0 => 0,
                d => (((count as u128) * (ts as u128) + (d as u128) - 1) / (d as u128))
                    as usize,
            };
            if start >= count {
                start = count - 1;
            }
            while start < count && track.sample_decoding_time[start] < ts {
                start += 1;
            }

            let mut found = None;
            for k in (0..=start.min(count - 1)).rev() {
                if track.sample_decoding_time[k] <= ts {
                    let (is_sync, prev_sync) = track.is_sync_sample(k as u32);
                    if is_sync || !sync {
                        found = Some(k);
                        break;
                    } else if let Some(prev) = prev_sync {
                        found = Some(prev as usize);
                        break;
                    }
                }
            }

            let Some(start) = found else {
                return Err(Mp4Error::NotFound(format!(
                    "unable to seek to {time_us} µs in track {}",
                    track.id
                )));
            };

            self.tracks[i].current_sample = start as u32;
            info!(
                "seek to {time_us} -> sample #{start} time {}",
                ticks_to_micros(
                    self.tracks[i].sample_decoding_time[start],
                    self.tracks[i].time_scale
                )
            );

            // Drag the linked metadata track along when the decode
            // timestamps line up exactly.
            if let Some(m) = self.tracks[i].metadata_track {
                if (start as u32) < self.tracks[m].sample_count
                    && self.tracks[i].sample_decoding_time[start]
                        == self.tracks[m].sample_decoding_time[start]
                {
                    self.tracks[m].current_sample = start as u32;
                } else {
                    warn!("failed to sync metadata with ref track");
                }
            }
        }

        Ok(())
    }

    /// Reports the current sample of track `track_id` and advances
    /// the cursor. Optionally fills `sample_buf` with the sample
    /// bytes and `metadata_buf` with the matching timed metadata
    /// sample. Past the last sample every field is zero.
    pub fn next_sample(
        &mut self,
        track_id: u32,
        sample_buf: Option<&mut [u8]>,
        metadata_buf: Option<&mut [u8]>,
    ) -> Result<TrackSample, Mp4Error> {
        let idx = self.track_index_by_id(track_id)?;

        let track = &self.tracks[idx];
        let cur = track.current_sample as usize;
        if cur >= track.sample_count as usize {
            return Ok(TrackSample::default());
        }

        let mut sample = TrackSample {
            sample_size: track.sample_size[cur],
            ..TrackSample::default()
        };

        let offset = track.sample_offset[cur];
        if let Some(buf) = sample_buf {
            let needed = sample.sample_size as usize;
            if buf.len() < needed {
                return Err(Mp4Error::BufTooSmall {
                    got: buf.len(),
                    needed,
                });
            }
            self.reader.read_exact_at(&mut buf[..needed], offset)?;
        }

        let track = &self.tracks[idx];
        if let Some(m) = track.metadata_track {
            let meta = &self.tracks[m];
            if cur < meta.sample_count as usize {
                sample.metadata_size = meta.sample_size[cur];
                let offset = meta.sample_offset[cur];
                if let Some(buf) = metadata_buf {
                    let needed = sample.metadata_size as usize;
                    if buf.len() < needed {
                        return Err(Mp4Error::BufTooSmall {
                            got: buf.len(),
                            needed,
                        });
                    }
                    self.reader.read_exact_at(&mut buf[..needed], offset)?;
                }
            }
        }

        let track = &self.tracks[idx];
        sample.sample_dts_us =
            ticks_to_micros(track.sample_decoding_time[cur], track.time_scale);
        sample.next_sample_dts_us = match cur + 1 < track.sample_count as usize {
            true => ticks_to_micros(track.sample_decoding_time[cur + 1], track.time_scale),
            false => 0,
        };

        self.tracks[idx].current_sample += 1;
        Ok(sample)
    }

    /// Chapter markers, at most [`crate::consts::CHAPTERS_MAX`].
    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    /// The consolidated metadata dictionary.
    pub fn metadata_strings(&self) -> &[MetadataEntry] {
        &self.metadata
    }

    /// Reports the selected cover blob, filling `buf` with its bytes
    /// when provided. `None` when the file embeds no cover.
    pub fn metadata_cover(&mut self, buf: Option<&mut [u8]>) -> Result<Option<Cover>, Mp4Error> {
        let Some(cover) = self.cover else {
            return Ok(None);
        };

        if let Some(buf) = buf {
            let needed = cover.size as usize;
            if buf.len() < needed {
                return Err(Mp4Error::BufTooSmall {
                    got: buf.len(),
                    needed,
                });
            }
            self.reader.read_exact_at(&mut buf[..needed], cover.offset)?;
        }

        Ok(Some(cover))
    }

    fn track_index_by_id(&self, track_id: u32) -> Result<usize, Mp4Error> {
        self.tracks
            .iter()
            .position(|t| t.id == track_id)
            .ok_or_else(|| Mp4Error::NotFound(format!("track id {track_id}")))
    }

    fn track_by_id(&self, track_id: u32) -> Result<&Track, Mp4Error> {
        self.track_index_by_id(track_id).map(|i| &self.tracks[i])
    }
}

/// Mac epoch (1904) seconds to Unix epoch seconds.
fn mac_to_unix(mac: u64) -> i64 {
    mac as i64 - MAC_TO_UNIX_EPOCH_OFFSET as i64
}

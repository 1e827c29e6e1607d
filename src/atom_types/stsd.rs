//! Sample description box (`stsd`).
//!
//! Location: `moov/trak[multiple]/mdia/minf/stbl/stsd`
//!
//! The entry grammar depends on the track kind declared by the
//! preceding `hdlr` box: video entries carry pixel dimensions and an
//! optional nested `avcC` decoder configuration, audio entries carry
//! channel layout and sample rate, timed-metadata entries carry a
//! pair of MIME strings. Entries of other kinds are skipped whole.
//!
//! See: <https://developer.apple.com/documentation/quicktime-file-format/video_sample_description>

use std::io::{BufRead, Cursor, Seek, SeekFrom};

use binrw::{BinRead, BinReaderExt};
use log::debug;

use crate::{
    atom_types::avcc::AvcConfiguration,
    reader::Mp4Reader,
    support::{counted_string, string_from_be_u32},
    track::{TrackType, VideoCodec},
    Mp4Error,
};

/// FourCC of the nested AVC decoder configuration box.
const AVCC: u32 = u32::from_be_bytes(*b"avcC");

/// Sample description box (`stsd`), reduced to the fields the
/// demuxer exposes for the entry kind at hand.
#[derive(Debug, Default)]
pub struct Stsd {
    pub(crate) entry_count: u32,
    pub(crate) entry: Option<StsdEntry>,
}

/// Kind-specific payload of a sample description entry.
#[derive(Debug)]
pub enum StsdEntry {
    Video(VideoDescription),
    Audio(AudioDescription),
    TimedMetadata(MetadataDescription),
}

/// Fields extracted from a video sample entry.
#[derive(Debug, Default)]
pub struct VideoDescription {
    pub(crate) codec: VideoCodec,
    /// Native pixel width from the sample entry (not `tkhd`).
    pub(crate) width: u16,
    pub(crate) height: u16,
    pub(crate) compressor_name: String,
    pub(crate) avcc: Option<AvcConfiguration>,
}

/// Fields extracted from an audio sample entry.
#[derive(Debug, Default)]
pub struct AudioDescription {
    pub(crate) channel_count: u16,
    pub(crate) sample_size: u16,
    /// 16.16 fixed-point sample rate in Hz.
    pub(crate) sample_rate: u32,
}

/// Fields extracted from a timed-metadata sample entry.
#[derive(Debug, Default)]
pub struct MetadataDescription {
    pub(crate) content_encoding: Option<String>,
    pub(crate) mime_format: Option<String>,
}

/// Fixed leading fields of a video sample entry (86 bytes).
#[derive(Debug, BinRead)]
#[br(big)]
struct VideoSampleEntry {
    size: u32,
    _format: u32,
    _reserved1: [u8; 6],
    _data_reference_index: u16,
    _pre_defined: [u8; 16],
    width: u16,
    height: u16,
    _horiz_resolution: u32,
    _vert_resolution: u32,
    _reserved2: u32,
    frame_count: u16,
    /// 32-byte field holding a length-prefixed compressor name.
    #[br(map = |data: [u8; 32]| counted_string(&data, true))]
    compressor_name: String,
    _depth: u16,
    _pre_defined2: u16,
}

/// Fixed fields of an audio sample entry (36 bytes).
#[derive(Debug, BinRead)]
#[br(big)]
struct AudioSampleEntry {
    size: u32,
    _format: u32,
    _reserved1: [u8; 6],
    _data_reference_index: u16,
    _reserved2: [u8; 8],
    channel_count: u16,
    sample_size: u16,
    _reserved3: u32,
    /// 16.16 fixed-point Hz.
    sample_rate: u32,
}

/// Fixed leading fields of a timed-metadata sample entry (16 bytes).
#[derive(Debug, BinRead)]
#[br(big)]
struct MetadataSampleEntry {
    size: u32,
    format: u32,
    _reserved: [u8; 6],
    _data_reference_index: u16,
}

impl Stsd {
    pub(crate) fn read(
        reader: &mut Mp4Reader,
        max_bytes: u64,
        kind: TrackType,
    ) -> Result<Self, Mp4Error> {
        if max_bytes < 8 {
            return Err(Mp4Error::Invalid(format!(
                "'stsd' payload of {max_bytes} bytes, expected 8 min"
            )));
        }

        let mut crs = reader.cursor(max_bytes)?;
        let _version_flags = crs.read_be::<u32>()?;
        let entry_count = crs.read_be::<u32>()?;
        debug!("# stsd: entry_count={entry_count}");

        let mut stsd = Self {
            entry_count,
            entry: None,
        };

        for _ in 0..entry_count {
            let entry_start = crs.position();
            if entry_start + 8 > max_bytes {
                break;
            }

            let consumed = match kind {
                TrackType::Video => stsd.read_video(&mut crs, max_bytes)?,
                TrackType::Audio => stsd.read_audio(&mut crs, max_bytes)?,
                TrackType::Metadata => stsd.read_metadata(&mut crs, max_bytes)?,
                _ => {
                    debug!("# stsd: {kind:?} handler type, entry skipped");
                    None
                }
            };

            // Advance to the next entry via the entry's declared size;
            // bail out when it cannot be trusted.
            match consumed {
                Some(entry_size) if entry_size >= 16 => {
                    let next = entry_start + entry_size as u64;
                    if next > max_bytes {
                        break;
                    }
                    crs.seek(SeekFrom::Start(next))?;
                }
                _ => break,
            }
        }

        Ok(stsd)
    }

    /// Video entry. Returns the entry's declared size.
    fn read_video(
        &mut self,
        crs: &mut Cursor<Vec<u8>>,
        max_bytes: u64,
    ) -> Result<Option<u32>, Mp4Error> {
        debug!("# stsd: video handler type");
        if max_bytes < 102 {
            return Err(Mp4Error::Invalid(format!(
                "'stsd' video payload of {max_bytes} bytes, expected 102 min"
            )));
        }

        let entry: VideoSampleEntry = crs.read_be()?;
        debug!("# stsd: width={} height={}", entry.width, entry.height);
        debug!("# stsd: frame_count={}", entry.frame_count);
        debug!("# stsd: compressorname={}", entry.compressor_name);

        let mut desc = VideoDescription {
            codec: VideoCodec::Unknown,
            width: entry.width,
            height: entry.height,
            compressor_name: entry.compressor_name,
            avcc: None,
        };

        // Nested codec configuration directly after the fixed fields.
        let _codec_size = crs.read_be::<u32>()?;
        let codec_type = crs.read_be::<u32>()?;
        debug!("# stsd: codec={}", string_from_be_u32(codec_type));

        if codec_type == AVCC {
            desc.codec = VideoCodec::Avc;
            let remaining = max_bytes - crs.position();
            desc.avcc = Some(AvcConfiguration::read(crs, remaining)?);
        }

        let size = entry.size;
        self.entry = Some(StsdEntry::Video(desc));
        Ok(Some(size))
    }

    /// Audio entry. Returns the entry's declared size.
    fn read_audio(
        &mut self,
        crs: &mut Cursor<Vec<u8>>,
        max_bytes: u64,
    ) -> Result<Option<u32>, Mp4Error> {
        debug!("# stsd: audio handler type");
        if max_bytes < 44 {
            return Err(Mp4Error::Invalid(format!(
                "'stsd' audio payload of {max_bytes} bytes, expected 44 min"
            )));
        }

        let entry: AudioSampleEntry = crs.read_be()?;
        debug!(
            "# stsd: channelcount={} samplesize={}",
            entry.channel_count, entry.sample_size
        );
        debug!("# stsd: samplerate={:.2}", entry.sample_rate as f64 / 65536.);

        self.entry = Some(StsdEntry::Audio(AudioDescription {
            channel_count: entry.channel_count,
            sample_size: entry.sample_size,
            sample_rate: entry.sample_rate,
        }));
        Ok(Some(entry.size))
    }

    /// Timed-metadata entry. Returns the entry's declared size.
    fn read_metadata(
        &mut self,
        crs: &mut Cursor<Vec<u8>>,
        max_bytes: u64,
    ) -> Result<Option<u32>, Mp4Error> {
        debug!("# stsd: metadata handler type");
        if max_bytes < 24 {
            return Err(Mp4Error::Invalid(format!(
                "'stsd' metadata payload of {max_bytes} bytes, expected 24 min"
            )));
        }

        let entry: MetadataSampleEntry = crs.read_be()?;
        debug!("# stsd: format={}", string_from_be_u32(entry.format));

        let content_encoding = read_nul_string(crs)?;
        let mime_format = read_nul_string(crs)?;
        debug!("# stsd: content_encoding={content_encoding:?}");
        debug!("# stsd: mime_format={mime_format:?}");

        self.entry = Some(StsdEntry::TimedMetadata(MetadataDescription {
            content_encoding,
            mime_format,
        }));
        Ok(Some(entry.size))
    }
}

/// Reads a null-terminated string from the cursor.
/// Empty strings collapse to `None`.
fn read_nul_string(crs: &mut Cursor<Vec<u8>>) -> Result<Option<String>, Mp4Error> {
    let mut buf = Vec::new();
    crs.read_until(0, &mut buf)?;
    if buf.last() == Some(&0) {
        buf.pop();
    }
    if buf.is_empty() {
        Ok(None)
    } else {
        Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
    }
}

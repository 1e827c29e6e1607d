//! Shared constants: container box types, time origins, table limits.

use time::{self, Month, PrimitiveDateTime};

/// FourCC:s for "container" boxes whose payload is a plain
/// sequence of child boxes starting directly after the header.
/// - `moov`: offset tables, timing, metadata
/// - `trak`: moov.trak
/// - `mdia`: moov.trak.mdia
/// - `minf`: moov.trak.mdia.minf
/// - `dinf`: moov.trak.mdia.minf.dinf
/// - `stbl`: moov.trak.mdia.minf.stbl, contains timing (stts), offsets (stco)
/// - `udta`: moov.udta
///
/// `meta` and `ilst` also nest, but context-dependently,
/// and are dispatched separately by the parser.
pub const CONTAINER: [&str; 7] = [
    "moov",
    "trak",
    "mdia",
    "minf",
    "dinf",
    "stbl",
    "udta",
];

/// Seconds between the MP4 time zero (1904-01-01 00:00:00 UTC)
/// and the Unix epoch.
pub const MAC_TO_UNIX_EPOCH_OFFSET: u64 = 0x7C25_B080;

/// Chapter entries beyond this count are silently dropped.
pub const CHAPTERS_MAX: usize = 100;

/// The `meta` dialect key naming embedded cover art.
pub const METADATA_KEY_COVER: &str = "com.apple.quicktime.artwork";

/// Time zero for MP4 containers. January 1, 1904.
pub fn mp4_time_zero() -> PrimitiveDateTime {
    time::Date::from_calendar_date(1904, Month::January, 1).unwrap()
        .with_hms_milli(0, 0, 0, 0).unwrap()
}

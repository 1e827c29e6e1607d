//! Small decoding helpers shared between box grammars.

use binrw::{BinRead, BinResult};

/// Single-byte chars from Big Endian `u32` value.
/// Maps 0-255 to `char`, exceeding ascii.
pub(crate) fn chars_from_be_u32(value: u32) -> [char; 4] {
    let a = value.to_be_bytes();
    chars_from_bytes(a)
}

/// Single-byte chars from `[u8; 4]`.
/// Each byte maps 0-255 to `char`, exceeding ascii.
pub(crate) fn chars_from_bytes(bytes: [u8; 4]) -> [char; 4] {
    [
        bytes[0] as char,
        bytes[1] as char,
        bytes[2] as char,
        bytes[3] as char,
    ]
}

/// String from Big Endian `u32` value.
/// Each byte maps 0-255 to `char`, exceeding ascii.
pub(crate) fn string_from_be_u32(value: u32) -> String {
    chars_from_be_u32(value).iter().collect()
}

/// Counted string: first byte specifies the length,
/// e.g. the 32-byte compressor name field in `stsd` video entries.
pub(crate) fn counted_string(bytes: &[u8], ignore_null: bool) -> String {
    if bytes.is_empty() {
        return String::new();
    }
    let count = (bytes[0] as usize).min(bytes.len() - 1);
    match ignore_null {
        true => bytes[1 .. count + 1].iter()
            .filter_map(|b| if b != &0 {Some(*b as char)} else {None})
            .collect(),
        false => bytes[1 .. count + 1].iter()
            .map(|b| *b as char)
            .collect(),
    }
}

/// Version-dependent box field: 64-bit on version 1,
/// 32-bit widened to `u64` otherwise.
#[binrw::parser(reader, endian)]
pub(crate) fn versioned_u64(version: u8) -> BinResult<u64> {
    match version {
        1 => u64::read_options(reader, endian, ()),
        _ => u32::read_options(reader, endian, ()).map(u64::from),
    }
}

/// Unscaled ticks to microseconds, rounding to nearest.
///
/// Widened to 128 bits so multi-hour media at high time scales
/// cannot overflow the intermediate product.
pub(crate) fn ticks_to_micros(ticks: u64, time_scale: u32) -> u64 {
    if time_scale == 0 {
        return 0;
    }
    ((ticks as u128 * 1_000_000 + (time_scale / 2) as u128) / time_scale as u128) as u64
}

/// Microseconds to unscaled ticks, rounding to nearest.
pub(crate) fn micros_to_ticks(micros: u64, time_scale: u32) -> u64 {
    ((micros as u128 * time_scale as u128 + 500_000) / 1_000_000) as u64
}

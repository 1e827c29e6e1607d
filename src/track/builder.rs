//! Post-parse track finalization.
//!
//! Expands the compact chunk grouping into per-sample file offsets,
//! accumulates decode timestamps from the `stts` runs, cross-checks
//! the three sample tables against each other, resolves `tref`
//! links between tracks and decodes the chapter text track.

use log::{debug, warn};
use rayon::prelude::*;

use crate::{
    consts::CHAPTERS_MAX,
    reader::Mp4Reader,
    support::ticks_to_micros,
    track::{
        track::{REFERENCE_TYPE_CHAPTERS, REFERENCE_TYPE_DESCRIPTION},
        Track, TrackType,
    },
    Mp4Error,
};

/// A named chapter marker decoded from the chapter text track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    /// Chapter start in microseconds.
    pub time_us: u64,
    pub name: String,
}

/// Expands every track's sample tables into dense per-sample
/// arrays. Tracks are independent, so the expansion runs in
/// parallel across them.
pub(crate) fn build_tracks(tracks: &mut [Track], file_size: u64) -> Result<(), Mp4Error> {
    tracks
        .par_iter_mut()
        .try_for_each(|track| build_sample_index(track, file_size))
}

/// Expands one track's `stsc`+`stco`/`co64`+`stsz` encoding into
/// `sample_offset`, and its `stts` runs into `sample_decoding_time`.
fn build_sample_index(track: &mut Track, file_size: u64) -> Result<(), Mp4Error> {
    // First pass: count the samples the chunk grouping describes and
    // verify it against the stsz sample count.
    let chunk_count = track.chunk_offset.len() as u64;
    let mut sample_count = 0_u64;
    let mut last_first_chunk = 1_u64;
    let mut last_samples_per_chunk = 0_u64;

    for entry in track.sample_to_chunk.iter() {
        let chunks = (entry.first_chunk as u64)
            .checked_sub(last_first_chunk)
            .ok_or_else(|| Mp4Error::Invalid(format!(
                "'stsc' first_chunk {} out of order in track {}",
                entry.first_chunk, track.id
            )))?;
        sample_count += chunks * last_samples_per_chunk;
        last_first_chunk = entry.first_chunk as u64;
        last_samples_per_chunk = entry.samples_per_chunk as u64;
    }
    // Last run extends to the final chunk.
    let chunks = (chunk_count + 1)
        .checked_sub(last_first_chunk)
        .ok_or_else(|| Mp4Error::Invalid(format!(
            "'stsc' first_chunk {last_first_chunk} beyond {chunk_count} chunks in track {}",
            track.id
        )))?;
    sample_count += chunks * last_samples_per_chunk;

    if sample_count != track.sample_count as u64 {
        warn!(
            "track {}: chunk expansion yields {sample_count} samples, 'stsz' lists {}",
            track.id, track.sample_count
        );
        return Err(Mp4Error::Protocol {
            got: sample_count,
            expected: track.sample_count as u64,
        });
    }

    // Second pass: emit one absolute file offset per sample.
    let mut sample_offset = Vec::new();
    sample_offset.try_reserve_exact(track.sample_count as usize)?;

    let mut chunk_idx = 0_usize;
    last_first_chunk = 1;
    last_samples_per_chunk = 0;
    let mut emit_run = |run_chunks: u64,
                        samples_per_chunk: u64,
                        chunk_idx: &mut usize,
                        sample_offset: &mut Vec<u64>|
     -> Result<(), Mp4Error> {
        for _ in 0..run_chunks {
            let mut offset = track.chunk_offset[*chunk_idx];
            for _ in 0..samples_per_chunk {
                let size = track.sample_size[sample_offset.len()] as u64;
                let end = offset.checked_add(size).filter(|end| *end <= file_size);
                if end.is_none() {
                    return Err(Mp4Error::Invalid(format!(
                        "sample at {offset} runs past file size {file_size} in track {}",
                        track.id
                    )));
                }
                sample_offset.push(offset);
                offset += size;
            }
            *chunk_idx += 1;
        }
        Ok(())
    };

    for entry in track.sample_to_chunk.iter() {
        let run_chunks = entry.first_chunk as u64 - last_first_chunk;
        emit_run(run_chunks, last_samples_per_chunk, &mut chunk_idx, &mut sample_offset)?;
        last_first_chunk = entry.first_chunk as u64;
        last_samples_per_chunk = entry.samples_per_chunk as u64;
    }
    emit_run(
        chunk_count + 1 - last_first_chunk,
        last_samples_per_chunk,
        &mut chunk_idx,
        &mut sample_offset,
    )?;
    track.sample_offset = sample_offset;

    // Decode timestamps from the stts runs, after verifying the
    // run-lengths add up to the same sample count.
    let stts_sum: u64 = track
        .time_to_sample
        .iter()
        .map(|e| e.sample_count as u64)
        .sum();
    if stts_sum != track.sample_count as u64 {
        warn!(
            "track {}: 'stts' covers {stts_sum} samples, 'stsz' lists {}",
            track.id, track.sample_count
        );
        return Err(Mp4Error::Protocol {
            got: stts_sum,
            expected: track.sample_count as u64,
        });
    }

    let mut decoding_time = Vec::new();
    decoding_time.try_reserve_exact(track.sample_count as usize)?;
    let mut ts = 0_u64;
    for entry in track.time_to_sample.iter() {
        for _ in 0..entry.sample_count {
            decoding_time.push(ts);
            ts += entry.sample_delta as u64;
        }
    }
    track.sample_decoding_time = decoding_time;

    // The sync table must be usable for the backward scans in seek:
    // 1-based, strictly ascending, within the sample count.
    if let Some(table) = &track.sync_samples {
        let mut prev = 0_u32;
        for number in table {
            if *number == 0 || *number <= prev || *number > track.sample_count {
                return Err(Mp4Error::Invalid(format!(
                    "sync sample {number} out of order or range in track {}",
                    track.id
                )));
            }
            prev = *number;
        }
    }

    debug!(
        "track {}: {} samples over {} chunks",
        track.id, track.sample_count, chunk_count
    );

    Ok(())
}

/// Resolves `tref` links between tracks and applies the
/// single-video/single-metadata fallback linkage.
pub(crate) fn resolve_references(tracks: &mut [Track]) {
    for i in 0..tracks.len() {
        let reference_type = tracks[i].reference_type;
        let reference_track_id = tracks[i].reference_track_id;
        if reference_type == 0 || reference_track_id == 0 {
            continue;
        }
        let Some(j) = tracks.iter().position(|t| t.id == reference_track_id) else {
            // dangling reference, ignored
            continue;
        };

        if reference_type == REFERENCE_TYPE_DESCRIPTION
            && tracks[i].kind == TrackType::Metadata
        {
            tracks[j].metadata_track = Some(i);
            tracks[i].ref_track = Some(j);
        } else if reference_type == REFERENCE_TYPE_CHAPTERS
            && tracks[j].kind == TrackType::Text
        {
            tracks[i].chapters_track = Some(j);
            tracks[j].ref_track = Some(i);
            tracks[j].kind = TrackType::Chapters;
        }
    }

    // Fallback: a movie holding exactly one video and one metadata
    // track with no reference between them still gets them linked.
    if tracks.len() == 2 {
        let video = tracks.iter().position(|t| t.kind == TrackType::Video);
        let meta = tracks.iter().position(|t| t.kind == TrackType::Metadata);
        if let (Some(v), Some(m)) = (video, meta) {
            if tracks[v].metadata_track.is_none() && tracks[m].ref_track.is_none() {
                tracks[v].metadata_track = Some(m);
                tracks[m].ref_track = Some(v);
            }
        }
    }
}

/// Decodes the chapter text track, if any: each sample is a
/// `u16` length followed by that many UTF-8 bytes.
pub(crate) fn extract_chapters(
    reader: &mut Mp4Reader,
    tracks: &[Track],
) -> Result<Vec<Chapter>, Mp4Error> {
    let Some(track) = tracks.iter().find(|t| t.kind == TrackType::Chapters) else {
        return Ok(Vec::new());
    };

    let mut chapters = Vec::new();
    for i in 0..track.sample_count as usize {
        if chapters.len() >= CHAPTERS_MAX {
            warn!("chapter list truncated at {CHAPTERS_MAX} entries");
            break;
        }
        let sample_size = track.sample_size[i];
        if sample_size < 2 {
            continue;
        }
        reader.seek(std::io::SeekFrom::Start(track.sample_offset[i]))?;
        let len = reader.read_be::<u16>()? as u32;
        if len > sample_size - 2 {
            continue;
        }
        let name = reader.read_string(len as usize)?;
        let time_us = ticks_to_micros(track.sample_decoding_time[i], track.time_scale);
        debug!("chapter #{} time={time_us} '{name}'", chapters.len() + 1);
        chapters.push(Chapter { time_us, name });
    }

    Ok(chapters)
}

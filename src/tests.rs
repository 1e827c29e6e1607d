#[cfg(test)]
mod tests {
    use std::{fs::File, io::Write, path::PathBuf};

    use crate::{
        CoverKind, Mp4Demux, Mp4Error, TrackType, VideoCodec, MAC_TO_UNIX_EPOCH_OFFSET,
    };

    // ------------------------
    // Synthetic file assembly
    // ------------------------

    fn mp4_box(name: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut v = Vec::with_capacity(8 + payload.len());
        v.extend_from_slice(&(payload.len() as u32 + 8).to_be_bytes());
        v.extend_from_slice(name);
        v.extend_from_slice(payload);
        v
    }

    fn container(name: &[u8; 4], children: &[Vec<u8>]) -> Vec<u8> {
        let payload: Vec<u8> = children.iter().flatten().copied().collect();
        mp4_box(name, &payload)
    }

    fn ftyp() -> Vec<u8> {
        let mut p = Vec::new();
        p.extend_from_slice(b"isom");
        p.extend_from_slice(&0_u32.to_be_bytes());
        p.extend_from_slice(b"isom");
        p.extend_from_slice(b"mp42");
        mp4_box(b"ftyp", &p)
    }

    fn mvhd(time_scale: u32, duration: u32, creation: u32, modification: u32) -> Vec<u8> {
        let mut p = vec![0_u8; 4]; // version + flags
        p.extend_from_slice(&creation.to_be_bytes());
        p.extend_from_slice(&modification.to_be_bytes());
        p.extend_from_slice(&time_scale.to_be_bytes());
        p.extend_from_slice(&duration.to_be_bytes());
        p.extend_from_slice(&0x0001_0000_u32.to_be_bytes()); // rate 1.0
        p.extend_from_slice(&0x0100_u16.to_be_bytes()); // volume 1.0
        p.extend_from_slice(&[0_u8; 10]); // reserved
        p.extend_from_slice(&[0_u8; 36]); // matrix
        p.extend_from_slice(&[0_u8; 24]); // pre_defined
        p.extend_from_slice(&99_u32.to_be_bytes()); // next_track_ID
        assert_eq!(p.len(), 100);
        mp4_box(b"mvhd", &p)
    }

    fn tkhd(track_id: u32, duration: u32) -> Vec<u8> {
        let mut p = vec![0_u8; 4];
        p.extend_from_slice(&0_u32.to_be_bytes()); // creation
        p.extend_from_slice(&0_u32.to_be_bytes()); // modification
        p.extend_from_slice(&track_id.to_be_bytes());
        p.extend_from_slice(&[0_u8; 4]); // reserved
        p.extend_from_slice(&duration.to_be_bytes());
        p.extend_from_slice(&[0_u8; 8]); // reserved
        p.extend_from_slice(&[0_u8; 2]); // layer
        p.extend_from_slice(&[0_u8; 2]); // alternate_group
        p.extend_from_slice(&[0_u8; 2]); // volume
        p.extend_from_slice(&[0_u8; 2]); // reserved
        p.extend_from_slice(&[0_u8; 36]); // matrix
        p.extend_from_slice(&0_u32.to_be_bytes()); // width
        p.extend_from_slice(&0_u32.to_be_bytes()); // height
        assert_eq!(p.len(), 84);
        mp4_box(b"tkhd", &p)
    }

    fn mdhd(time_scale: u32, duration: u32, creation: u32, modification: u32) -> Vec<u8> {
        let mut p = vec![0_u8; 4];
        p.extend_from_slice(&creation.to_be_bytes());
        p.extend_from_slice(&modification.to_be_bytes());
        p.extend_from_slice(&time_scale.to_be_bytes());
        p.extend_from_slice(&duration.to_be_bytes());
        p.extend_from_slice(&0x55C4_u16.to_be_bytes()); // language "und"
        p.extend_from_slice(&[0_u8; 2]); // quality
        assert_eq!(p.len(), 24);
        mp4_box(b"mdhd", &p)
    }

    fn hdlr(handler_type: &[u8; 4], name: &str) -> Vec<u8> {
        let mut p = vec![0_u8; 4];
        p.extend_from_slice(&[0_u8; 4]); // pre_defined
        p.extend_from_slice(handler_type);
        p.extend_from_slice(&[0_u8; 12]); // reserved
        p.extend_from_slice(name.as_bytes());
        p.push(0);
        mp4_box(b"hdlr", &p)
    }

    fn tref(kind: &[u8; 4], target: u32) -> Vec<u8> {
        let inner = mp4_box(kind, &target.to_be_bytes());
        mp4_box(b"tref", &inner)
    }

    fn stts(entries: &[(u32, u32)]) -> Vec<u8> {
        let mut p = vec![0_u8; 4];
        p.extend_from_slice(&(entries.len() as u32).to_be_bytes());
        for (count, delta) in entries {
            p.extend_from_slice(&count.to_be_bytes());
            p.extend_from_slice(&delta.to_be_bytes());
        }
        mp4_box(b"stts", &p)
    }

    fn stss(numbers: &[u32]) -> Vec<u8> {
        let mut p = vec![0_u8; 4];
        p.extend_from_slice(&(numbers.len() as u32).to_be_bytes());
        for n in numbers {
            p.extend_from_slice(&n.to_be_bytes());
        }
        mp4_box(b"stss", &p)
    }

    fn stsz(uniform: u32, count: u32, sizes: &[u32]) -> Vec<u8> {
        let mut p = vec![0_u8; 4];
        p.extend_from_slice(&uniform.to_be_bytes());
        p.extend_from_slice(&count.to_be_bytes());
        if uniform == 0 {
            for s in sizes {
                p.extend_from_slice(&s.to_be_bytes());
            }
        }
        mp4_box(b"stsz", &p)
    }

    fn stsc(entries: &[(u32, u32, u32)]) -> Vec<u8> {
        let mut p = vec![0_u8; 4];
        p.extend_from_slice(&(entries.len() as u32).to_be_bytes());
        for (first, per_chunk, desc) in entries {
            p.extend_from_slice(&first.to_be_bytes());
            p.extend_from_slice(&per_chunk.to_be_bytes());
            p.extend_from_slice(&desc.to_be_bytes());
        }
        mp4_box(b"stsc", &p)
    }

    fn stco(offsets: &[u32]) -> Vec<u8> {
        let mut p = vec![0_u8; 4];
        p.extend_from_slice(&(offsets.len() as u32).to_be_bytes());
        for o in offsets {
            p.extend_from_slice(&o.to_be_bytes());
        }
        mp4_box(b"stco", &p)
    }

    fn co64(offsets: &[u64]) -> Vec<u8> {
        let mut p = vec![0_u8; 4];
        p.extend_from_slice(&(offsets.len() as u32).to_be_bytes());
        for o in offsets {
            p.extend_from_slice(&o.to_be_bytes());
        }
        mp4_box(b"co64", &p)
    }

    /// `stsd` with an `avc1` video entry wrapping an `avcC` box.
    fn stsd_video(width: u16, height: u16, sps: &[u8], pps: &[u8]) -> Vec<u8> {
        let mut avcc = Vec::new();
        avcc.extend_from_slice(&[1, 0x64, 0, 40]); // version, profile, compat, level
        avcc.push(0xFF); // 4-byte NALU lengths
        avcc.push(0xE1); // 1 SPS
        avcc.extend_from_slice(&(sps.len() as u16).to_be_bytes());
        avcc.extend_from_slice(sps);
        avcc.push(1); // 1 PPS
        avcc.extend_from_slice(&(pps.len() as u16).to_be_bytes());
        avcc.extend_from_slice(pps);
        let avcc = mp4_box(b"avcC", &avcc);

        let mut entry = Vec::new();
        entry.extend_from_slice(&(86 + avcc.len() as u32).to_be_bytes());
        entry.extend_from_slice(b"avc1");
        entry.extend_from_slice(&[0_u8; 6]); // reserved
        entry.extend_from_slice(&1_u16.to_be_bytes()); // data_reference_index
        entry.extend_from_slice(&[0_u8; 16]); // pre_defined
        entry.extend_from_slice(&width.to_be_bytes());
        entry.extend_from_slice(&height.to_be_bytes());
        entry.extend_from_slice(&0x0048_0000_u32.to_be_bytes()); // horiz 72dpi
        entry.extend_from_slice(&0x0048_0000_u32.to_be_bytes()); // vert 72dpi
        entry.extend_from_slice(&[0_u8; 4]); // reserved
        entry.extend_from_slice(&1_u16.to_be_bytes()); // frame_count
        let mut compressor = [0_u8; 32];
        compressor[0] = 4;
        compressor[1..5].copy_from_slice(b"avc1");
        entry.extend_from_slice(&compressor);
        entry.extend_from_slice(&24_u16.to_be_bytes()); // depth
        entry.extend_from_slice(&0xFFFF_u16.to_be_bytes()); // pre_defined
        entry.extend_from_slice(&avcc);

        let mut p = vec![0_u8; 4];
        p.extend_from_slice(&1_u32.to_be_bytes()); // entry_count
        p.extend_from_slice(&entry);
        mp4_box(b"stsd", &p)
    }

    /// `stsd` with an `mp4a`-shaped audio entry.
    fn stsd_audio(channel_count: u16, sample_size: u16, sample_rate: u32) -> Vec<u8> {
        let mut entry = Vec::new();
        entry.extend_from_slice(&36_u32.to_be_bytes());
        entry.extend_from_slice(b"mp4a");
        entry.extend_from_slice(&[0_u8; 6]); // reserved
        entry.extend_from_slice(&1_u16.to_be_bytes()); // data_reference_index
        entry.extend_from_slice(&[0_u8; 8]); // reserved
        entry.extend_from_slice(&channel_count.to_be_bytes());
        entry.extend_from_slice(&sample_size.to_be_bytes());
        entry.extend_from_slice(&[0_u8; 4]); // reserved
        entry.extend_from_slice(&sample_rate.to_be_bytes());

        let mut p = vec![0_u8; 4];
        p.extend_from_slice(&1_u32.to_be_bytes());
        p.extend_from_slice(&entry);
        mp4_box(b"stsd", &p)
    }

    /// `stsd` with no entries, for tracks whose entry grammar the
    /// demuxer does not interpret.
    fn stsd_empty() -> Vec<u8> {
        let mut p = vec![0_u8; 4];
        p.extend_from_slice(&0_u32.to_be_bytes());
        mp4_box(b"stsd", &p)
    }

    fn vmhd() -> Vec<u8> {
        let mut p = vec![0_u8; 4];
        p.extend_from_slice(&[0_u8; 8]); // graphicsmode + opcolor
        mp4_box(b"vmhd", &p)
    }

    /// `data` box for an `ilst` child.
    fn data_box(class: u32, payload: &[u8]) -> Vec<u8> {
        let mut p = Vec::new();
        p.extend_from_slice(&class.to_be_bytes());
        p.extend_from_slice(&[0_u8; 4]); // reserved
        p.extend_from_slice(payload);
        mp4_box(b"data", &p)
    }

    /// `keys` box listing `mdta`-namespaced key strings.
    fn keys(names: &[&str]) -> Vec<u8> {
        let mut p = vec![0_u8; 4];
        p.extend_from_slice(&(names.len() as u32).to_be_bytes());
        for name in names {
            p.extend_from_slice(&(name.len() as u32 + 8).to_be_bytes());
            p.extend_from_slice(b"mdta");
            p.extend_from_slice(name.as_bytes());
        }
        mp4_box(b"keys", &p)
    }

    fn write_mp4(name: &str, bytes: &[u8]) -> PathBuf {
        let path = std::env::temp_dir().join(format!("mp4demux_test_{name}.mp4"));
        let mut file = File::create(&path).unwrap();
        file.write_all(bytes).unwrap();
        path
    }

    /// Deterministic sample payload bytes.
    fn sample_bytes(seed: usize, len: usize) -> Vec<u8> {
        (0..len).map(|j| (seed * 31 + j) as u8).collect()
    }

    // ------------------------
    // Assembled movies
    // ------------------------

    /// Scenario A: one H.264 track, 30 samples at 30 fps
    /// (time scale 90000, delta 3000), single chunk, distinct sizes.
    fn minimal_video_movie() -> (Vec<u8>, Vec<u32>, u32) {
        let sizes: Vec<u32> = (0..30).map(|i| 100 + i as u32).collect();
        let mdat_payload: Vec<u8> = sizes
            .iter()
            .enumerate()
            .flat_map(|(i, s)| sample_bytes(i, *s as usize))
            .collect();
        let ftyp = ftyp();
        let chunk_offset = ftyp.len() as u32 + 8;
        let mdat = mp4_box(b"mdat", &mdat_payload);

        let stbl = container(
            b"stbl",
            &[
                stsd_video(1280, 720, &[0x67, 1, 2, 3], &[0x68, 4, 5]),
                stts(&[(30, 3000)]),
                stss(&[1]),
                stsz(0, 30, &sizes),
                stsc(&[(1, 30, 1)]),
                stco(&[chunk_offset]),
            ],
        );
        let minf = container(b"minf", &[vmhd(), stbl]);
        let mdia = container(
            b"mdia",
            &[mdhd(90_000, 90_000, 0, 0), hdlr(b"vide", "VideoHandler"), minf],
        );
        let trak = container(b"trak", &[tkhd(1, 1000), mdia]);
        let moov = container(
            b"moov",
            &[
                mvhd(1000, 1000, 0xCC2C_AF00, 0xCC2C_B000),
                trak,
            ],
        );

        let mut file = ftyp;
        file.extend_from_slice(&mdat);
        file.extend_from_slice(&moov);
        (file, sizes, chunk_offset)
    }

    // ------------------------
    // Scenario tests
    // ------------------------

    #[test]
    fn minimal_video() {
        let (file, sizes, chunk_offset) = minimal_video_movie();
        let path = write_mp4("minimal_video", &file);
        let mut demux = Mp4Demux::open(&path).unwrap();

        assert_eq!(demux.track_count(), 1);
        let track = &demux.tracks()[0];
        assert_eq!(track.id(), 1);
        assert_eq!(track.kind(), TrackType::Video);
        assert_eq!(track.sample_count(), 30);
        assert_eq!(track.sample_sizes(), &sizes[..]);
        assert_eq!(track.sample_decoding_times()[29], 29 * 3000);
        assert_eq!(track.sync_samples(), Some(&[1_u32][..]));
        assert_eq!(track.sample_offsets()[0], chunk_offset as u64);

        let info = demux.track_info(0).unwrap();
        let video = info.video.unwrap();
        assert_eq!(video.codec, VideoCodec::Avc);
        assert_eq!((video.width, video.height), (1280, 720));

        // DTS sequence in µs, rounded to nearest
        let mut dts = Vec::new();
        for _ in 0..30 {
            let sample = demux.next_sample(1, None, None).unwrap();
            dts.push(sample.sample_dts_us);
        }
        let expected: Vec<u64> = (0..30_u64)
            .map(|i| (i * 3000 * 1_000_000 + 45_000) / 90_000)
            .collect();
        assert_eq!(dts, expected);
        assert_eq!(dts[1], 33_333);

        // end of track: all zeros, no error
        let done = demux.next_sample(1, None, None).unwrap();
        assert_eq!(done.sample_size, 0);
        assert_eq!(done.sample_dts_us, 0);
    }

    #[test]
    fn stsc_two_runs() {
        // Scenario B: stsc [(1,3,1),(5,2,1)], 6 chunks, uniform 1000.
        // Chunks 1-4 carry 3 samples, chunks 5-6 carry 2: 16 total.
        let sizes_total = 16 * 1000;
        let ftyp = ftyp();
        let base = ftyp.len() as u32 + 8;
        let mdat = mp4_box(b"mdat", &vec![0xAB_u8; sizes_total]);
        let offsets = [
            base,
            base + 3000,
            base + 6000,
            base + 9000,
            base + 12_000,
            base + 14_000,
        ];

        let build = |sample_count: u32| {
            let stbl = container(
                b"stbl",
                &[
                    stsd_empty(),
                    stts(&[(sample_count, 100)]),
                    stsz(1000, sample_count, &[]),
                    stsc(&[(1, 3, 1), (5, 2, 1)]),
                    stco(&offsets),
                ],
            );
            let minf = container(b"minf", &[stbl]);
            let mdia = container(
                b"mdia",
                &[mdhd(1000, 1600, 0, 0), hdlr(b"zzzz", "DataHandler"), minf],
            );
            let trak = container(b"trak", &[tkhd(1, 1600), mdia]);
            let moov = container(b"moov", &[mvhd(1000, 1600, 0, 0), trak]);
            let mut file = ftyp.clone();
            file.extend_from_slice(&mdat);
            file.extend_from_slice(&moov);
            file
        };

        let path = write_mp4("stsc_two_runs", &build(16));
        let demux = Mp4Demux::open(&path).unwrap();
        let track = &demux.tracks()[0];
        assert_eq!(track.sample_count(), 16);
        // chunk boundaries land where the run-lengths say
        assert_eq!(track.sample_offsets()[0], base as u64);
        assert_eq!(track.sample_offsets()[3], (base + 3000) as u64);
        assert_eq!(track.sample_offsets()[12], (base + 12_000) as u64);
        assert_eq!(track.sample_offsets()[14], (base + 14_000) as u64);
        assert_eq!(track.sample_offsets()[15], (base + 15_000) as u64);

        // mismatched stsz count must fail with a protocol error
        let path = write_mp4("stsc_two_runs_mismatch", &build(15));
        match Mp4Demux::open(&path) {
            Err(Mp4Error::Protocol { got, expected }) => {
                assert_eq!((got, expected), (16, 15));
            }
            other => panic!("expected protocol error, got {other:?}"),
        }
    }

    #[test]
    fn co64_large_offset() {
        // Scenario C: a single 64-bit chunk offset beyond 4 GiB.
        let offset = 0x1_0000_0000_u64;
        let stbl = container(
            b"stbl",
            &[
                stsd_empty(),
                stts(&[(1, 100)]),
                stsz(8, 1, &[]),
                stsc(&[(1, 1, 1)]),
                co64(&[offset]),
            ],
        );
        let minf = container(b"minf", &[stbl]);
        let mdia = container(
            b"mdia",
            &[mdhd(1000, 100, 0, 0), hdlr(b"zzzz", "DataHandler"), minf],
        );
        let trak = container(b"trak", &[tkhd(1, 100), mdia]);
        let moov = container(b"moov", &[mvhd(1000, 100, 0, 0), trak]);

        let mut file = ftyp();
        file.extend_from_slice(&moov);
        let path = write_mp4("co64_large", &file);
        // grow the file sparsely so the sample end stays in bounds
        let handle = File::options().write(true).open(&path).unwrap();
        handle.set_len(offset + 8).unwrap();

        let demux = Mp4Demux::open(&path).unwrap();
        assert_eq!(demux.tracks()[0].sample_offsets()[0], offset);
    }

    #[test]
    fn chapter_track_linkage() {
        // Scenario D: video track 1 references text track 2 with
        // tref(chap); track 2 samples are u16-length-prefixed names.
        let names = ["Intro", "Middle", "End"];
        let chapter_samples: Vec<Vec<u8>> = names
            .iter()
            .map(|n| {
                let mut s = (n.len() as u16).to_be_bytes().to_vec();
                s.extend_from_slice(n.as_bytes());
                s
            })
            .collect();
        let chapter_sizes: Vec<u32> = chapter_samples.iter().map(|s| s.len() as u32).collect();

        let video_sizes: Vec<u32> = (0..3).map(|_| 50).collect();
        let ftyp = ftyp();
        let video_base = ftyp.len() as u32 + 8;
        let chapter_base = video_base + 150;
        let mdat_payload: Vec<u8> = std::iter::repeat(0xCD_u8)
            .take(150)
            .chain(chapter_samples.iter().flatten().copied())
            .collect();
        let mdat = mp4_box(b"mdat", &mdat_payload);

        let video_stbl = container(
            b"stbl",
            &[
                stsd_video(640, 480, &[0x67], &[0x68]),
                stts(&[(3, 3000)]),
                stsz(0, 3, &video_sizes),
                stsc(&[(1, 3, 1)]),
                stco(&[video_base]),
            ],
        );
        let video_trak = container(
            b"trak",
            &[
                tkhd(1, 300),
                tref(b"chap", 2),
                container(
                    b"mdia",
                    &[
                        mdhd(90_000, 9000, 0, 0),
                        hdlr(b"vide", "VideoHandler"),
                        container(b"minf", &[vmhd(), video_stbl]),
                    ],
                ),
            ],
        );

        let text_stbl = container(
            b"stbl",
            &[
                stsd_empty(),
                stts(&[(3, 1000)]),
                stsz(0, 3, &chapter_sizes),
                stsc(&[(1, 3, 1)]),
                stco(&[chapter_base]),
            ],
        );
        let text_trak = container(
            b"trak",
            &[
                tkhd(2, 300),
                container(
                    b"mdia",
                    &[
                        mdhd(1000, 3000, 0, 0),
                        hdlr(b"text", "TextHandler"),
                        container(b"minf", &[text_stbl]),
                    ],
                ),
            ],
        );

        let moov = container(b"moov", &[mvhd(1000, 300, 0, 0), video_trak, text_trak]);
        let mut file = ftyp;
        file.extend_from_slice(&mdat);
        file.extend_from_slice(&moov);
        let path = write_mp4("chapter_linkage", &file);

        let demux = Mp4Demux::open(&path).unwrap();
        assert_eq!(demux.tracks()[0].chapters_track(), Some(1));
        assert_eq!(demux.tracks()[1].kind(), TrackType::Chapters);

        let chapters = demux.chapters();
        assert_eq!(chapters.len(), 3);
        for (i, chapter) in chapters.iter().enumerate() {
            assert_eq!(chapter.name, names[i]);
            assert_eq!(chapter.time_us, i as u64 * 1_000_000);
        }
    }

    #[test]
    fn metadata_cover_prefers_meta() {
        // Scenario E: a JPEG cover in udta and a PNG cover under the
        // meta dialect's artwork key; the meta one must win.
        let jpeg = sample_bytes(1, 64);
        let png = sample_bytes(2, 96);

        let udta_ilst = container(b"ilst", &[container(b"covr", &[data_box(13, &jpeg)])]);
        let mut udta_meta_payload = vec![0_u8; 4]; // version + flags
        udta_meta_payload.extend_from_slice(&hdlr(b"mdir", ""));
        udta_meta_payload.extend_from_slice(&udta_ilst);
        let udta = container(b"udta", &[mp4_box(b"meta", &udta_meta_payload)]);

        // moov/meta carries no version/flags
        let index_1 = container(&1_u32.to_be_bytes(), &[data_box(14, &png)]);
        let moov_meta = container(
            b"meta",
            &[
                hdlr(b"mdta", ""),
                keys(&["com.apple.quicktime.artwork"]),
                container(b"ilst", &[index_1]),
            ],
        );

        let moov = container(b"moov", &[mvhd(1000, 0, 0, 0), udta, moov_meta]);
        let mut file = ftyp();
        file.extend_from_slice(&moov);
        let path = write_mp4("cover_preference", &file);

        let mut demux = Mp4Demux::open(&path).unwrap();
        let cover = demux.metadata_cover(None).unwrap().unwrap();
        assert_eq!(cover.kind(), CoverKind::Png);
        assert_eq!(cover.size() as usize, png.len());

        let mut buf = vec![0_u8; png.len()];
        demux.metadata_cover(Some(&mut buf)).unwrap();
        assert_eq!(buf, png);

        // undersized buffer is a hard error
        let mut small = vec![0_u8; 10];
        assert!(matches!(
            demux.metadata_cover(Some(&mut small)),
            Err(Mp4Error::BufTooSmall { .. })
        ));
    }

    #[test]
    fn metadata_consolidation_order() {
        // meta entries first, then udta tags, then the ©xyz pair.
        let artist = data_box(1, b"Some Artist");
        let udta_ilst = container(b"ilst", &[container(b"\xa9ART", &[artist])]);
        let mut udta_meta_payload = vec![0_u8; 4];
        udta_meta_payload.extend_from_slice(&udta_ilst);

        let mut xyz_payload = Vec::new();
        let location = "+57.0000+011.0000/";
        xyz_payload.extend_from_slice(&(location.len() as u16).to_be_bytes());
        xyz_payload.extend_from_slice(&0x15C7_u16.to_be_bytes());
        xyz_payload.extend_from_slice(location.as_bytes());

        let udta = container(
            b"udta",
            &[
                mp4_box(b"meta", &udta_meta_payload),
                mp4_box(b"\xa9xyz", &xyz_payload),
            ],
        );

        let index_1 = container(&1_u32.to_be_bytes(), &[data_box(1, b"A Title")]);
        let moov_meta = container(
            b"meta",
            &[
                keys(&["com.apple.quicktime.title"]),
                container(b"ilst", &[index_1]),
            ],
        );

        let moov = container(b"moov", &[mvhd(1000, 0, 0, 0), udta, moov_meta]);
        let mut file = ftyp();
        file.extend_from_slice(&moov);
        let path = write_mp4("metadata_order", &file);

        let demux = Mp4Demux::open(&path).unwrap();
        let entries = demux.metadata_strings();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].key, "com.apple.quicktime.title");
        assert_eq!(entries[0].value, "A Title");
        assert_eq!(entries[1].key, "\u{a9}ART");
        assert_eq!(entries[1].value, "Some Artist");
        assert_eq!(entries[2].key, "\u{a9}xyz");
        assert_eq!(entries[2].value, location);
    }

    #[test]
    fn seek_to_sync_sample() {
        // Scenario F: sync samples [1, 31, 61]; seeking to the 40th
        // frame must land on 0-based sample 30.
        let sizes: Vec<u32> = vec![10; 90];
        let mdat_payload = vec![0xEE_u8; 900];
        let ftyp = ftyp();
        let base = ftyp.len() as u32 + 8;
        let mdat = mp4_box(b"mdat", &mdat_payload);

        let stbl = container(
            b"stbl",
            &[
                stsd_video(320, 240, &[0x67], &[0x68]),
                stts(&[(90, 3000)]),
                stss(&[1, 31, 61]),
                stsz(0, 90, &sizes),
                stsc(&[(1, 90, 1)]),
                stco(&[base]),
            ],
        );
        let mdia = container(
            b"mdia",
            &[
                mdhd(90_000, 270_000, 0, 0),
                hdlr(b"vide", "VideoHandler"),
                container(b"minf", &[vmhd(), stbl]),
            ],
        );
        let trak = container(b"trak", &[tkhd(1, 3000), mdia]);
        let moov = container(b"moov", &[mvhd(1000, 3000, 0, 0), trak]);
        let mut file = ftyp;
        file.extend_from_slice(&mdat);
        file.extend_from_slice(&moov);
        let path = write_mp4("seek_sync", &file);

        let mut demux = Mp4Demux::open(&path).unwrap();
        let frame_us = 33_333_u64;
        demux.seek(40 * frame_us, true).unwrap();
        assert_eq!(demux.tracks()[0].current_sample(), 30);

        // without the sync constraint the scan lands on the last
        // sample whose decode time does not exceed the target
        // (40 * 33333 µs is a hair before frame 40's timestamp)
        demux.seek(40 * frame_us, false).unwrap();
        assert_eq!(demux.tracks()[0].current_sample(), 39);

        // seeking past the end clamps to the last usable sync sample
        demux.seek(89 * frame_us, true).unwrap();
        assert_eq!(demux.tracks()[0].current_sample(), 60);
    }

    #[test]
    fn unknown_box_tolerance() {
        // Scenario G: a 64-byte `free` box inside moov changes nothing.
        let (file, _, _) = minimal_video_movie();
        let path = write_mp4("no_free", &file);
        let mut plain = Mp4Demux::open(&path).unwrap();

        // same movie with a free box spliced between mvhd and trak
        let path = write_mp4("with_free", &minimal_video_movie_with_free());
        let mut spliced = Mp4Demux::open(&path).unwrap();

        assert_eq!(plain.media_info(), spliced.media_info());
        assert_eq!(plain.track_count(), spliced.track_count());
        let a = &plain.tracks()[0];
        let b = &spliced.tracks()[0];
        assert_eq!(a.sample_offsets(), b.sample_offsets());
        assert_eq!(a.sample_sizes(), b.sample_sizes());
        assert_eq!(a.sample_decoding_times(), b.sample_decoding_times());
        assert_eq!(a.sync_samples(), b.sync_samples());

        let s1 = plain.next_sample(1, None, None).unwrap();
        let s2 = spliced.next_sample(1, None, None).unwrap();
        assert_eq!(s1, s2);
    }

    /// Scenario A movie with a 64-byte `free` box spliced into moov.
    fn minimal_video_movie_with_free() -> Vec<u8> {
        let sizes: Vec<u32> = (0..30).map(|i| 100 + i as u32).collect();
        let mdat_payload: Vec<u8> = sizes
            .iter()
            .enumerate()
            .flat_map(|(i, s)| sample_bytes(i, *s as usize))
            .collect();
        let ftyp = ftyp();
        let chunk_offset = ftyp.len() as u32 + 8;
        let mdat = mp4_box(b"mdat", &mdat_payload);

        let stbl = container(
            b"stbl",
            &[
                stsd_video(1280, 720, &[0x67, 1, 2, 3], &[0x68, 4, 5]),
                stts(&[(30, 3000)]),
                stss(&[1]),
                stsz(0, 30, &sizes),
                stsc(&[(1, 30, 1)]),
                stco(&[chunk_offset]),
            ],
        );
        let minf = container(b"minf", &[vmhd(), stbl]);
        let mdia = container(
            b"mdia",
            &[mdhd(90_000, 90_000, 0, 0), hdlr(b"vide", "VideoHandler"), minf],
        );
        let trak = container(b"trak", &[tkhd(1, 1000), mdia]);
        let free = mp4_box(b"free", &[0_u8; 56]);
        assert_eq!(free.len(), 64);
        let moov = container(
            b"moov",
            &[mvhd(1000, 1000, 0xCC2C_AF00, 0xCC2C_B000), free, trak],
        );

        let mut file = ftyp;
        file.extend_from_slice(&mdat);
        file.extend_from_slice(&moov);
        file
    }

    // ------------------------
    // Properties and API edges
    // ------------------------

    #[test]
    fn sample_index_invariants() {
        let (file, _, _) = minimal_video_movie();
        let file_size = file.len() as u64;
        let path = write_mp4("invariants", &file);
        let demux = Mp4Demux::open(&path).unwrap();

        for track in demux.tracks() {
            let n = track.sample_count() as usize;
            assert_eq!(track.sample_offsets().len(), n);
            assert_eq!(track.sample_sizes().len(), n);
            assert_eq!(track.sample_decoding_times().len(), n);

            for i in 0..n {
                assert!(
                    track.sample_offsets()[i] + track.sample_sizes()[i] as u64 <= file_size
                );
            }
            for w in track.sample_decoding_times().windows(2) {
                assert!(w[0] <= w[1]);
            }
            if let Some(sync) = track.sync_samples() {
                for w in sync.windows(2) {
                    assert!(w[0] < w[1]);
                }
                for s in sync {
                    assert!(*s >= 1 && *s <= track.sample_count());
                }
            }
        }
    }

    #[test]
    fn sample_round_trip() {
        // The concatenation of all sample reads equals the bytes at
        // the recorded file positions.
        let (file, sizes, _) = minimal_video_movie();
        let path = write_mp4("round_trip", &file);
        let mut demux = Mp4Demux::open(&path).unwrap();

        let offsets = demux.tracks()[0].sample_offsets().to_vec();
        let mut buf = vec![0_u8; 4096];
        for (i, size) in sizes.iter().enumerate() {
            let sample = demux.next_sample(1, Some(&mut buf), None).unwrap();
            assert_eq!(sample.sample_size, *size);
            let start = offsets[i] as usize;
            assert_eq!(&buf[..*size as usize], &file[start..start + *size as usize]);
        }
    }

    #[test]
    fn media_info_times() {
        let (file, _, _) = minimal_video_movie();
        let path = write_mp4("media_info", &file);
        let demux = Mp4Demux::open(&path).unwrap();

        let info = demux.media_info();
        assert_eq!(info.track_count, 1);
        assert_eq!(info.duration_us, 1_000_000);
        assert_eq!(
            info.creation_time,
            0xCC2C_AF00_i64 - MAC_TO_UNIX_EPOCH_OFFSET as i64
        );
        // the parsed modification time, not a copy of the creation time
        assert_eq!(
            info.modification_time,
            0xCC2C_B000_i64 - MAC_TO_UNIX_EPOCH_OFFSET as i64
        );
    }

    #[test]
    fn avc_decoder_config() {
        let (file, _, _) = minimal_video_movie();
        let path = write_mp4("avc_config", &file);
        let demux = Mp4Demux::open(&path).unwrap();

        let config = demux.avc_decoder_config(1).unwrap();
        assert_eq!(config.sps, Some(&[0x67_u8, 1, 2, 3][..]));
        assert_eq!(config.pps, Some(&[0x68_u8, 4, 5][..]));

        assert!(matches!(
            demux.avc_decoder_config(42),
            Err(Mp4Error::NotFound(_))
        ));
    }

    #[test]
    fn query_errors() {
        let (file, _, _) = minimal_video_movie();
        let path = write_mp4("query_errors", &file);
        let mut demux = Mp4Demux::open(&path).unwrap();

        assert!(matches!(demux.track_info(7), Err(Mp4Error::NotFound(_))));

        let mut tiny = [0_u8; 4];
        assert!(matches!(
            demux.next_sample(1, Some(&mut tiny), None),
            Err(Mp4Error::BufTooSmall { .. })
        ));
    }

    #[test]
    fn audio_track_info() {
        let sizes = 8_u32;
        let ftyp = ftyp();
        let base = ftyp.len() as u32 + 8;
        let mdat = mp4_box(b"mdat", &vec![0_u8; 4 * 8]);

        let stbl = container(
            b"stbl",
            &[
                stsd_audio(2, 16, 48_000 << 16),
                stts(&[(4, 1024)]),
                stsz(sizes, 4, &[]),
                stsc(&[(1, 4, 1)]),
                stco(&[base]),
            ],
        );
        let mdia = container(
            b"mdia",
            &[
                mdhd(48_000, 4096, 0, 0),
                hdlr(b"soun", "SoundHandler"),
                container(b"minf", &[stbl]),
            ],
        );
        let trak = container(b"trak", &[tkhd(1, 100), mdia]);
        let moov = container(b"moov", &[mvhd(1000, 100, 0, 0), trak]);
        let mut file = ftyp;
        file.extend_from_slice(&mdat);
        file.extend_from_slice(&moov);
        let path = write_mp4("audio_info", &file);

        let demux = Mp4Demux::open(&path).unwrap();
        let info = demux.track_info(0).unwrap();
        assert_eq!(info.kind, TrackType::Audio);
        let audio = info.audio.unwrap();
        assert_eq!(audio.channel_count, 2);
        assert_eq!(audio.sample_size, 16);
        assert_eq!(audio.sample_rate_hz(), 48_000);
        assert_eq!(audio.sample_rate_f32(), 48_000.0);
    }

    #[test]
    fn metadata_track_heuristic_link() {
        // One video and one metadata track with no tref still link.
        let ftyp = ftyp();
        let base = ftyp.len() as u32 + 8;
        let mdat = mp4_box(b"mdat", &vec![0_u8; 200]);

        let video_stbl = container(
            b"stbl",
            &[
                stsd_video(320, 240, &[0x67], &[0x68]),
                stts(&[(2, 3000)]),
                stsz(50, 2, &[]),
                stsc(&[(1, 2, 1)]),
                stco(&[base]),
            ],
        );
        let video_trak = container(
            b"trak",
            &[
                tkhd(1, 100),
                container(
                    b"mdia",
                    &[
                        mdhd(90_000, 6000, 0, 0),
                        hdlr(b"vide", "VideoHandler"),
                        container(b"minf", &[vmhd(), video_stbl]),
                    ],
                ),
            ],
        );

        // metadata stsd entry: 16 fixed bytes + two nul strings
        let mut meta_entry = Vec::new();
        let encoding = b"base64";
        let mime = b"application/json";
        let entry_len = 16 + encoding.len() + 1 + mime.len() + 1;
        meta_entry.extend_from_slice(&(entry_len as u32).to_be_bytes());
        meta_entry.extend_from_slice(b"mett");
        meta_entry.extend_from_slice(&[0_u8; 6]);
        meta_entry.extend_from_slice(&1_u16.to_be_bytes());
        meta_entry.extend_from_slice(encoding);
        meta_entry.push(0);
        meta_entry.extend_from_slice(mime);
        meta_entry.push(0);
        let mut stsd_meta_payload = vec![0_u8; 4];
        stsd_meta_payload.extend_from_slice(&1_u32.to_be_bytes());
        stsd_meta_payload.extend_from_slice(&meta_entry);
        let stsd_meta = mp4_box(b"stsd", &stsd_meta_payload);

        let meta_stbl = container(
            b"stbl",
            &[
                stsd_meta,
                stts(&[(2, 3000)]),
                stsz(50, 2, &[]),
                stsc(&[(1, 2, 1)]),
                stco(&[base + 100]),
            ],
        );
        let meta_trak = container(
            b"trak",
            &[
                tkhd(2, 100),
                container(
                    b"mdia",
                    &[
                        mdhd(90_000, 6000, 0, 0),
                        hdlr(b"meta", "MetadataHandler"),
                        container(b"minf", &[meta_stbl]),
                    ],
                ),
            ],
        );

        let moov = container(b"moov", &[mvhd(1000, 100, 0, 0), video_trak, meta_trak]);
        let mut file = ftyp;
        file.extend_from_slice(&mdat);
        file.extend_from_slice(&moov);
        let path = write_mp4("heuristic_link", &file);

        let mut demux = Mp4Demux::open(&path).unwrap();
        assert_eq!(demux.tracks()[0].metadata_track(), Some(1));
        assert_eq!(demux.tracks()[1].ref_track(), Some(0));

        let info = demux.track_info(0).unwrap();
        assert!(info.has_metadata);
        assert_eq!(info.metadata_content_encoding, Some("base64"));
        assert_eq!(info.metadata_mime_format, Some("application/json"));

        // the linked metadata sample is reported alongside
        let sample = demux.next_sample(1, None, None).unwrap();
        assert_eq!(sample.sample_size, 50);
        assert_eq!(sample.metadata_size, 50);
    }

    #[test]
    fn header_edge_cases() {
        // size values 2..7 are malformed
        let mut file = ftyp();
        file.extend_from_slice(&3_u32.to_be_bytes());
        file.extend_from_slice(b"free");
        let path = write_mp4("bad_size", &file);
        assert!(matches!(Mp4Demux::open(&path), Err(Mp4Error::Invalid(_))));

        // a declared size beyond the remaining bytes is a truncation
        let mut file = ftyp();
        file.extend_from_slice(&1024_u32.to_be_bytes());
        file.extend_from_slice(b"mdat");
        let path = write_mp4("truncated", &file);
        assert!(matches!(Mp4Demux::open(&path), Err(Mp4Error::Invalid(_))));

        // a nested zero-sized box is a format error
        let moov = container(b"moov", &[{
            let mut b = 0_u32.to_be_bytes().to_vec();
            b.extend_from_slice(b"free");
            b
        }]);
        let mut file = ftyp();
        file.extend_from_slice(&moov);
        let path = write_mp4("nested_zero", &file);
        assert!(matches!(Mp4Demux::open(&path), Err(Mp4Error::Invalid(_))));

        // a zero-sized box at the outermost level runs to EOF
        let (mut file, _, _) = minimal_video_movie();
        let mut tail = 0_u32.to_be_bytes().to_vec();
        tail.extend_from_slice(b"skip");
        tail.extend_from_slice(&[0_u8; 32]);
        file.extend_from_slice(&tail);
        let path = write_mp4("root_zero", &file);
        assert!(Mp4Demux::open(&path).is_ok());
    }

    #[test]
    fn largesize_and_uuid_boxes() {
        let sizes: Vec<u32> = (0..30).map(|i| 100 + i as u32).collect();
        let mdat_payload: Vec<u8> = sizes
            .iter()
            .enumerate()
            .flat_map(|(i, s)| sample_bytes(i, *s as usize))
            .collect();
        let ftyp = ftyp();
        let chunk_offset = ftyp.len() as u32 + 24 + 8; // uuid box precedes mdat
        let uuid = mp4_box(b"uuid", &[0x11_u8; 16]);
        let mdat = mp4_box(b"mdat", &mdat_payload);

        let stbl = container(
            b"stbl",
            &[
                stsd_video(1280, 720, &[0x67], &[0x68]),
                stts(&[(30, 3000)]),
                stsz(0, 30, &sizes),
                stsc(&[(1, 30, 1)]),
                stco(&[chunk_offset]),
            ],
        );
        let mdia = container(
            b"mdia",
            &[mdhd(90_000, 90_000, 0, 0), hdlr(b"vide", "VideoHandler"),
              container(b"minf", &[vmhd(), stbl])],
        );
        let trak = container(b"trak", &[tkhd(1, 1000), mdia]);
        let moov_children: Vec<u8> = [mvhd(1000, 1000, 0, 0), trak]
            .iter()
            .flatten()
            .copied()
            .collect();

        // 64-bit header: size32 == 1, then largesize
        let mut moov = Vec::new();
        moov.extend_from_slice(&1_u32.to_be_bytes());
        moov.extend_from_slice(b"moov");
        moov.extend_from_slice(&(moov_children.len() as u64 + 16).to_be_bytes());
        moov.extend_from_slice(&moov_children);

        let mut file = ftyp;
        file.extend_from_slice(&uuid);
        file.extend_from_slice(&mdat);
        file.extend_from_slice(&moov);
        let path = write_mp4("largesize_uuid", &file);

        let demux = Mp4Demux::open(&path).unwrap();
        assert_eq!(demux.track_count(), 1);
        assert_eq!(demux.tracks()[0].sample_count(), 30);
        assert_eq!(demux.tracks()[0].sample_offsets()[0], chunk_offset as u64);
    }
}

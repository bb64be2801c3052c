use std::fs;
use std::path;

use assert_matches::assert_matches;
use m3u8_decoder::attributes::{ClosedCaptions, HdcpLevel, KeyMethod, QuotedOrUnquoted};
use m3u8_decoder::playlist::*;
use m3u8_decoder::*;

fn all_sample_m3u_playlists() -> Vec<path::PathBuf> {
    let path: path::PathBuf = ["sample-playlists"].iter().collect();
    fs::read_dir(path)
        .unwrap()
        .filter_map(Result::ok)
        .map(|dir| dir.path())
        .filter(|path| path.extension().map_or(false, |ext| ext == "m3u8"))
        .collect()
}

fn get_sample_playlist(name: &str) -> String {
    let path: path::PathBuf = ["sample-playlists", name].iter().collect();
    fs::read_to_string(&path).unwrap_or_else(|_| panic!("Can't find m3u8: {:?}", path))
}

fn decode_sample(name: &str) -> Playlist {
    println!("Decoding playlist file: {:?}", name);
    match decode(&get_sample_playlist(name)) {
        Ok(playlist) => {
            println!("{}", playlist);
            playlist
        }
        Err(err) => panic!("Decoding {} failed: {} ({:?})", name, err, err),
    }
}

// -----------------------------------------------------------------------------------------------
// Sample playlists

#[test]
fn playlist_master() {
    let playlist = decode_sample("master.m3u8");
    assert_eq!(playlist.variant_streams().count(), 5);
    assert_eq!(playlist.entries.len(), 5);
}

#[test]
fn playlist_master_with_alternatives() {
    let playlist = decode_sample("master-with-alternatives.m3u8");
    assert_eq!(playlist.alternate_media().count(), 9);
    assert_eq!(playlist.variant_streams().count(), 3);

    let german = playlist
        .alternate_media()
        .find(|m| m.language.as_deref() == Some("de"))
        .unwrap();
    assert_eq!(german.media_type, AlternativeMediaType::Audio);
    assert_eq!(german.uri.as_deref(), Some("main/german-audio.m3u8"));
    assert!(german.is_autoselect);
    assert!(!german.is_default);

    let hi = playlist.variant_streams().last().unwrap();
    assert_eq!(hi.average_bandwidth, Some(6000000));
    assert_eq!(hi.resolution, Some(Resolution { width: 1920, height: 1080 }));
    assert_eq!(hi.frame_rate, Some(29.970));
    assert_eq!(hi.audio_group.as_deref(), Some("aac"));
    assert_eq!(hi.closed_captions, Some(ClosedCaptions::None));
}

#[test]
fn playlist_master_with_i_frame_stream_inf() {
    let playlist = decode_sample("master-with-i-frame-stream-inf.m3u8");
    assert_eq!(playlist.version, Some(4));
    assert!(playlist.independent_segments);

    let uris: Vec<_> = playlist
        .variant_streams()
        .map(|v| (v.is_iframe, v.uri.as_str()))
        .collect();
    assert_eq!(
        uris,
        vec![
            (false, "low/audio-video.m3u8"),
            (true, "low/iframe.m3u8"),
            (false, "mid/audio-video.m3u8"),
            (true, "mid/iframe.m3u8"),
            (false, "hi/audio-video.m3u8"),
            (true, "hi/iframe.m3u8"),
            (false, "audio-only.m3u8"),
        ]
    );

    let first = playlist.variant_streams().next().unwrap();
    assert_eq!(first.hdcp_level, Some(HdcpLevel::None));
}

#[test]
fn playlist_master_with_session_data() {
    let playlist = decode_sample("master-with-session-data.m3u8");

    assert_matches!(
        &playlist.entries[0],
        Entry::SessionData(SessionData { field: SessionDataField::Uri(uri), .. }) if uri == "lyrics.json"
    );
    assert_matches!(
        &playlist.entries[2],
        Entry::SessionData(SessionData { field: SessionDataField::Value(v), language: Some(l), .. })
            if v == "Este es un ejemplo" && l == "es"
    );
    assert_matches!(
        &playlist.entries[3],
        Entry::SessionKey(SessionKey(Key { method: KeyMethod::SAMPLE_AES, .. }))
    );
    assert_matches!(
        &playlist.entries[4],
        Entry::Start(Start { time_offset, is_precise: true }) if *time_offset == -12.5
    );

    let variant = playlist.variant_streams().next().unwrap();
    assert_eq!(
        variant.closed_captions,
        Some(ClosedCaptions::GroupId("cc1".into()))
    );
}

#[test]
fn playlist_media_standard() {
    let playlist = decode_sample("mediaplaylist.m3u8");
    assert_eq!(playlist.target_duration, Some(10.0));
    assert_eq!(playlist.media_sequence, Some(0));
    assert_eq!(playlist.media_playlist_type(), Some(MediaPlaylistType::Vod));
    assert!(!playlist.is_live);
    assert_eq!(playlist.duration(), 29.5);

    let last = playlist.media_segments().last().unwrap();
    assert_eq!(last.title.as_deref(), Some("Last segment"));
    assert_eq!(last.uri, "http://media.example.com/entire2.ts");
}

#[test]
fn playlist_media_with_byterange() {
    let playlist = decode_sample("media-playlist-with-byterange.m3u8");
    let ranges: Vec<_> = playlist
        .media_segments()
        .map(|s| (s.duration, s.byte_range))
        .collect();
    assert_eq!(
        ranges,
        vec![
            (10.0, Some(ByteRange { length: 75232, offset: Some(0) })),
            (10.0, Some(ByteRange { length: 82112, offset: Some(752321) })),
            (10.0, Some(ByteRange { length: 69864, offset: None })),
        ]
    );
}

#[test]
fn playlist_media_with_discontinuity() {
    let playlist = decode_sample("media-playlist-with-discontinuity.m3u8");
    assert_eq!(playlist.discontinuity_sequence, Some(3));
    assert_eq!(playlist.allow_cache, Some(true));
    assert!(playlist.is_live);

    let tags: Vec<_> = playlist.entries.iter().map(Entry::tag_name).collect();
    assert_eq!(
        tags,
        vec![
            "EXT-X-PROGRAM-DATE-TIME",
            "EXTINF",
            "EXTINF",
            "EXT-X-DISCONTINUITY",
            "EXT-X-KEY",
            "EXTINF",
            "EXT-X-KEY",
            "EXTINF",
        ]
    );
    assert_matches!(
        &playlist.entries[4],
        Entry::Key(Key { method: KeyMethod::AES_128, iv: Some(iv), .. }) if iv == "0x9c7db8778570d05c3177c349fd9236aa"
    );
    assert_matches!(&playlist.entries[6], Entry::Key(Key { method: KeyMethod::None, uri: None, .. }));
}

#[test]
fn playlist_media_fmp4_daterange() {
    let playlist = decode_sample("media-playlist-fmp4-daterange.m3u8");

    assert_eq!(
        playlist.entries[0],
        Entry::Map(Map {
            uri: "init.mp4".into(),
            byte_range: Some(ByteRange { length: 720, offset: Some(0) }),
        })
    );

    let Entry::DateRange(range) = &playlist.entries[2] else {
        panic!("expected a date range, got {:?}", playlist.entries[2]);
    };
    assert_eq!(range.id, "splice-6FFFFFF0");
    assert_eq!(range.class.as_deref(), Some("com.example.ad"));
    assert_eq!(range.planned_duration, Some(59.993));
    assert_eq!(
        range.attrs.get("X-AD-ID"),
        Some(&QuotedOrUnquoted::Quoted("ad-123".into()))
    );
    assert!(range.attrs.contains_key("SCTE35-OUT"));
    assert!(!range.attrs.contains_key("ID"));

    assert_matches!(&playlist.entries[5], Entry::DateRange(DateRange { duration: Some(_), end_date: Some(_), .. }));
}

#[test]
fn playlist_media_low_latency() {
    let playlist = decode_sample("media-playlist-low-latency.m3u8");

    assert_matches!(
        &playlist.entries[0],
        Entry::ServerControl(ServerControl { can_block_reload: true, can_skip_until: Some(_), .. })
    );
    assert_matches!(&playlist.entries[1], Entry::PartInf(PartInf { part_target }) if *part_target == 0.33334);
    assert_matches!(&playlist.entries[2], Entry::Skip(Skip { skipped_segments: 3, .. }));

    let parts: Vec<_> = playlist
        .entries
        .iter()
        .filter_map(|e| match e {
            Entry::Part(p) => Some(p),
            _ => None,
        })
        .collect();
    assert_eq!(parts.len(), 3);
    assert!(parts[0].is_independent);
    assert!(parts[2].is_gap);
    assert_eq!(parts[2].byte_range, Some(ByteRange { length: 2000, offset: Some(0) }));

    let reports = playlist
        .entries
        .iter()
        .filter(|e| matches!(e, Entry::RenditionReport(_)))
        .count();
    assert_eq!(reports, 2);
    assert_matches!(
        playlist.entries.iter().find(|e| matches!(e, Entry::PreloadHint(_))),
        Some(Entry::PreloadHint(PreloadHint { hint_type, .. })) if hint_type == "PART"
    );
}

#[test]
fn playlist_media_without_segments() {
    let playlist = decode_sample("media-playlist-without-segments.m3u8");
    assert!(playlist.entries.is_empty());
    assert!(!playlist.is_master);
    assert_eq!(playlist.media_playlist_type(), Some(MediaPlaylistType::Event));
}

// -----------------------------------------------------------------------------------------------
// Playlist with no newline end

#[test]
fn playlist_not_ending_in_newline_master() {
    let playlist = decode_sample("master-not-ending-in-newline.m3u8");
    assert_eq!(
        playlist.variant_streams().last().map(|v| v.uri.as_str()),
        Some("hi/prog_index.m3u8")
    );
}

#[test]
fn playlist_not_ending_in_newline_media() {
    let playlist = decode_sample("media-not-ending-in-newline.m3u8");
    assert_eq!(
        playlist.media_segments().last().map(|s| s.uri.as_str()),
        Some("second.ts")
    );
}

// -----------------------------------------------------------------------------------------------
// Playlist type detection tests

#[test]
fn playlist_types() {
    for path_buf in all_sample_m3u_playlists() {
        let name = path_buf.file_name().unwrap().to_str().unwrap();
        let playlist = decode_sample(name);

        println!("{:?} = {:?}", name, playlist.is_master);

        assert_eq!(name.to_lowercase().contains("master"), playlist.is_master);
    }
}

#[test]
fn sample_playlists_decode_deterministically() {
    for path_buf in all_sample_m3u_playlists() {
        let text = fs::read_to_string(&path_buf).unwrap();
        assert_eq!(decode(&text).unwrap(), decode(&text).unwrap());
    }
}

#[test]
fn reader_and_bytes_agree_with_str() {
    let text = get_sample_playlist("master-with-alternatives.m3u8");
    let from_str = decode(&text).unwrap();

    assert_eq!(decode_bytes(text.as_bytes()).unwrap(), from_str);
    assert_eq!(decode_reader(text.as_bytes()).unwrap(), from_str);
}

// -----------------------------------------------------------------------------------------------
// Variant

#[test]
fn variant_stream_with_quoted_codecs() {
    let playlist = decode(
        "#EXTM3U\n#EXT-X-STREAM-INF:PROGRAM-ID=1,BANDWIDTH=195023,CODECS=\"avc1.42e00a,mp4a.40.2\",AUDIO=\"audio\"\nlo/prog_index.m3u8\n",
    )
    .unwrap();

    assert!(playlist.is_master);
    assert_eq!(
        playlist.entries,
        vec![Entry::VariantStream(VariantStream {
            uri: "lo/prog_index.m3u8".into(),
            bandwidth: 195023,
            program_id: Some(1),
            codecs: Some("avc1.42e00a,mp4a.40.2".into()),
            audio_group: Some("audio".into()),
            ..Default::default()
        })]
    );
}

// -----------------------------------------------------------------------------------------------
// Errors

#[test]
fn truncated_sample_keeps_partial_playlist() {
    let text = get_sample_playlist("mediaplaylist.m3u8");
    let cut = &text[..text.find("http://media.example.com/entire2.ts").unwrap()];

    let err = decode(cut).unwrap_err();
    assert_matches!(err.kind(), ErrorKind::TruncatedPlaylist { tag: "EXTINF" });
    assert_eq!(err.line(), Some(10));

    let partial = err.into_partial();
    assert_eq!(partial.media_segments().count(), 2);
    assert_eq!(partial.target_duration, Some(10.0));
}

#[test]
fn master_tag_in_media_sample_is_rejected() {
    let mut text = get_sample_playlist("mediaplaylist.m3u8");
    text.push_str("#EXT-X-STREAM-INF:BANDWIDTH=1\nother.m3u8\n");

    let err = decode(&text).unwrap_err();
    assert_matches!(err.kind(), ErrorKind::MixedPlaylistKind { tag: "EXT-X-STREAM-INF" });
    assert_eq!(err.partial().media_segments().count(), 3);
}

#[test]
fn error_display_names_line_and_tag() {
    let err = decode("#EXTM3U\n#EXT-X-MEDIA:TYPE=AUDIO,NAME=\"English\"\n").unwrap_err();
    assert_eq!(
        err.to_string(),
        "line 2: EXT-X-MEDIA: missing required attribute GROUP-ID"
    );
}

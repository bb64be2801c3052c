//! Tag constructors.
//!
//! Each function receives the text after the tag's colon and builds the
//! record for that tag. None of them look at the surrounding document; how a
//! record ends up in the playlist is decided by the dispatcher.

use chrono::{DateTime, FixedOffset};
use tracing::warn;

use crate::attributes::{self, parse_attribute_list, AttributeList, KeyMethod};
use crate::decoder::DecodeOptions;
use crate::error::ErrorKind;
use crate::playlist::*;

fn attribute_list(
    tag: &'static str,
    body: &str,
    options: &DecodeOptions,
) -> Result<AttributeList, ErrorKind> {
    Ok(parse_attribute_list(tag, body)?.lenient(options.lenient_optional_fields))
}

// Single-value header tags are optional playlist fields, so lenient mode
// drops them like an optional attribute.
fn header_value<T>(
    tag: &'static str,
    body: &str,
    options: &DecodeOptions,
    convert: fn(&'static str, Option<&'static str>, &str) -> Result<T, ErrorKind>,
) -> Result<Option<T>, ErrorKind> {
    match convert(tag, None, body.trim()) {
        Ok(v) => Ok(Some(v)),
        Err(err) if options.lenient_optional_fields => {
            warn!(tag, error = %err, "dropping malformed playlist header value");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

// -----------------------------------------------------------------------------------------------
// Playlist header tags
// -----------------------------------------------------------------------------------------------

pub fn version(body: &str, options: &DecodeOptions) -> Result<Option<u8>, ErrorKind> {
    header_value("EXT-X-VERSION", body, options, |tag, key, value| {
        let n = attributes::number_value(tag, key, value)?;
        u8::try_from(n).map_err(|_| ErrorKind::InvalidNumber {
            tag,
            key,
            value: value.to_string(),
        })
    })
}

pub fn target_duration(body: &str, options: &DecodeOptions) -> Result<Option<f64>, ErrorKind> {
    header_value("EXT-X-TARGETDURATION", body, options, attributes::float_value)
}

pub fn media_sequence(body: &str, options: &DecodeOptions) -> Result<Option<u64>, ErrorKind> {
    header_value("EXT-X-MEDIA-SEQUENCE", body, options, attributes::number_value)
}

pub fn discontinuity_sequence(body: &str, options: &DecodeOptions) -> Result<Option<u64>, ErrorKind> {
    header_value("EXT-X-DISCONTINUITY-SEQUENCE", body, options, attributes::number_value)
}

pub fn allow_cache(body: &str, options: &DecodeOptions) -> Result<Option<bool>, ErrorKind> {
    header_value("EXT-X-ALLOW-CACHE", body, options, attributes::bool_value)
}

/// Kept as written; `None` for an empty value.
pub fn playlist_type(body: &str) -> Option<String> {
    match body.trim() {
        "" => None,
        t => Some(t.to_string()),
    }
}

// -----------------------------------------------------------------------------------------------
// Master playlist tags
// -----------------------------------------------------------------------------------------------

/// `#EXT-X-STREAM-INF`; the URI is filled in from the following line.
pub fn variant_stream(body: &str, options: &DecodeOptions) -> Result<VariantStream, ErrorKind> {
    let attrs = attribute_list("EXT-X-STREAM-INF", body, options)?;
    stream_inf(attrs, false)
}

/// `#EXT-X-I-FRAME-STREAM-INF`, complete on its own line.
pub fn iframe_variant_stream(body: &str, options: &DecodeOptions) -> Result<VariantStream, ErrorKind> {
    let attrs = attribute_list("EXT-X-I-FRAME-STREAM-INF", body, options)?;
    stream_inf(attrs, true)
}

fn stream_inf(mut attrs: AttributeList, is_iframe: bool) -> Result<VariantStream, ErrorKind> {
    let uri = match is_iframe {
        true => attrs.required_str("URI")?,
        false => String::new(),
    };

    Ok(VariantStream {
        is_iframe,
        uri,
        bandwidth: attrs.required_u64("BANDWIDTH")?,
        average_bandwidth: attrs.optional_u64("AVERAGE-BANDWIDTH")?,
        program_id: attrs.optional_u64("PROGRAM-ID")?,
        codecs: attrs.optional_str("CODECS"),
        resolution: attrs.optional_resolution("RESOLUTION")?,
        frame_rate: attrs.optional_f64("FRAME-RATE")?,
        hdcp_level: attrs.optional_str("HDCP-LEVEL").map(|s| s.as_str().into()),
        audio_group: attrs.optional_str("AUDIO"),
        video_group: attrs.optional_str("VIDEO"),
        subtitles_group: attrs.optional_str("SUBTITLES"),
        closed_captions: attrs.optional_closed_captions("CLOSED-CAPTIONS"),
    })
}

pub fn alternate_media(body: &str, options: &DecodeOptions) -> Result<AlternateMedia, ErrorKind> {
    let mut attrs = attribute_list("EXT-X-MEDIA", body, options)?;

    Ok(AlternateMedia {
        media_type: attrs.required_str("TYPE")?.as_str().into(),
        uri: attrs.optional_str("URI"),
        group_id: attrs.required_str("GROUP-ID")?,
        language: attrs.optional_str("LANGUAGE"),
        assoc_language: attrs.optional_str("ASSOC-LANGUAGE"),
        name: attrs.required_str("NAME")?,
        is_default: attrs.bool_or("DEFAULT", false)?,
        is_autoselect: attrs.bool_or("AUTOSELECT", false)?,
        is_forced: attrs.bool_or("FORCED", false)?,
        instream_id: attrs.optional_str("INSTREAM-ID"),
        characteristics: attrs.optional_str("CHARACTERISTICS"),
        channels: attrs.optional_str("CHANNELS"),
    })
}

pub fn session_key(body: &str, options: &DecodeOptions) -> Result<SessionKey, ErrorKind> {
    let attrs = attribute_list("EXT-X-SESSION-KEY", body, options)?;
    key_from(attrs).map(SessionKey)
}

pub fn session_data(body: &str, options: &DecodeOptions) -> Result<SessionData, ErrorKind> {
    let mut attrs = attribute_list("EXT-X-SESSION-DATA", body, options)?;
    let data_id = attrs.required_str("DATA-ID")?;

    // VALUE wins when both are present.
    let field = match (attrs.optional_str("VALUE"), attrs.optional_str("URI")) {
        (Some(value), _) => SessionDataField::Value(value),
        (None, Some(uri)) => SessionDataField::Uri(uri),
        (None, None) => {
            return Err(ErrorKind::MissingField {
                tag: attrs.tag(),
                key: "VALUE",
            })
        }
    };

    Ok(SessionData {
        data_id,
        field,
        language: attrs.optional_str("LANGUAGE"),
    })
}

// -----------------------------------------------------------------------------------------------
// Media segment tags
// -----------------------------------------------------------------------------------------------

/// `#EXTINF:<duration>,[<title>]`; the URI is filled in from the following line.
pub fn media_segment(body: &str) -> Result<MediaSegment, ErrorKind> {
    let (duration, title) = body.split_once(',').unwrap_or((body, ""));
    let title = title.trim();

    Ok(MediaSegment {
        uri: String::new(),
        duration: attributes::float_value("EXTINF", None, duration.trim())?,
        title: match title.is_empty() {
            true => None,
            false => Some(title.to_string()),
        },
        byte_range: None,
    })
}

pub fn byte_range(body: &str) -> Result<ByteRange, ErrorKind> {
    attributes::byte_range_value("EXT-X-BYTERANGE", None, body.trim())
}

pub fn key(body: &str, options: &DecodeOptions) -> Result<Key, ErrorKind> {
    let attrs = attribute_list("EXT-X-KEY", body, options)?;
    key_from(attrs)
}

fn key_from(mut attrs: AttributeList) -> Result<Key, ErrorKind> {
    Ok(Key {
        method: KeyMethod::from(attrs.required_str("METHOD")?.as_str()),
        uri: attrs.optional_str("URI"),
        iv: attrs.optional_str("IV"),
        key_format: attrs.optional_str("KEYFORMAT"),
        key_format_versions: attrs.optional_str("KEYFORMATVERSIONS"),
    })
}

pub fn map(body: &str, options: &DecodeOptions) -> Result<Map, ErrorKind> {
    let mut attrs = attribute_list("EXT-X-MAP", body, options)?;

    Ok(Map {
        uri: attrs.required_str("URI")?,
        byte_range: attrs.optional_byte_range("BYTERANGE")?,
    })
}

pub fn program_date_time(body: &str) -> Result<DateTime<FixedOffset>, ErrorKind> {
    attributes::date_time_value("EXT-X-PROGRAM-DATE-TIME", None, body.trim())
}

pub fn date_range(body: &str, options: &DecodeOptions) -> Result<DateRange, ErrorKind> {
    let mut attrs = attribute_list("EXT-X-DATERANGE", body, options)?;

    let id = attrs.required_str("ID")?;
    let class = attrs.optional_str("CLASS");
    let start_date = attrs.required_date_time("START-DATE")?;
    let end_date = attrs.optional_date_time("END-DATE")?;
    let duration = attrs.optional_f64("DURATION")?;
    let planned_duration = attrs.optional_f64("PLANNED-DURATION")?;
    let end_on_next = attrs.bool_or("END-ON-NEXT", false)?;

    Ok(DateRange {
        id,
        class,
        start_date,
        end_date,
        duration,
        planned_duration,
        end_on_next,
        attrs: attrs.into_remaining(),
    })
}

// -----------------------------------------------------------------------------------------------
// Low-latency tags
// -----------------------------------------------------------------------------------------------

pub fn server_control(body: &str, options: &DecodeOptions) -> Result<ServerControl, ErrorKind> {
    let mut attrs = attribute_list("EXT-X-SERVER-CONTROL", body, options)?;

    Ok(ServerControl {
        can_skip_until: attrs.optional_f64("CAN-SKIP-UNTIL")?,
        can_skip_dateranges: attrs.bool_or("CAN-SKIP-DATERANGES", false)?,
        hold_back: attrs.optional_f64("HOLD-BACK")?,
        part_hold_back: attrs.optional_f64("PART-HOLD-BACK")?,
        can_block_reload: attrs.bool_or("CAN-BLOCK-RELOAD", false)?,
    })
}

pub fn part_inf(body: &str, options: &DecodeOptions) -> Result<PartInf, ErrorKind> {
    let mut attrs = attribute_list("EXT-X-PART-INF", body, options)?;

    Ok(PartInf {
        part_target: attrs.required_f64("PART-TARGET")?,
    })
}

pub fn part(body: &str, options: &DecodeOptions) -> Result<Part, ErrorKind> {
    let mut attrs = attribute_list("EXT-X-PART", body, options)?;

    Ok(Part {
        duration: attrs.required_f64("DURATION")?,
        uri: attrs.required_str("URI")?,
        is_independent: attrs.bool_or("INDEPENDENT", false)?,
        byte_range: attrs.optional_byte_range("BYTERANGE")?,
        is_gap: attrs.bool_or("GAP", false)?,
    })
}

pub fn rendition_report(body: &str, options: &DecodeOptions) -> Result<RenditionReport, ErrorKind> {
    let mut attrs = attribute_list("EXT-X-RENDITION-REPORT", body, options)?;

    Ok(RenditionReport {
        uri: attrs.required_str("URI")?,
        last_msn: attrs.optional_u64("LAST-MSN")?,
        last_part: attrs.optional_u64("LAST-PART")?,
    })
}

pub fn skip(body: &str, options: &DecodeOptions) -> Result<Skip, ErrorKind> {
    let mut attrs = attribute_list("EXT-X-SKIP", body, options)?;

    Ok(Skip {
        skipped_segments: attrs.required_u64("SKIPPED-SEGMENTS")?,
        recently_removed_dateranges: attrs
            .optional_str("RECENTLY-REMOVED-DATERANGES")
            .map(|ids| {
                ids.split('\t')
                    .filter(|id| !id.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default(),
    })
}

pub fn preload_hint(body: &str, options: &DecodeOptions) -> Result<PreloadHint, ErrorKind> {
    let mut attrs = attribute_list("EXT-X-PRELOAD-HINT", body, options)?;

    Ok(PreloadHint {
        hint_type: attrs.required_str("TYPE")?,
        uri: attrs.required_str("URI")?,
        byte_range_start: attrs.optional_u64("BYTERANGE-START")?,
        byte_range_length: attrs.optional_u64("BYTERANGE-LENGTH")?,
    })
}

// -----------------------------------------------------------------------------------------------
// Rest
// -----------------------------------------------------------------------------------------------

pub fn start(body: &str, options: &DecodeOptions) -> Result<Start, ErrorKind> {
    let mut attrs = attribute_list("EXT-X-START", body, options)?;

    Ok(Start {
        time_offset: attrs.required_signed_f64("TIME-OFFSET")?,
        is_precise: attrs.bool_or("PRECISE", false)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn strict() -> DecodeOptions {
        DecodeOptions::default()
    }

    #[test]
    fn extinf_with_and_without_title() {
        assert_eq!(
            media_segment("2.002,title").unwrap(),
            MediaSegment {
                duration: 2.002,
                title: Some("title".into()),
                ..Default::default()
            }
        );
        assert_eq!(media_segment("9.009,").unwrap().title, None);
        assert_eq!(media_segment("10").unwrap().duration, 10.0);
        assert_matches!(
            media_segment("ten,"),
            Err(ErrorKind::InvalidNumber { tag: "EXTINF", key: None, .. })
        );
    }

    #[test]
    fn variant_stream_attributes() {
        let stream = variant_stream(
            r#"PROGRAM-ID=1,BANDWIDTH=195023,CODECS="avc1.42e00a,mp4a.40.2",AUDIO="audio",RESOLUTION=416x234,CLOSED-CAPTIONS=NONE"#,
            &strict(),
        )
        .unwrap();

        assert_eq!(
            stream,
            VariantStream {
                is_iframe: false,
                uri: "".into(),
                bandwidth: 195023,
                program_id: Some(1),
                codecs: Some("avc1.42e00a,mp4a.40.2".into()),
                resolution: Some(Resolution { width: 416, height: 234 }),
                audio_group: Some("audio".into()),
                closed_captions: Some(crate::attributes::ClosedCaptions::None),
                ..Default::default()
            }
        );
    }

    #[test]
    fn variant_stream_requires_bandwidth() {
        assert_matches!(
            variant_stream("CODECS=\"xxx\"", &strict()),
            Err(ErrorKind::MissingField { tag: "EXT-X-STREAM-INF", key: "BANDWIDTH" })
        );
    }

    #[test]
    fn iframe_variant_requires_uri() {
        let stream = iframe_variant_stream(r#"BANDWIDTH=86000,URI="low/iframe.m3u8""#, &strict()).unwrap();
        assert!(stream.is_iframe);
        assert_eq!(stream.uri, "low/iframe.m3u8");

        assert_matches!(
            iframe_variant_stream("BANDWIDTH=86000", &strict()),
            Err(ErrorKind::MissingField { key: "URI", .. })
        );
    }

    #[test]
    fn alternate_media_booleans() {
        let media = alternate_media(
            r#"TYPE=AUDIO,GROUP-ID="aac",LANGUAGE="en",NAME="English",DEFAULT=YES,AUTOSELECT=YES"#,
            &strict(),
        )
        .unwrap();
        assert_eq!(media.media_type, AlternativeMediaType::Audio);
        assert!(media.is_default && media.is_autoselect && !media.is_forced);
        assert_eq!(media.uri, None);

        assert_matches!(
            alternate_media(r#"TYPE=AUDIO,GROUP-ID="aac",NAME="x",DEFAULT=yes"#, &strict()),
            Err(ErrorKind::InvalidBoolean { key: Some("DEFAULT"), .. })
        );
    }

    #[test]
    fn map_with_byte_range() {
        assert_eq!(
            map(r#"URI="init.mp4",BYTERANGE="720@0""#, &strict()).unwrap(),
            Map {
                uri: "init.mp4".into(),
                byte_range: Some(ByteRange { length: 720, offset: Some(0) }),
            }
        );
    }

    #[test]
    fn key_method() {
        let k = key(r#"METHOD=AES-128,URI="https://priv.example.com/key.php?r=52",IV=0x9c7db8778570d05c3177c349fd9236aa"#, &strict())
            .unwrap();
        assert_eq!(k.method, KeyMethod::AES_128);
        assert_eq!(k.uri.as_deref(), Some("https://priv.example.com/key.php?r=52"));
        assert_eq!(k.iv.as_deref(), Some("0x9c7db8778570d05c3177c349fd9236aa"));
    }

    #[test]
    fn date_range_keeps_client_attributes() {
        let range = date_range(
            r#"ID="splice-6FFFFFF0",CLASS="com.example.ad",START-DATE="2014-03-05T11:15:00Z",PLANNED-DURATION=59.993,X-AD-ID="1234""#,
            &strict(),
        )
        .unwrap();
        assert_eq!(range.id, "splice-6FFFFFF0");
        assert_eq!(range.planned_duration, Some(59.993));
        assert_eq!(range.attrs.len(), 1);
        assert_eq!(range.attrs["X-AD-ID"].as_str(), "1234");

        assert_matches!(
            date_range(r#"ID="a",START-DATE="yesterday""#, &strict()),
            Err(ErrorKind::InvalidDateTime { key: Some("START-DATE"), .. })
        );
    }

    #[test]
    fn low_latency_tags() {
        assert_eq!(part_inf("PART-TARGET=1.004", &strict()).unwrap().part_target, 1.004);

        let p = part(r#"DURATION=1.0,URI="part1.mp4",INDEPENDENT=YES"#, &strict()).unwrap();
        assert!(p.is_independent && !p.is_gap);

        let s = skip("SKIPPED-SEGMENTS=3,RECENTLY-REMOVED-DATERANGES=\"a\tb\"", &strict()).unwrap();
        assert_eq!(s.skipped_segments, 3);
        assert_eq!(s.recently_removed_dateranges, vec!["a".to_string(), "b".to_string()]);

        let control = server_control("CAN-BLOCK-RELOAD=YES,PART-HOLD-BACK=3.012", &strict()).unwrap();
        assert!(control.can_block_reload);
        assert_eq!(control.part_hold_back, Some(3.012));
    }

    #[test]
    fn start_accepts_negative_offset() {
        assert_eq!(
            start("TIME-OFFSET=-12.5,PRECISE=YES", &strict()).unwrap(),
            Start { time_offset: -12.5, is_precise: true }
        );
    }

    #[test]
    fn session_data_value_or_uri() {
        let data = session_data(r#"DATA-ID="com.example.title",VALUE="This is an example""#, &strict()).unwrap();
        assert_eq!(data.field, SessionDataField::Value("This is an example".into()));

        assert_matches!(
            session_data(r#"DATA-ID="com.example.title""#, &strict()),
            Err(ErrorKind::MissingField { key: "VALUE", .. })
        );
    }

    #[test]
    fn lenient_header_values() {
        let lenient = DecodeOptions::default().lenient_optional_fields(true);
        assert_eq!(discontinuity_sequence("x", &lenient).unwrap(), None);
        assert_matches!(
            discontinuity_sequence("x", &strict()),
            Err(ErrorKind::InvalidNumber { tag: "EXT-X-DISCONTINUITY-SEQUENCE", .. })
        );
        assert_matches!(version("300", &strict()), Err(ErrorKind::InvalidNumber { .. }));
        assert_eq!(playlist_type(" VOD"), Some("VOD".to_string()));
        assert_eq!(playlist_type("  "), None);
        assert_eq!(version("7", &strict()).unwrap(), Some(7));
    }
}

//! Contains all the structs produced by decoding.
//!
//! The main type here is [`Playlist`], whose `entries` hold one [`Entry`]
//! per decoded tag, in document order.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};

use crate::attributes::{ClosedCaptions, HdcpLevel, KeyMethod, QuotedOrUnquoted};

/// A decoded [Playlist](https://tools.ietf.org/html/draft-pantos-http-live-streaming-19#section-4.1).
///
/// A Playlist is a Media Playlist if all URI lines in the Playlist
/// identify Media Segments.  A Playlist is a Master Playlist if all URI
/// lines in the Playlist identify Media Playlists.  A Playlist MUST be
/// either a Media Playlist or a Master Playlist; all other Playlists are invalid.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Playlist {
    pub is_master: bool,
    /// Cleared by `#EXT-X-ENDLIST`.
    pub is_live: bool,
    /// `#EXT-X-VERSION:<n>`
    pub version: Option<u8>,
    /// `#EXT-X-TARGETDURATION:<s>`
    pub target_duration: Option<f64>,
    /// `#EXT-X-MEDIA-SEQUENCE:<number>`
    pub media_sequence: Option<u64>,
    /// `#EXT-X-DISCONTINUITY-SEQUENCE:<number>`
    pub discontinuity_sequence: Option<u64>,
    /// `#EXT-X-PLAYLIST-TYPE:<EVENT|VOD>`, kept as written.
    pub playlist_type: Option<String>,
    /// `#EXT-X-ALLOW-CACHE:<YES|NO>`
    pub allow_cache: Option<bool>,
    /// `#EXT-X-INDEPENDENT-SEGMENTS`
    pub independent_segments: bool,
    /// `#EXT-X-I-FRAMES-ONLY`
    pub iframe_only: bool,
    pub entries: Vec<Entry>,
}

impl Default for Playlist {
    fn default() -> Self {
        Playlist {
            is_master: false,
            is_live: true,
            version: None,
            target_duration: None,
            media_sequence: None,
            discontinuity_sequence: None,
            playlist_type: None,
            allow_cache: None,
            independent_segments: false,
            iframe_only: false,
            entries: Vec::new(),
        }
    }
}

impl Playlist {
    pub fn new() -> Playlist {
        Default::default()
    }

    /// Typed view of `playlist_type`; `None` when absent or not `EVENT`/`VOD`.
    pub fn media_playlist_type(&self) -> Option<MediaPlaylistType> {
        self.playlist_type
            .as_deref()
            .and_then(|t| MediaPlaylistType::from_str(t).ok())
    }

    pub fn media_segments(&self) -> impl Iterator<Item = &MediaSegment> {
        self.entries.iter().filter_map(|e| match e {
            Entry::MediaSegment(s) => Some(s),
            _ => None,
        })
    }

    pub fn variant_streams(&self) -> impl Iterator<Item = &VariantStream> {
        self.entries.iter().filter_map(|e| match e {
            Entry::VariantStream(v) => Some(v),
            _ => None,
        })
    }

    pub fn alternate_media(&self) -> impl Iterator<Item = &AlternateMedia> {
        self.entries.iter().filter_map(|e| match e {
            Entry::AlternateMedia(m) => Some(m),
            _ => None,
        })
    }

    /// Sum of all `#EXTINF` durations.
    pub fn duration(&self) -> f64 {
        self.media_segments().map(|s| s.duration).sum()
    }
}

/// One decoded tag, or a tag together with the URI line that completed it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Entry {
    MediaSegment(MediaSegment),
    VariantStream(VariantStream),
    AlternateMedia(AlternateMedia),
    Map(Map),
    Key(Key),
    ProgramDateTime(DateTime<FixedOffset>),
    DateRange(DateRange),
    ServerControl(ServerControl),
    PartInf(PartInf),
    Part(Part),
    RenditionReport(RenditionReport),
    Skip(Skip),
    SessionKey(SessionKey),
    SessionData(SessionData),
    Start(Start),
    Discontinuity,
    PreloadHint(PreloadHint),
}

impl Entry {
    /// Name of the tag that produced this entry, without the leading `#`.
    pub fn tag_name(&self) -> &'static str {
        match self {
            Entry::MediaSegment(_) => "EXTINF",
            Entry::VariantStream(v) if v.is_iframe => "EXT-X-I-FRAME-STREAM-INF",
            Entry::VariantStream(_) => "EXT-X-STREAM-INF",
            Entry::AlternateMedia(_) => "EXT-X-MEDIA",
            Entry::Map(_) => "EXT-X-MAP",
            Entry::Key(_) => "EXT-X-KEY",
            Entry::ProgramDateTime(_) => "EXT-X-PROGRAM-DATE-TIME",
            Entry::DateRange(_) => "EXT-X-DATERANGE",
            Entry::ServerControl(_) => "EXT-X-SERVER-CONTROL",
            Entry::PartInf(_) => "EXT-X-PART-INF",
            Entry::Part(_) => "EXT-X-PART",
            Entry::RenditionReport(_) => "EXT-X-RENDITION-REPORT",
            Entry::Skip(_) => "EXT-X-SKIP",
            Entry::SessionKey(_) => "EXT-X-SESSION-KEY",
            Entry::SessionData(_) => "EXT-X-SESSION-DATA",
            Entry::Start(_) => "EXT-X-START",
            Entry::Discontinuity => "EXT-X-DISCONTINUITY",
            Entry::PreloadHint(_) => "EXT-X-PRELOAD-HINT",
        }
    }
}

// -----------------------------------------------------------------------------------------------
// Master Playlist
// -----------------------------------------------------------------------------------------------

/// [`#EXT-X-STREAM-INF:<attribute-list>`]
/// (https://tools.ietf.org/html/draft-pantos-http-live-streaming-19#section-4.3.4.2)
/// [`#EXT-X-I-FRAME-STREAM-INF:<attribute-list>`]
/// (https://tools.ietf.org/html/draft-pantos-http-live-streaming-19#section-4.3.4.3)
///
/// A Variant Stream includes a Media Playlist that specifies media
/// encoded at a particular bit rate, in a particular format, and at a
/// particular resolution for media containing video.
///
/// The URI of a regular variant comes from the line after the tag, the
/// URI of an I-frame variant from its `URI` attribute.
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct VariantStream {
    pub is_iframe: bool,
    pub uri: String,

    // <attribute-list>
    pub bandwidth: u64,
    pub average_bandwidth: Option<u64>,
    // PROGRAM-ID tag was removed in protocol version 6
    pub program_id: Option<u64>,
    pub codecs: Option<String>,
    pub resolution: Option<Resolution>,
    pub frame_rate: Option<f64>,
    pub hdcp_level: Option<HdcpLevel>,
    pub audio_group: Option<String>,
    pub video_group: Option<String>,
    pub subtitles_group: Option<String>,
    pub closed_captions: Option<ClosedCaptions>,
}

/// [`#EXT-X-MEDIA:<attribute-list>`]
/// (https://tools.ietf.org/html/draft-pantos-http-live-streaming-19#section-4.3.4.1)
///
/// The EXT-X-MEDIA tag is used to relate Media Playlists that contain
/// alternative Renditions of the same content.
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AlternateMedia {
    // <attribute-list>
    pub media_type: AlternativeMediaType,
    pub uri: Option<String>,
    pub group_id: String,
    pub language: Option<String>,
    pub assoc_language: Option<String>,
    pub name: String,
    pub is_default: bool,    // Its absence indicates an implicit value of NO
    pub is_autoselect: bool, // Its absence indicates an implicit value of NO
    pub is_forced: bool,     // Its absence indicates an implicit value of NO
    pub instream_id: Option<String>,
    pub characteristics: Option<String>,
    pub channels: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum AlternativeMediaType {
    Audio,
    #[default]
    Video,
    Subtitles,
    ClosedCaptions,
    Other(String),
}

impl From<&str> for AlternativeMediaType {
    fn from(s: &str) -> Self {
        match s {
            "AUDIO" => AlternativeMediaType::Audio,
            "VIDEO" => AlternativeMediaType::Video,
            "SUBTITLES" => AlternativeMediaType::Subtitles,
            "CLOSED-CAPTIONS" => AlternativeMediaType::ClosedCaptions,
            _ => AlternativeMediaType::Other(s.to_string()),
        }
    }
}

impl fmt::Display for AlternativeMediaType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AlternativeMediaType::Audio => write!(f, "AUDIO"),
            AlternativeMediaType::Video => write!(f, "VIDEO"),
            AlternativeMediaType::Subtitles => write!(f, "SUBTITLES"),
            AlternativeMediaType::ClosedCaptions => write!(f, "CLOSED-CAPTIONS"),
            AlternativeMediaType::Other(s) => write!(f, "{}", s),
        }
    }
}

/// [`#EXT-X-SESSION-KEY:<attribute-list>`]
/// (https://tools.ietf.org/html/draft-pantos-http-live-streaming-19#section-4.3.4.5)
/// The EXT-X-SESSION-KEY tag allows encryption keys from Media Playlists
/// to be specified in a Master Playlist.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SessionKey(pub Key);

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SessionDataField {
    Value(String),
    Uri(String),
}

/// [`#EXT-X-SESSION-DATA:<attribute-list>`]
/// (https://tools.ietf.org/html/draft-pantos-http-live-streaming-19#section-4.3.4.4)
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SessionData {
    pub data_id: String,
    pub field: SessionDataField,
    pub language: Option<String>,
}

// -----------------------------------------------------------------------------------------------
// Media Playlist
// -----------------------------------------------------------------------------------------------

/// [`#EXT-X-PLAYLIST-TYPE:<EVENT|VOD>`]
/// (https://tools.ietf.org/html/draft-pantos-http-live-streaming-19#section-4.3.3.5)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum MediaPlaylistType {
    Event,
    Vod,
}

impl FromStr for MediaPlaylistType {
    type Err = String;

    fn from_str(s: &str) -> Result<MediaPlaylistType, String> {
        match s {
            "EVENT" => Ok(MediaPlaylistType::Event),
            "VOD" => Ok(MediaPlaylistType::Vod),
            _ => Err(format!("Unable to create MediaPlaylistType from {:?}", s)),
        }
    }
}

/// A [Media Segment](https://tools.ietf.org/html/draft-pantos-http-live-streaming-19#section-3)
/// is specified by a URI and optionally a byte range.
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MediaSegment {
    pub uri: String,
    /// `#EXTINF:<duration>,[<title>]`
    pub duration: f64,
    /// `#EXTINF:<duration>,[<title>]`
    pub title: Option<String>,
    /// `#EXT-X-BYTERANGE:<n>[@<o>]`
    pub byte_range: Option<ByteRange>,
}

/// [`#EXT-X-KEY:<attribute-list>`]
/// (https://tools.ietf.org/html/draft-pantos-http-live-streaming-19#section-4.3.2.4)
///
/// Media Segments MAY be encrypted.  The EXT-X-KEY tag specifies how to
/// decrypt them.  It applies to every Media Segment that appears between
/// it and the next EXT-X-KEY tag in the Playlist file with the same
/// KEYFORMAT attribute (or the end of the Playlist file).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Key {
    pub method: KeyMethod,
    pub uri: Option<String>,
    pub iv: Option<String>,
    pub key_format: Option<String>,
    pub key_format_versions: Option<String>,
}

/// [`#EXT-X-MAP:<attribute-list>`]
/// (https://tools.ietf.org/html/draft-pantos-http-live-streaming-19#section-4.3.2.5)
///
/// The EXT-X-MAP tag specifies how to obtain the Media Initialization Section
/// required to parse the applicable Media Segments.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Map {
    pub uri: String,
    pub byte_range: Option<ByteRange>,
}

/// [`#EXT-X-BYTERANGE:<n>[@<o>]`]
/// (https://tools.ietf.org/html/draft-pantos-http-live-streaming-19#section-4.3.2.2)
///
/// The EXT-X-BYTERANGE tag indicates that a Media Segment is a sub-range
/// of the resource identified by its URI.  It applies only to the next
/// URI line that follows it in the Playlist.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ByteRange {
    pub length: u64,
    pub offset: Option<u64>,
}

/// `<width>x<height>`
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Resolution {
    pub width: u64,
    pub height: u64,
}

/// [`#EXT-X-DATERANGE:<attribute-list>`]
/// (https://tools.ietf.org/html/draft-pantos-http-live-streaming-19#section-4.3.2.7)
///
/// The EXT-X-DATERANGE tag associates a Date Range (i.e. a range of time
/// defined by a starting and ending date) with a set of attribute /
/// value pairs.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DateRange {
    pub id: String,
    pub class: Option<String>,
    pub start_date: DateTime<FixedOffset>,
    pub end_date: Option<DateTime<FixedOffset>>,
    pub duration: Option<f64>,
    pub planned_duration: Option<f64>,
    pub end_on_next: bool,
    /// Every other attribute, `X-<client-attribute>` and `SCTE35-*` included.
    pub attrs: HashMap<String, QuotedOrUnquoted>,
}

// -----------------------------------------------------------------------------------------------
// Low-latency
// -----------------------------------------------------------------------------------------------

/// `#EXT-X-SERVER-CONTROL:<attribute-list>`
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ServerControl {
    pub can_skip_until: Option<f64>,
    pub can_skip_dateranges: bool,
    pub hold_back: Option<f64>,
    pub part_hold_back: Option<f64>,
    pub can_block_reload: bool,
}

/// `#EXT-X-PART-INF:PART-TARGET=<s>`
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PartInf {
    pub part_target: f64,
}

/// `#EXT-X-PART:<attribute-list>`, a partial segment carrying its own URI.
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Part {
    pub duration: f64,
    pub uri: String,
    pub is_independent: bool,
    pub byte_range: Option<ByteRange>,
    pub is_gap: bool,
}

/// `#EXT-X-RENDITION-REPORT:<attribute-list>`
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RenditionReport {
    pub uri: String,
    pub last_msn: Option<u64>,
    pub last_part: Option<u64>,
}

/// `#EXT-X-SKIP:<attribute-list>`
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Skip {
    pub skipped_segments: u64,
    pub recently_removed_dateranges: Vec<String>,
}

/// `#EXT-X-PRELOAD-HINT:<attribute-list>`
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PreloadHint {
    pub hint_type: String,
    pub uri: String,
    pub byte_range_start: Option<u64>,
    pub byte_range_length: Option<u64>,
}

// -----------------------------------------------------------------------------------------------
// Rest
// -----------------------------------------------------------------------------------------------

/// [`#EXT-X-START:<attribute-list>`]
/// (https://tools.ietf.org/html/draft-pantos-http-live-streaming-19#section-4.3.5.2)
///
/// The EXT-X-START tag indicates a preferred point at which to start
/// playing a Playlist. By default, clients SHOULD start playback at
/// this point when beginning a playback session.
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Start {
    pub time_offset: f64,
    pub is_precise: bool,
}

// -----------------------------------------------------------------------------------------------
// Display
// -----------------------------------------------------------------------------------------------

impl fmt::Display for Playlist {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.is_master {
            true => write!(f, "[Master Playlist")?,
            false => write!(f, "[Media Playlist")?,
        }

        if let Some(v) = self.version {
            write!(f, ", version: {}", v)?;
        }
        if let Some(d) = self.target_duration {
            write!(f, " ~ duration: {:?}", d)?;
        }
        if let Some(s) = self.media_sequence {
            write!(f, " ~ seq: {}", s)?;
        }
        if let Some(t) = &self.playlist_type {
            write!(f, " ~ type: {}", t)?;
        }
        if !self.is_master && !self.is_live {
            write!(f, " [ended]")?;
        }
        if self.iframe_only {
            write!(f, " [iframes only]")?;
        }
        if self.independent_segments {
            write!(f, " [independent segments]")?;
        }

        writeln!(f, " | {} entries]", self.entries.len())?;

        for (i, entry) in self.entries.iter().enumerate() {
            writeln!(f, " {} -> {}", i + 1, entry)?;
        }

        Ok(())
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Entry::MediaSegment(s) => {
                write!(f, "[Segment |")?;
                if let Some(v) = &s.title {
                    write!(f, " title: {:?} ~", v)?;
                }
                write!(f, " duration: {:?}", s.duration)?;
                if let Some(r) = &s.byte_range {
                    write!(f, " ~ byterange: {}", r)?;
                }
                write!(f, " ~ uri: {:?}]", s.uri)
            }
            Entry::VariantStream(v) => {
                match v.is_iframe {
                    true => write!(f, "[VariantIFrame |")?,
                    false => write!(f, "[Variant |")?,
                };
                write!(f, " uri: {:?} ~ bandwidth: {}", v.uri, v.bandwidth)?;
                if let Some(r) = &v.resolution {
                    write!(f, " ~ res: {}x{}", r.width, r.height)?;
                }
                if let Some(c) = &v.codecs {
                    write!(f, " ~ codecs: {}", c)?;
                }
                if let Some(a) = &v.audio_group {
                    write!(f, " ~ audio: {}", a)?;
                }
                write!(f, "]")
            }
            Entry::AlternateMedia(m) => {
                write!(
                    f,
                    "[AlternativeMedia | type: {} ~ group: {} ~ name: {:?}",
                    m.media_type, m.group_id, m.name
                )?;
                if let Some(v) = &m.uri {
                    write!(f, " ~ uri: {:?}", v)?;
                }
                if let Some(v) = &m.language {
                    write!(f, " ~ lang: {}", v)?;
                }
                write!(f, " ~ default: {} ~ autoselect: {}]", m.is_default, m.is_autoselect)
            }
            Entry::Map(m) => {
                write!(f, "[Map | uri: {:?}", m.uri)?;
                if let Some(r) = &m.byte_range {
                    write!(f, " ~ byterange: {}", r)?;
                }
                write!(f, "]")
            }
            Entry::Key(k) => write!(f, "[Key | method: {}]", k.method),
            Entry::SessionKey(SessionKey(k)) => write!(f, "[SessionKey | method: {}]", k.method),
            Entry::ProgramDateTime(t) => write!(f, "[ProgramDateTime | {}]", t.to_rfc3339()),
            Entry::DateRange(d) => write!(f, "[DateRange | id: {:?} ~ start: {}]", d.id, d.start_date.to_rfc3339()),
            Entry::Part(p) => write!(f, "[Part | duration: {:?} ~ uri: {:?}]", p.duration, p.uri),
            Entry::Discontinuity => write!(f, "[Discontinuity]"),
            other => write!(f, "[{}]", other.tag_name()),
        }
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.length)?;
        if let Some(o) = self.offset {
            write!(f, "@{}", o)?;
        }
        Ok(())
    }
}

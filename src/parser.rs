//! Line dispatch.
//!
//! Every recognized tag has a row in [`TAG_RULES`]: its name, whether it
//! belongs to master or media playlists, and the constructor that turns the
//! text after its colon into a [`Directive`] for the decode session.

use chrono::{DateTime, FixedOffset};

use crate::decoder::DecodeOptions;
use crate::error::ErrorKind;
use crate::playlist::*;
use crate::tags;

/// Which kind of playlist a tag may appear in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TagClass {
    Master,
    Media,
    /// Allowed in both.
    Neutral,
}

/// What the session should do with a decoded tag.
#[derive(Debug)]
pub(crate) enum Directive {
    Header(HeaderField),
    /// Append to the entries now.
    Commit(Entry),
    /// Hold until the next URI line.
    AwaitSegment(MediaSegment),
    AwaitVariant(VariantStream),
    /// Attach to the pending segment, or open one.
    ByteRange(ByteRange),
    /// No value to record: empty, or dropped by lenient mode.
    Nothing,
}

#[derive(Debug)]
pub(crate) enum HeaderField {
    Version(u8),
    TargetDuration(f64),
    MediaSequence(u64),
    DiscontinuitySequence(u64),
    PlaylistType(String),
    AllowCache(bool),
    IndependentSegments,
    IFramesOnly,
    EndList,
}

type Build = fn(&str, &DecodeOptions) -> Result<Directive, ErrorKind>;

pub(crate) struct TagRule {
    /// Tag name including the leading `#`.
    pub name: &'static str,
    pub class: TagClass,
    pub build: Build,
}

impl TagRule {
    /// Tag name without the leading `#`, as used in errors.
    pub fn tag(&self) -> &'static str {
        &self.name[1..]
    }

    /// The text after the colon when `line` is this tag.
    ///
    /// A bare prefix match is not enough: `#EXT-X-MEDIA` must not claim
    /// `#EXT-X-MEDIA-SEQUENCE:3`, so the name has to be followed by `:` or
    /// the end of the line.
    fn body<'a>(&self, line: &'a str) -> Option<&'a str> {
        let rest = line.strip_prefix(self.name)?;
        match rest.is_empty() {
            true => Some(rest),
            false => rest.strip_prefix(':'),
        }
    }
}

fn header(field: Option<HeaderField>) -> Directive {
    field.map(Directive::Header).unwrap_or(Directive::Nothing)
}

fn date_time_entry(t: DateTime<FixedOffset>) -> Directive {
    Directive::Commit(Entry::ProgramDateTime(t))
}

/// Every recognized tag, longer names before any shorter name they extend.
pub(crate) const TAG_RULES: &[TagRule] = &[
    // Master playlist
    TagRule {
        name: "#EXT-X-I-FRAME-STREAM-INF",
        class: TagClass::Master,
        build: |body, opts| {
            tags::iframe_variant_stream(body, opts).map(|v| Directive::Commit(Entry::VariantStream(v)))
        },
    },
    TagRule {
        name: "#EXT-X-STREAM-INF",
        class: TagClass::Master,
        build: |body, opts| tags::variant_stream(body, opts).map(Directive::AwaitVariant),
    },
    TagRule {
        name: "#EXT-X-MEDIA-SEQUENCE",
        class: TagClass::Media,
        build: |body, opts| {
            tags::media_sequence(body, opts).map(|n| header(n.map(HeaderField::MediaSequence)))
        },
    },
    TagRule {
        name: "#EXT-X-MEDIA",
        class: TagClass::Master,
        build: |body, opts| tags::alternate_media(body, opts).map(|m| Directive::Commit(Entry::AlternateMedia(m))),
    },
    TagRule {
        name: "#EXT-X-SESSION-DATA",
        class: TagClass::Master,
        build: |body, opts| tags::session_data(body, opts).map(|d| Directive::Commit(Entry::SessionData(d))),
    },
    TagRule {
        name: "#EXT-X-SESSION-KEY",
        class: TagClass::Master,
        build: |body, opts| tags::session_key(body, opts).map(|k| Directive::Commit(Entry::SessionKey(k))),
    },
    // Media playlist header
    TagRule {
        name: "#EXT-X-TARGETDURATION",
        class: TagClass::Media,
        build: |body, opts| {
            tags::target_duration(body, opts).map(|d| header(d.map(HeaderField::TargetDuration)))
        },
    },
    TagRule {
        name: "#EXT-X-DISCONTINUITY-SEQUENCE",
        class: TagClass::Media,
        build: |body, opts| {
            tags::discontinuity_sequence(body, opts)
                .map(|n| header(n.map(HeaderField::DiscontinuitySequence)))
        },
    },
    TagRule {
        name: "#EXT-X-PLAYLIST-TYPE",
        class: TagClass::Media,
        build: |body, _| Ok(header(tags::playlist_type(body).map(HeaderField::PlaylistType))),
    },
    TagRule {
        name: "#EXT-X-ALLOW-CACHE",
        class: TagClass::Media,
        build: |body, opts| tags::allow_cache(body, opts).map(|b| header(b.map(HeaderField::AllowCache))),
    },
    TagRule {
        name: "#EXT-X-I-FRAMES-ONLY",
        class: TagClass::Media,
        build: |_, _| Ok(Directive::Header(HeaderField::IFramesOnly)),
    },
    TagRule {
        name: "#EXT-X-ENDLIST",
        class: TagClass::Media,
        build: |_, _| Ok(Directive::Header(HeaderField::EndList)),
    },
    // Media segments
    TagRule {
        name: "#EXTINF",
        class: TagClass::Media,
        build: |body, _| tags::media_segment(body).map(Directive::AwaitSegment),
    },
    TagRule {
        name: "#EXT-X-BYTERANGE",
        class: TagClass::Media,
        build: |body, _| tags::byte_range(body).map(Directive::ByteRange),
    },
    TagRule {
        name: "#EXT-X-DISCONTINUITY",
        class: TagClass::Media,
        build: |_, _| Ok(Directive::Commit(Entry::Discontinuity)),
    },
    TagRule {
        name: "#EXT-X-KEY",
        class: TagClass::Media,
        build: |body, opts| tags::key(body, opts).map(|k| Directive::Commit(Entry::Key(k))),
    },
    TagRule {
        name: "#EXT-X-MAP",
        class: TagClass::Media,
        build: |body, opts| tags::map(body, opts).map(|m| Directive::Commit(Entry::Map(m))),
    },
    TagRule {
        name: "#EXT-X-PROGRAM-DATE-TIME",
        class: TagClass::Media,
        build: |body, _| tags::program_date_time(body).map(date_time_entry),
    },
    TagRule {
        name: "#EXT-X-DATERANGE",
        class: TagClass::Media,
        build: |body, opts| tags::date_range(body, opts).map(|d| Directive::Commit(Entry::DateRange(d))),
    },
    // Low-latency
    TagRule {
        name: "#EXT-X-SERVER-CONTROL",
        class: TagClass::Media,
        build: |body, opts| {
            tags::server_control(body, opts).map(|c| Directive::Commit(Entry::ServerControl(c)))
        },
    },
    TagRule {
        name: "#EXT-X-PART-INF",
        class: TagClass::Media,
        build: |body, opts| tags::part_inf(body, opts).map(|p| Directive::Commit(Entry::PartInf(p))),
    },
    TagRule {
        name: "#EXT-X-PART",
        class: TagClass::Media,
        build: |body, opts| tags::part(body, opts).map(|p| Directive::Commit(Entry::Part(p))),
    },
    TagRule {
        name: "#EXT-X-RENDITION-REPORT",
        class: TagClass::Media,
        build: |body, opts| {
            tags::rendition_report(body, opts).map(|r| Directive::Commit(Entry::RenditionReport(r)))
        },
    },
    TagRule {
        name: "#EXT-X-SKIP",
        class: TagClass::Media,
        build: |body, opts| tags::skip(body, opts).map(|s| Directive::Commit(Entry::Skip(s))),
    },
    TagRule {
        name: "#EXT-X-PRELOAD-HINT",
        class: TagClass::Media,
        build: |body, opts| tags::preload_hint(body, opts).map(|h| Directive::Commit(Entry::PreloadHint(h))),
    },
    // Either kind
    TagRule {
        name: "#EXT-X-VERSION",
        class: TagClass::Neutral,
        build: |body, opts| tags::version(body, opts).map(|v| header(v.map(HeaderField::Version))),
    },
    TagRule {
        name: "#EXT-X-INDEPENDENT-SEGMENTS",
        class: TagClass::Neutral,
        build: |_, _| Ok(Directive::Header(HeaderField::IndependentSegments)),
    },
    TagRule {
        name: "#EXT-X-START",
        class: TagClass::Neutral,
        build: |body, opts| tags::start(body, opts).map(|s| Directive::Commit(Entry::Start(s))),
    },
];

/// A trimmed, non-blank line after the header.
#[derive(Debug)]
pub(crate) enum Line<'a> {
    Tag(&'static TagRule, &'a str),
    /// Unknown tag or comment.
    Ignored,
    Uri(&'a str),
}

pub(crate) fn classify(line: &str) -> Line<'_> {
    if !line.starts_with('#') {
        return Line::Uri(line);
    }

    TAG_RULES
        .iter()
        .find_map(|rule| rule.body(line).map(|body| Line::Tag(rule, body)))
        .unwrap_or(Line::Ignored)
}

impl std::fmt::Debug for TagRule {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("TagRule")
            .field("name", &self.name)
            .field("class", &self.class)
            .finish()
    }
}

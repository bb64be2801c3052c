//! The decode session: feeds lines through the dispatch table and assembles
//! a [`Playlist`].

use std::io::Read;

use tracing::{debug, trace};

use crate::error::{DecodeError, ErrorKind};
use crate::parser::{self, Directive, HeaderField, Line, TagClass, TagRule};
use crate::playlist::*;

/// Knobs for [`decode_with`].
///
/// ```
/// use m3u8_decoder::DecodeOptions;
///
/// let options = DecodeOptions::default().lenient_optional_fields(true);
/// assert!(options.lenient_optional_fields);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Drop optional attributes and header values that fail to convert
    /// instead of failing the decode. Every drop is logged with `warn!`.
    /// Required attributes are never relaxed.
    pub lenient_optional_fields: bool,
}

impl DecodeOptions {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn lenient_optional_fields(mut self, lenient: bool) -> Self {
        self.lenient_optional_fields = lenient;
        self
    }
}

/// Decode a playlist with the default options.
///
/// ```
/// let playlist = m3u8_decoder::decode("#EXTM3U\n#EXTINF:9.009,\nsegment1.ts\n#EXT-X-ENDLIST\n").unwrap();
/// assert!(!playlist.is_master);
/// assert!(!playlist.is_live);
/// assert_eq!(playlist.entries.len(), 1);
/// ```
pub fn decode(text: &str) -> Result<Playlist, DecodeError> {
    decode_with(text, &DecodeOptions::default())
}

pub fn decode_with(text: &str, options: &DecodeOptions) -> Result<Playlist, DecodeError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    debug!(bytes = text.len(), lenient = options.lenient_optional_fields, "decoding playlist");

    let mut session = Session::new(options);
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Err(kind) = session.step(line, idx + 1) {
            return Err(session.fail(kind, Some(idx + 1)));
        }
    }

    let playlist = session.finish()?;
    debug!(
        entries = playlist.entries.len(),
        is_master = playlist.is_master,
        "decoded playlist"
    );
    Ok(playlist)
}

/// Decode raw bytes, which must be UTF-8.
pub fn decode_bytes(input: &[u8]) -> Result<Playlist, DecodeError> {
    match std::str::from_utf8(input) {
        Ok(text) => decode(text),
        Err(err) => Err(DecodeError::new(err.into(), None, Playlist::new())),
    }
}

/// Read everything from `reader` and decode it.
pub fn decode_reader<R: Read>(mut reader: R) -> Result<Playlist, DecodeError> {
    let mut buf = Vec::new();
    if let Err(err) = reader.read_to_end(&mut buf) {
        return Err(DecodeError::new(err.into(), None, Playlist::new()));
    }
    decode_bytes(&buf)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    AwaitingHeader,
    Streaming,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlaylistKind {
    Master,
    Media,
}

/// A tag waiting for its URI line.
#[derive(Debug)]
enum Pending {
    Segment {
        segment: MediaSegment,
        /// False while the segment was opened by `#EXT-X-BYTERANGE` alone.
        extinf_seen: bool,
        line: usize,
    },
    Variant {
        variant: VariantStream,
        line: usize,
    },
}

impl Pending {
    fn tag(&self) -> &'static str {
        match self {
            Pending::Segment { extinf_seen: false, .. } => "EXT-X-BYTERANGE",
            Pending::Segment { .. } => "EXTINF",
            Pending::Variant { .. } => "EXT-X-STREAM-INF",
        }
    }

    fn line(&self) -> usize {
        match self {
            Pending::Segment { line, .. } | Pending::Variant { line, .. } => *line,
        }
    }

    fn into_entry(self, uri: &str) -> Entry {
        match self {
            Pending::Segment { mut segment, .. } => {
                segment.uri = uri.to_string();
                Entry::MediaSegment(segment)
            }
            Pending::Variant { mut variant, .. } => {
                variant.uri = uri.to_string();
                Entry::VariantStream(variant)
            }
        }
    }
}

struct Session<'o> {
    options: &'o DecodeOptions,
    playlist: Playlist,
    phase: Phase,
    kind: Option<PlaylistKind>,
    /// `Some` exactly while a URI line is expected.
    pending: Option<Pending>,
}

impl<'o> Session<'o> {
    fn new(options: &'o DecodeOptions) -> Self {
        Session {
            options,
            playlist: Playlist::new(),
            phase: Phase::AwaitingHeader,
            kind: None,
            pending: None,
        }
    }

    fn step(&mut self, line: &str, number: usize) -> Result<(), ErrorKind> {
        if self.phase == Phase::AwaitingHeader {
            if line != "#EXTM3U" {
                return Err(ErrorKind::MissingHeader);
            }
            self.phase = Phase::Streaming;
            return Ok(());
        }

        match parser::classify(line) {
            Line::Tag(rule, body) => {
                self.observe(rule)?;
                let directive = (rule.build)(body, self.options)?;
                self.apply(directive, number)
            }
            Line::Ignored => {
                trace!(line = number, text = line, "ignoring line");
                Ok(())
            }
            Line::Uri(uri) => match self.pending.take() {
                Some(pending) => {
                    self.playlist.entries.push(pending.into_entry(uri));
                    Ok(())
                }
                None => Err(ErrorKind::UnexpectedUri { uri: uri.to_string() }),
            },
        }
    }

    fn observe(&mut self, rule: &TagRule) -> Result<(), ErrorKind> {
        let kind = match rule.class {
            TagClass::Master => PlaylistKind::Master,
            TagClass::Media => PlaylistKind::Media,
            TagClass::Neutral => return Ok(()),
        };

        match self.kind {
            Some(seen) if seen != kind => Err(ErrorKind::MixedPlaylistKind { tag: rule.tag() }),
            _ => {
                self.kind = Some(kind);
                self.playlist.is_master = kind == PlaylistKind::Master;
                Ok(())
            }
        }
    }

    fn apply(&mut self, directive: Directive, line: usize) -> Result<(), ErrorKind> {
        match directive {
            Directive::Header(field) => self.set_header(field),
            Directive::Commit(entry) => self.playlist.entries.push(entry),
            Directive::AwaitSegment(segment) => self.await_segment(segment, line)?,
            Directive::AwaitVariant(variant) => {
                self.ensure_nothing_pending()?;
                self.pending = Some(Pending::Variant { variant, line });
            }
            Directive::ByteRange(range) => self.attach_byte_range(range, line),
            Directive::Nothing => {}
        }
        Ok(())
    }

    fn set_header(&mut self, field: HeaderField) {
        let playlist = &mut self.playlist;
        match field {
            HeaderField::Version(v) => playlist.version = Some(v),
            HeaderField::TargetDuration(d) => playlist.target_duration = Some(d),
            HeaderField::MediaSequence(n) => playlist.media_sequence = Some(n),
            HeaderField::DiscontinuitySequence(n) => playlist.discontinuity_sequence = Some(n),
            HeaderField::PlaylistType(t) => playlist.playlist_type = Some(t),
            HeaderField::AllowCache(b) => playlist.allow_cache = Some(b),
            HeaderField::IndependentSegments => playlist.independent_segments = true,
            HeaderField::IFramesOnly => playlist.iframe_only = true,
            HeaderField::EndList => playlist.is_live = false,
        }
    }

    fn ensure_nothing_pending(&self) -> Result<(), ErrorKind> {
        match &self.pending {
            Some(pending) => Err(ErrorKind::TruncatedPlaylist { tag: pending.tag() }),
            None => Ok(()),
        }
    }

    fn await_segment(&mut self, next: MediaSegment, line: usize) -> Result<(), ErrorKind> {
        match &mut self.pending {
            Some(Pending::Segment {
                segment,
                extinf_seen,
                ..
            }) if !*extinf_seen => {
                segment.duration = next.duration;
                segment.title = next.title;
                *extinf_seen = true;
                Ok(())
            }
            Some(pending) => Err(ErrorKind::TruncatedPlaylist { tag: pending.tag() }),
            None => {
                self.pending = Some(Pending::Segment {
                    segment: next,
                    extinf_seen: true,
                    line,
                });
                Ok(())
            }
        }
    }

    fn attach_byte_range(&mut self, range: ByteRange, line: usize) {
        match &mut self.pending {
            Some(Pending::Segment { segment, .. }) => segment.byte_range = Some(range),
            // Only reachable in a master playlist, which the class check has already rejected.
            Some(Pending::Variant { .. }) => {}
            None => {
                self.pending = Some(Pending::Segment {
                    segment: MediaSegment {
                        uri: String::new(),
                        duration: 0.0,
                        title: None,
                        byte_range: Some(range),
                    },
                    extinf_seen: false,
                    line,
                })
            }
        }
    }

    fn fail(self, kind: ErrorKind, line: Option<usize>) -> DecodeError {
        debug!(?line, error = %kind, "decode failed");
        DecodeError::new(kind, line, self.playlist)
    }

    fn finish(mut self) -> Result<Playlist, DecodeError> {
        if self.phase == Phase::AwaitingHeader {
            return Err(self.fail(ErrorKind::MissingHeader, None));
        }
        if let Some(pending) = self.pending.take() {
            let line = pending.line();
            return Err(self.fail(ErrorKind::TruncatedPlaylist { tag: pending.tag() }, Some(line)));
        }
        Ok(self.playlist)
    }
}

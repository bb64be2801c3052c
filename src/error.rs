//! Error types returned by the decoder.
//!
//! [`ErrorKind`] describes what went wrong on a single line. [`DecodeError`]
//! wraps it together with the line number and the playlist decoded up to
//! that point, so a caller can still look at the partial result.

use std::fmt;
use std::io;

use thiserror::Error;

use crate::playlist::Playlist;

/// Everything that can stop a decode.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// The first non-blank line is not `#EXTM3U`.
    #[error("playlist does not start with #EXTM3U")]
    MissingHeader,

    /// An attribute list starts with a token that has no `=`.
    #[error("{tag}: malformed attribute {token:?}")]
    AttributeSyntax { tag: &'static str, token: String },

    /// A required attribute is absent.
    #[error("{tag}: missing required attribute {key}")]
    MissingField {
        tag: &'static str,
        key: &'static str,
    },

    /// A numeric value (number, float, byte range or resolution) failed to parse.
    #[error("{tag}: invalid number {value:?}{}", for_key(.key))]
    InvalidNumber {
        tag: &'static str,
        key: Option<&'static str>,
        value: String,
    },

    /// A boolean attribute is neither `YES` nor `NO`.
    #[error("{tag}: invalid boolean {value:?}{}", for_key(.key))]
    InvalidBoolean {
        tag: &'static str,
        key: Option<&'static str>,
        value: String,
    },

    /// A date-time value is not RFC 3339.
    #[error("{tag}: invalid date-time {value:?}{}", for_key(.key))]
    InvalidDateTime {
        tag: &'static str,
        key: Option<&'static str>,
        value: String,
    },

    /// A URI line appeared without a tag waiting for it.
    #[error("URI line {uri:?} does not follow a tag that expects one")]
    UnexpectedUri { uri: String },

    /// A tag that needs a URI line never got one.
    #[error("{tag} is not followed by a URI line")]
    TruncatedPlaylist { tag: &'static str },

    /// Master and media playlist tags in the same document.
    #[error("{tag} cannot appear in the same playlist as the tags before it (mixed master and media playlist)")]
    MixedPlaylistKind { tag: &'static str },

    #[error("playlist is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

fn for_key(key: &Option<&'static str>) -> String {
    match key {
        Some(key) => format!(" for {}", key),
        None => String::new(),
    }
}

impl ErrorKind {
    /// The tag the error was raised for, without the leading `#`.
    pub fn tag(&self) -> Option<&'static str> {
        match self {
            ErrorKind::AttributeSyntax { tag, .. }
            | ErrorKind::MissingField { tag, .. }
            | ErrorKind::InvalidNumber { tag, .. }
            | ErrorKind::InvalidBoolean { tag, .. }
            | ErrorKind::InvalidDateTime { tag, .. }
            | ErrorKind::TruncatedPlaylist { tag }
            | ErrorKind::MixedPlaylistKind { tag } => Some(tag),
            _ => None,
        }
    }

    /// The attribute key for field-level errors.
    pub fn key(&self) -> Option<&'static str> {
        match self {
            ErrorKind::MissingField { key, .. } => Some(key),
            ErrorKind::InvalidNumber { key, .. }
            | ErrorKind::InvalidBoolean { key, .. }
            | ErrorKind::InvalidDateTime { key, .. } => *key,
            _ => None,
        }
    }
}

/// A failed decode, carrying the playlist as far as it got.
pub struct DecodeError {
    kind: ErrorKind,
    line: Option<usize>,
    partial: Box<Playlist>,
}

impl DecodeError {
    pub(crate) fn new(kind: ErrorKind, line: Option<usize>, partial: Playlist) -> Self {
        DecodeError {
            kind,
            line,
            partial: Box::new(partial),
        }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// 1-based line number the decoder stopped at, when the error belongs to a line.
    pub fn line(&self) -> Option<usize> {
        self.line
    }

    pub fn tag(&self) -> Option<&'static str> {
        self.kind.tag()
    }

    pub fn key(&self) -> Option<&'static str> {
        self.kind.key()
    }

    /// The entries and header fields decoded before the error.
    pub fn partial(&self) -> &Playlist {
        &self.partial
    }

    pub fn into_partial(self) -> Playlist {
        *self.partial
    }

    pub fn into_kind(self) -> ErrorKind {
        self.kind
    }
}

impl fmt::Debug for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("DecodeError")
            .field("kind", &self.kind)
            .field("line", &self.line)
            .field("partial_entries", &self.partial.entries.len())
            .finish()
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {}: {}", line, self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

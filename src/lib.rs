//! A library to decode m3u8 playlists (HTTP Live Streaming) [link]
//! (https://tools.ietf.org/html/draft-pantos-http-live-streaming-19),
//! including the low-latency extensions.
//!
//! Decoding yields a single [`Playlist`] whose `entries` list every tag in
//! document order. Whether the document is a master or a media playlist is
//! worked out from the tags it contains (`Playlist::is_master`).
//!
//! # Examples
//!
//! Decoding a playlist from a string:
//!
//! ```
//! use m3u8_decoder::{decode, Entry};
//!
//! let text = "#EXTM3U
//! #EXT-X-TARGETDURATION:10
//! #EXTINF:9.009,
//! segment1.ts
//! #EXT-X-ENDLIST
//! ";
//!
//! let playlist = decode(text).unwrap();
//! assert!(!playlist.is_master);
//! assert!(!playlist.is_live);
//! match &playlist.entries[0] {
//!     Entry::MediaSegment(segment) => assert_eq!(segment.uri, "segment1.ts"),
//!     other => panic!("unexpected entry {:?}", other),
//! }
//! ```
//!
//! Decoding a file, looking at how far the decoder got when it fails:
//!
//! ```no_run
//! let file = std::fs::File::open("playlist.m3u8").unwrap();
//!
//! match m3u8_decoder::decode_reader(file) {
//!     Ok(playlist) => println!("{}", playlist),
//!     Err(err) => {
//!         eprintln!("{}", err);
//!         eprintln!("decoded before the error:\n{}", err.partial());
//!     }
//! }
//! ```
//!
//! Skipping malformed optional attributes instead of failing:
//!
//! ```
//! use m3u8_decoder::{decode_with, DecodeOptions};
//!
//! let text = "#EXTM3U\n#EXT-X-STREAM-INF:BANDWIDTH=1280000,FRAME-RATE=fast\nlow.m3u8\n";
//! let options = DecodeOptions::default().lenient_optional_fields(true);
//!
//! let playlist = decode_with(text, &options).unwrap();
//! assert_eq!(playlist.variant_streams().next().unwrap().frame_rate, None);
//! assert!(m3u8_decoder::decode(text).is_err());
//! ```

pub mod attributes;
pub mod decoder;
pub mod error;
mod parser;
pub mod playlist;
mod tags;

pub use decoder::{decode, decode_bytes, decode_reader, decode_with, DecodeOptions};
pub use error::{DecodeError, ErrorKind};
pub use playlist::{Entry, Playlist};

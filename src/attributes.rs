//! Attribute lists (`KEY=VALUE,KEY="VALUE",...`) and the typed values found in them.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, FixedOffset};
use nom::branch::alt;
use nom::bytes::complete::is_not;
use nom::character::complete::{char, digit0, digit1};
use nom::combinator::{all_consuming, map_res, opt, recognize};
use nom::multi::{many0_count, separated_list0};
use nom::sequence::{pair, preceded, separated_pair, tuple};
use nom::IResult;
use tracing::warn;

use crate::error::ErrorKind;
use crate::playlist::{ByteRange, Resolution};

#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum QuotedOrUnquoted {
    Unquoted(String),
    Quoted(String),
}

impl Default for QuotedOrUnquoted {
    fn default() -> Self {
        QuotedOrUnquoted::Quoted(String::new())
    }
}

impl QuotedOrUnquoted {
    pub fn as_str(&self) -> &str {
        match self {
            QuotedOrUnquoted::Quoted(s) => s.as_str(),
            QuotedOrUnquoted::Unquoted(s) => s.as_str(),
        }
    }

    pub fn as_unquoted(&self) -> Option<&str> {
        match self {
            QuotedOrUnquoted::Unquoted(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_quoted(&self) -> Option<&str> {
        match self {
            QuotedOrUnquoted::Quoted(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn into_string(self) -> String {
        match self {
            QuotedOrUnquoted::Quoted(s) | QuotedOrUnquoted::Unquoted(s) => s,
        }
    }
}

/// Strips exactly one leading and one trailing `"` when both are present.
impl From<&str> for QuotedOrUnquoted {
    fn from(s: &str) -> Self {
        if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
            return QuotedOrUnquoted::Quoted(s[1..s.len() - 1].to_string());
        }
        QuotedOrUnquoted::Unquoted(s.to_string())
    }
}

impl fmt::Display for QuotedOrUnquoted {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            QuotedOrUnquoted::Unquoted(s) => write!(f, "{}", s),
            QuotedOrUnquoted::Quoted(u) => write!(f, "\"{}\"", u),
        }
    }
}

// -----------------------------------------------------------------------------------------------
// Tokenizer
// -----------------------------------------------------------------------------------------------

/// Parse the attribute fragment following a tag's colon.
///
/// Commas inside quotes belong to the value. A token without `=` continues
/// the previous attribute's value, which recovers unquoted comma lists such
/// as `CODECS=avc1.42e00a,mp4a.40.2`. Only a malformed *first* token is an
/// error.
///
/// ```
/// use m3u8_decoder::attributes::parse_attribute_list;
///
/// let attrs = parse_attribute_list(
///     "EXT-X-STREAM-INF",
///     r#"BANDWIDTH=195023,CODECS="avc1.42e00a,mp4a.40.2""#,
/// ).unwrap();
/// assert_eq!(attrs.get("CODECS").map(|v| v.as_str()), Some("avc1.42e00a,mp4a.40.2"));
/// ```
pub fn parse_attribute_list(tag: &'static str, fragment: &str) -> Result<AttributeList, ErrorKind> {
    let tokens = match attribute_tokens(fragment) {
        Ok((_, tokens)) => tokens,
        // The token grammar accepts any input, this only guards the combinator contract.
        Err(_) => vec![fragment],
    };

    let mut raw: HashMap<String, String> = HashMap::new();
    let mut last: Option<String> = None;

    for token in tokens {
        let token = token.trim_start();
        if token.is_empty() {
            continue;
        }

        match token.split_once('=') {
            Some((name, value)) => {
                raw.insert(name.to_string(), value.to_string());
                last = Some(name.to_string());
            }
            None => match last.as_ref().and_then(|name| raw.get_mut(name)) {
                Some(value) => {
                    value.push(',');
                    value.push_str(token);
                }
                None => {
                    return Err(ErrorKind::AttributeSyntax {
                        tag,
                        token: token.to_string(),
                    })
                }
            },
        }
    }

    Ok(AttributeList {
        tag,
        attrs: raw
            .into_iter()
            .map(|(k, v)| (k, QuotedOrUnquoted::from(v.as_str())))
            .collect(),
        lenient: false,
    })
}

fn attribute_tokens(i: &str) -> IResult<&str, Vec<&str>> {
    all_consuming(separated_list0(char(','), attribute_token))(i)
}

fn attribute_token(i: &str) -> IResult<&str, &str> {
    recognize(many0_count(alt((quoted_run, is_not(",\"")))))(i)
}

// An unterminated quote runs to the end of the fragment.
fn quoted_run(i: &str) -> IResult<&str, &str> {
    recognize(tuple((char('"'), opt(is_not("\"")), opt(char('"')))))(i)
}

// -----------------------------------------------------------------------------------------------
// Typed extractors
// -----------------------------------------------------------------------------------------------

/// A decoded attribute list, bound to the tag it came from so that
/// extraction errors can name it.
///
/// Extractors remove the attribute they read; whatever is left over can be
/// taken with [`AttributeList::into_remaining`].
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeList {
    tag: &'static str,
    attrs: HashMap<String, QuotedOrUnquoted>,
    lenient: bool,
}

impl AttributeList {
    /// Drop malformed optional attributes instead of failing.
    pub fn lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }

    pub fn tag(&self) -> &'static str {
        self.tag
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&QuotedOrUnquoted> {
        self.attrs.get(key)
    }

    pub fn into_remaining(self) -> HashMap<String, QuotedOrUnquoted> {
        self.attrs
    }

    pub fn required_str(&mut self, key: &'static str) -> Result<String, ErrorKind> {
        self.take_required(key).map(QuotedOrUnquoted::into_string)
    }

    pub fn optional_str(&mut self, key: &'static str) -> Option<String> {
        self.attrs.remove(key).map(QuotedOrUnquoted::into_string)
    }

    pub fn required_f64(&mut self, key: &'static str) -> Result<f64, ErrorKind> {
        let value = self.take_required(key)?;
        float_value(self.tag, Some(key), value.as_str())
    }

    pub fn optional_f64(&mut self, key: &'static str) -> Result<Option<f64>, ErrorKind> {
        self.take_optional(key, float_value)
    }

    /// Like [`AttributeList::required_f64`] but accepting a leading `-`.
    pub fn required_signed_f64(&mut self, key: &'static str) -> Result<f64, ErrorKind> {
        let value = self.take_required(key)?;
        signed_float_value(self.tag, Some(key), value.as_str())
    }

    pub fn required_u64(&mut self, key: &'static str) -> Result<u64, ErrorKind> {
        let value = self.take_required(key)?;
        number_value(self.tag, Some(key), value.as_str())
    }

    pub fn optional_u64(&mut self, key: &'static str) -> Result<Option<u64>, ErrorKind> {
        self.take_optional(key, number_value)
    }

    pub fn optional_bool(&mut self, key: &'static str) -> Result<Option<bool>, ErrorKind> {
        self.take_optional(key, bool_value)
    }

    /// Optional `YES`/`NO` attribute whose absence means `default`.
    pub fn bool_or(&mut self, key: &'static str, default: bool) -> Result<bool, ErrorKind> {
        Ok(self.optional_bool(key)?.unwrap_or(default))
    }

    pub fn optional_byte_range(&mut self, key: &'static str) -> Result<Option<ByteRange>, ErrorKind> {
        self.take_optional(key, byte_range_value)
    }

    pub fn optional_resolution(&mut self, key: &'static str) -> Result<Option<Resolution>, ErrorKind> {
        self.take_optional(key, resolution_value)
    }

    pub fn required_date_time(
        &mut self,
        key: &'static str,
    ) -> Result<DateTime<FixedOffset>, ErrorKind> {
        let value = self.take_required(key)?;
        date_time_value(self.tag, Some(key), value.as_str())
    }

    pub fn optional_date_time(
        &mut self,
        key: &'static str,
    ) -> Result<Option<DateTime<FixedOffset>>, ErrorKind> {
        self.take_optional(key, date_time_value)
    }

    fn take_required(&mut self, key: &'static str) -> Result<QuotedOrUnquoted, ErrorKind> {
        self.attrs.remove(key).ok_or(ErrorKind::MissingField { tag: self.tag, key })
    }

    fn take_optional<T>(
        &mut self,
        key: &'static str,
        convert: fn(&'static str, Option<&'static str>, &str) -> Result<T, ErrorKind>,
    ) -> Result<Option<T>, ErrorKind> {
        let value = match self.attrs.remove(key) {
            Some(value) => value,
            None => return Ok(None),
        };

        match convert(self.tag, Some(key), value.as_str()) {
            Ok(v) => Ok(Some(v)),
            Err(err) if self.lenient => {
                warn!(tag = self.tag, key, error = %err, "dropping malformed optional attribute");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

// -----------------------------------------------------------------------------------------------
// Value grammars
// -----------------------------------------------------------------------------------------------

fn complete_value<'a, O>(
    parser: impl FnMut(&'a str) -> IResult<&'a str, O>,
    input: &'a str,
) -> Option<O> {
    all_consuming(parser)(input).ok().map(|(_, o)| o)
}

fn number(i: &str) -> IResult<&str, u64> {
    map_res(digit1, str::parse::<u64>)(i)
}

// `33` and `33.22`, a bare trailing dot is tolerated.
fn float(i: &str) -> IResult<&str, f64> {
    map_res(recognize(pair(digit1, opt(pair(char('.'), digit0)))), str::parse::<f64>)(i)
}

fn signed_float(i: &str) -> IResult<&str, f64> {
    map_res(
        recognize(pair(opt(char('-')), recognize(pair(digit1, opt(pair(char('.'), digit0)))))),
        str::parse::<f64>,
    )(i)
}

fn byte_range(i: &str) -> IResult<&str, ByteRange> {
    nom::combinator::map(pair(number, opt(preceded(char('@'), number))), |(length, offset)| {
        ByteRange { length, offset }
    })(i)
}

fn resolution(i: &str) -> IResult<&str, Resolution> {
    nom::combinator::map(
        separated_pair(number, alt((char('x'), char('X'))), number),
        |(width, height)| Resolution { width, height },
    )(i)
}

pub(crate) fn number_value(
    tag: &'static str,
    key: Option<&'static str>,
    value: &str,
) -> Result<u64, ErrorKind> {
    complete_value(number, value).ok_or_else(|| invalid_number(tag, key, value))
}

pub(crate) fn float_value(
    tag: &'static str,
    key: Option<&'static str>,
    value: &str,
) -> Result<f64, ErrorKind> {
    complete_value(float, value).ok_or_else(|| invalid_number(tag, key, value))
}

pub(crate) fn signed_float_value(
    tag: &'static str,
    key: Option<&'static str>,
    value: &str,
) -> Result<f64, ErrorKind> {
    complete_value(signed_float, value).ok_or_else(|| invalid_number(tag, key, value))
}

pub(crate) fn byte_range_value(
    tag: &'static str,
    key: Option<&'static str>,
    value: &str,
) -> Result<ByteRange, ErrorKind> {
    complete_value(byte_range, value).ok_or_else(|| invalid_number(tag, key, value))
}

pub(crate) fn resolution_value(
    tag: &'static str,
    key: Option<&'static str>,
    value: &str,
) -> Result<Resolution, ErrorKind> {
    complete_value(resolution, value).ok_or_else(|| invalid_number(tag, key, value))
}

pub(crate) fn bool_value(
    tag: &'static str,
    key: Option<&'static str>,
    value: &str,
) -> Result<bool, ErrorKind> {
    match value {
        "YES" => Ok(true),
        "NO" => Ok(false),
        _ => Err(ErrorKind::InvalidBoolean {
            tag,
            key,
            value: value.to_string(),
        }),
    }
}

pub(crate) fn date_time_value(
    tag: &'static str,
    key: Option<&'static str>,
    value: &str,
) -> Result<DateTime<FixedOffset>, ErrorKind> {
    DateTime::parse_from_rfc3339(value)
        // ISO 8601 also allows an offset without a colon (`+0800`).
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .map_err(|_| ErrorKind::InvalidDateTime {
            tag,
            key,
            value: value.to_string(),
        })
}

fn invalid_number(tag: &'static str, key: Option<&'static str>, value: &str) -> ErrorKind {
    ErrorKind::InvalidNumber {
        tag,
        key,
        value: value.to_string(),
    }
}

// -----------------------------------------------------------------------------------------------
// Enumerated attribute values
// -----------------------------------------------------------------------------------------------

// EXT-X-KEY
//
// METHOD
// The value is an enumerated-string that specifies the encryption
// method. The methods defined are: NONE, AES-128, and SAMPLE-AES.
#[allow(non_camel_case_types)]
#[derive(Debug, Default, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum KeyMethod {
    #[default]
    None,
    AES_128,
    SAMPLE_AES,
    Other(String),
}

impl From<&str> for KeyMethod {
    fn from(s: &str) -> Self {
        match s {
            "NONE" => KeyMethod::None,
            "AES-128" => KeyMethod::AES_128,
            "SAMPLE-AES" => KeyMethod::SAMPLE_AES,
            _ => KeyMethod::Other(s.to_string()),
        }
    }
}

impl fmt::Display for KeyMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            KeyMethod::None => write!(f, "NONE"),
            KeyMethod::AES_128 => write!(f, "AES-128"),
            KeyMethod::SAMPLE_AES => write!(f, "SAMPLE-AES"),
            KeyMethod::Other(s) => write!(f, "{}", s),
        }
    }
}

// EXT-X-STREAM-INF:
//
// HDCP-LEVEL
// The value is an enumerated-string; valid strings are TYPE-0, TYPE-
// 1, and NONE
#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum HdcpLevel {
    Type0,
    Type1,
    None,
    Other(String),
}

impl From<&str> for HdcpLevel {
    fn from(s: &str) -> Self {
        match s {
            "NONE" => HdcpLevel::None,
            "TYPE-0" => HdcpLevel::Type0,
            "TYPE-1" => HdcpLevel::Type1,
            _ => HdcpLevel::Other(s.to_string()),
        }
    }
}

impl fmt::Display for HdcpLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            HdcpLevel::None => write!(f, "NONE"),
            HdcpLevel::Type0 => write!(f, "TYPE-0"),
            HdcpLevel::Type1 => write!(f, "TYPE-1"),
            HdcpLevel::Other(s) => write!(f, "{}", s),
        }
    }
}

// EXT-X-STREAM-INF
//
// CLOSED-CAPTIONS
// The value can be either a quoted-string or an enumerated-string
// with the value NONE.
#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ClosedCaptions {
    None,
    GroupId(String),
    Other(String),
}

impl From<QuotedOrUnquoted> for ClosedCaptions {
    fn from(s: QuotedOrUnquoted) -> Self {
        match s {
            QuotedOrUnquoted::Unquoted(s) if s == "NONE" => ClosedCaptions::None,
            QuotedOrUnquoted::Quoted(gid) => ClosedCaptions::GroupId(gid),
            QuotedOrUnquoted::Unquoted(e) => ClosedCaptions::Other(e),
        }
    }
}

impl fmt::Display for ClosedCaptions {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ClosedCaptions::None => write!(f, "NONE"),
            ClosedCaptions::GroupId(gid) => write!(f, "{}", gid),
            ClosedCaptions::Other(e) => write!(f, "{}", e),
        }
    }
}

impl AttributeList {
    pub fn optional_closed_captions(&mut self, key: &'static str) -> Option<ClosedCaptions> {
        self.attrs.remove(key).map(ClosedCaptions::from)
    }
}

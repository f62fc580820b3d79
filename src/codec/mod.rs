//! Property codec boundary.
//!
//! Object dispatch never touches tag bytes directly: it converts between
//! [`ApplicationValue`] and wire bytes through a [`PropertyCodec`]. The
//! bundled [`TagCodec`] covers the application tags the output and load
//! control objects use.

mod tag;

pub use tag::TagCodec;

use serde::Serialize;

use crate::datetime::{BacnetDate, BacnetTime};
use crate::error::Result;
use crate::object::ObjectId;

/// Application tag numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppTag {
    Null = 0,
    Boolean = 1,
    Unsigned = 2,
    Signed = 3,
    Real = 4,
    CharacterString = 7,
    BitString = 8,
    Enumerated = 9,
    Date = 10,
    Time = 11,
    ObjectId = 12,
}

impl AppTag {
    pub fn from_number(number: u8) -> Option<Self> {
        Some(match number {
            0 => Self::Null,
            1 => Self::Boolean,
            2 => Self::Unsigned,
            3 => Self::Signed,
            4 => Self::Real,
            7 => Self::CharacterString,
            8 => Self::BitString,
            9 => Self::Enumerated,
            10 => Self::Date,
            11 => Self::Time,
            12 => Self::ObjectId,
            _ => return None,
        })
    }
}

/// A decoded primitive property value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "kebab-case")]
pub enum ApplicationValue {
    Null,
    Boolean(bool),
    Unsigned(u32),
    Signed(i32),
    Real(f32),
    CharacterString(String),
    BitString(Vec<bool>),
    Enumerated(u32),
    Date(BacnetDate),
    Time(BacnetTime),
    ObjectId(ObjectId),
}

impl ApplicationValue {
    pub fn tag(&self) -> AppTag {
        match self {
            Self::Null => AppTag::Null,
            Self::Boolean(_) => AppTag::Boolean,
            Self::Unsigned(_) => AppTag::Unsigned,
            Self::Signed(_) => AppTag::Signed,
            Self::Real(_) => AppTag::Real,
            Self::CharacterString(_) => AppTag::CharacterString,
            Self::BitString(_) => AppTag::BitString,
            Self::Enumerated(_) => AppTag::Enumerated,
            Self::Date(_) => AppTag::Date,
            Self::Time(_) => AppTag::Time,
            Self::ObjectId(_) => AppTag::ObjectId,
        }
    }
}

/// Converts between typed values and their tagged wire form.
///
/// Implementations must never write past the end of `buf` and report any
/// failure as `EncodingFailed`.
pub trait PropertyCodec {
    /// Encodes `value` with an application tag; returns bytes written.
    fn encode(&self, value: &ApplicationValue, buf: &mut [u8]) -> Result<usize>;

    /// Decodes one application-tagged value; returns it and bytes consumed.
    fn decode(&self, buf: &[u8]) -> Result<(ApplicationValue, usize)>;

    /// Encodes `value` under context tag `tag_number`.
    fn encode_context(&self, tag_number: u8, value: &ApplicationValue, buf: &mut [u8])
    -> Result<usize>;

    /// Decodes a value of type `kind` under context tag `tag_number`.
    ///
    /// Returns `Ok(None)` when the next tag is a different context tag.
    fn decode_context(
        &self,
        tag_number: u8,
        kind: AppTag,
        buf: &[u8],
    ) -> Result<Option<(ApplicationValue, usize)>>;
}

/// Encodes each value in turn into `buf`; returns total bytes written.
pub fn encode_all(
    codec: &dyn PropertyCodec,
    values: &[ApplicationValue],
    buf: &mut [u8],
) -> Result<usize> {
    let mut len = 0;
    for value in values {
        len += codec.encode(value, &mut buf[len..])?;
    }
    Ok(len)
}

/// Decodes application values until `buf` is exhausted.
pub fn decode_all(codec: &dyn PropertyCodec, buf: &[u8]) -> Result<Vec<ApplicationValue>> {
    let mut values = Vec::new();
    let mut offset = 0;
    while offset < buf.len() {
        let (value, used) = codec.decode(&buf[offset..])?;
        values.push(value);
        offset += used;
    }
    Ok(values)
}

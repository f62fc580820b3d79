use crate::datetime::{BacnetDate, BacnetTime};
use crate::error::{ObjectError, Result};
use crate::object::{ObjectId, ObjectType};

use super::{AppTag, ApplicationValue, PropertyCodec};

const CONTEXT_BIT: u8 = 0x08;
const EXTENDED_LENGTH: u8 = 5;
const OPENING_TAG: u8 = 6;
const CLOSING_TAG: u8 = 7;
const WILDCARD: u8 = 0xFF;

/// Application/context tag codec for the primitive types the objects use.
#[derive(Debug, Clone, Copy, Default)]
pub struct TagCodec;

#[derive(Debug)]
struct Header {
    tag_number: u8,
    context: bool,
    lvt: u8,
    header_len: usize,
    content_len: usize,
}

fn failed(message: impl Into<String>) -> ObjectError {
    ObjectError::EncodingFailed(message.into())
}

fn write_header(out: &mut Vec<u8>, tag_number: u8, context: bool, len: usize) -> Result<()> {
    let class = if context { CONTEXT_BIT } else { 0 };
    let (first, extra) = if tag_number >= 15 {
        (0xF0, Some(tag_number))
    } else {
        (tag_number << 4, None)
    };
    if len < EXTENDED_LENGTH as usize {
        out.push(first | class | len as u8);
        out.extend(extra);
        return Ok(());
    }
    out.push(first | class | EXTENDED_LENGTH);
    out.extend(extra);
    if len <= 253 {
        out.push(len as u8);
    } else if let Ok(short) = u16::try_from(len) {
        out.push(254);
        out.extend_from_slice(&short.to_be_bytes());
    } else {
        let long = u32::try_from(len).map_err(|_| failed("content too long"))?;
        out.push(255);
        out.extend_from_slice(&long.to_be_bytes());
    }
    Ok(())
}

fn read_header(buf: &[u8]) -> Result<Header> {
    let first = *buf.first().ok_or_else(|| failed("empty buffer"))?;
    let mut offset = 1;
    let mut tag_number = first >> 4;
    if tag_number == 15 {
        tag_number = *buf.get(offset).ok_or_else(|| failed("truncated tag number"))?;
        offset += 1;
    }
    let context = first & CONTEXT_BIT != 0;
    let lvt = first & 0x07;

    let content_len = if !context && tag_number == AppTag::Boolean as u8 {
        0
    } else if context && (lvt == OPENING_TAG || lvt == CLOSING_TAG) {
        return Err(failed("unexpected constructed tag"));
    } else if lvt == EXTENDED_LENGTH {
        let marker = *buf.get(offset).ok_or_else(|| failed("truncated length"))?;
        offset += 1;
        match marker {
            254 => {
                let bytes = buf
                    .get(offset..offset + 2)
                    .ok_or_else(|| failed("truncated length"))?;
                offset += 2;
                usize::from(u16::from_be_bytes([bytes[0], bytes[1]]))
            }
            255 => {
                let bytes = buf
                    .get(offset..offset + 4)
                    .ok_or_else(|| failed("truncated length"))?;
                offset += 4;
                u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize
            }
            n => usize::from(n),
        }
    } else {
        usize::from(lvt)
    };

    if buf.len() < offset + content_len {
        return Err(failed(format!(
            "need {} content bytes, have {}",
            content_len,
            buf.len() - offset
        )));
    }
    Ok(Header {
        tag_number,
        context,
        lvt,
        header_len: offset,
        content_len,
    })
}

fn unsigned_bytes(value: u32) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let skip = bytes.iter().take(3).take_while(|b| **b == 0).count();
    bytes[skip..].to_vec()
}

fn signed_bytes(value: i32) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let mut start = 0;
    while start < 3 {
        let redundant = (bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0)
            || (bytes[start] == 0xFF && bytes[start + 1] & 0x80 != 0);
        if !redundant {
            break;
        }
        start += 1;
    }
    bytes[start..].to_vec()
}

fn content_bytes(value: &ApplicationValue) -> Vec<u8> {
    match value {
        ApplicationValue::Null => Vec::new(),
        ApplicationValue::Boolean(b) => vec![u8::from(*b)],
        ApplicationValue::Unsigned(v) | ApplicationValue::Enumerated(v) => unsigned_bytes(*v),
        ApplicationValue::Signed(v) => signed_bytes(*v),
        ApplicationValue::Real(v) => v.to_be_bytes().to_vec(),
        ApplicationValue::CharacterString(s) => {
            let mut out = Vec::with_capacity(s.len() + 1);
            out.push(0); // UTF-8
            out.extend_from_slice(s.as_bytes());
            out
        }
        ApplicationValue::BitString(bits) => {
            let unused = (8 - bits.len() % 8) % 8;
            let mut out = vec![unused as u8];
            for chunk in bits.chunks(8) {
                let byte = chunk
                    .iter()
                    .enumerate()
                    .fold(0u8, |acc, (i, bit)| if *bit { acc | (0x80 >> i) } else { acc });
                out.push(byte);
            }
            out
        }
        ApplicationValue::Date(date) => vec![
            date.year
                .map_or(WILDCARD, |y| y.saturating_sub(1900).min(254) as u8),
            date.month.unwrap_or(WILDCARD),
            date.day.unwrap_or(WILDCARD),
            date.weekday.unwrap_or(WILDCARD),
        ],
        ApplicationValue::Time(time) => vec![
            time.hour.unwrap_or(WILDCARD),
            time.minute.unwrap_or(WILDCARD),
            time.second.unwrap_or(WILDCARD),
            time.hundredths.unwrap_or(WILDCARD),
        ],
        ApplicationValue::ObjectId(id) => {
            let raw = (u32::from(id.object_type.to_u16() & 0x3FF) << 22) | (id.instance & 0x3F_FFFF);
            raw.to_be_bytes().to_vec()
        }
    }
}

fn field(byte: u8) -> Option<u8> {
    (byte != WILDCARD).then_some(byte)
}

fn decode_content(kind: AppTag, content: &[u8]) -> Result<ApplicationValue> {
    let exact = |n: usize| {
        if content.len() == n {
            Ok(())
        } else {
            Err(failed(format!(
                "{kind:?} needs {n} content bytes, got {}",
                content.len()
            )))
        }
    };
    let unsigned = || {
        if content.is_empty() || content.len() > 4 {
            return Err(failed(format!("bad {kind:?} length {}", content.len())));
        }
        Ok(content.iter().fold(0u32, |acc, b| (acc << 8) | u32::from(*b)))
    };

    Ok(match kind {
        AppTag::Null => {
            exact(0)?;
            ApplicationValue::Null
        }
        AppTag::Boolean => {
            exact(1)?;
            ApplicationValue::Boolean(content[0] != 0)
        }
        AppTag::Unsigned => ApplicationValue::Unsigned(unsigned()?),
        AppTag::Enumerated => ApplicationValue::Enumerated(unsigned()?),
        AppTag::Signed => {
            let raw = unsigned()?;
            let shift = 32 - 8 * content.len() as u32;
            ApplicationValue::Signed(((raw << shift) as i32) >> shift)
        }
        AppTag::Real => {
            exact(4)?;
            ApplicationValue::Real(f32::from_be_bytes([
                content[0], content[1], content[2], content[3],
            ]))
        }
        AppTag::CharacterString => {
            let (charset, text) = content
                .split_first()
                .ok_or_else(|| failed("missing character set"))?;
            if *charset != 0 {
                return Err(failed(format!("unsupported character set {charset}")));
            }
            let text = std::str::from_utf8(text).map_err(|e| failed(e.to_string()))?;
            ApplicationValue::CharacterString(text.to_string())
        }
        AppTag::BitString => {
            let (unused, bytes) = content
                .split_first()
                .ok_or_else(|| failed("missing unused-bits octet"))?;
            if *unused > 7 || (bytes.is_empty() && *unused != 0) {
                return Err(failed(format!("bad unused-bits count {unused}")));
            }
            let total = bytes.len() * 8 - usize::from(*unused);
            let bits = (0..total)
                .map(|i| bytes[i / 8] & (0x80 >> (i % 8)) != 0)
                .collect();
            ApplicationValue::BitString(bits)
        }
        AppTag::Date => {
            exact(4)?;
            ApplicationValue::Date(BacnetDate {
                year: field(content[0]).map(|y| 1900 + u16::from(y)),
                month: field(content[1]),
                day: field(content[2]),
                weekday: field(content[3]),
            })
        }
        AppTag::Time => {
            exact(4)?;
            ApplicationValue::Time(BacnetTime {
                hour: field(content[0]),
                minute: field(content[1]),
                second: field(content[2]),
                hundredths: field(content[3]),
            })
        }
        AppTag::ObjectId => {
            exact(4)?;
            let raw = u32::from_be_bytes([content[0], content[1], content[2], content[3]]);
            ApplicationValue::ObjectId(ObjectId::new(
                ObjectType::from_u16((raw >> 22) as u16),
                raw & 0x3F_FFFF,
            ))
        }
    })
}

fn copy_into(encoded: &[u8], buf: &mut [u8]) -> Result<usize> {
    let have = buf.len();
    let target = buf.get_mut(..encoded.len()).ok_or_else(|| {
        failed(format!(
            "buffer holds {have} bytes, need {}",
            encoded.len()
        ))
    })?;
    target.copy_from_slice(encoded);
    Ok(encoded.len())
}

impl PropertyCodec for TagCodec {
    fn encode(&self, value: &ApplicationValue, buf: &mut [u8]) -> Result<usize> {
        let mut out = Vec::new();
        match value {
            ApplicationValue::Boolean(b) => out.push(((AppTag::Boolean as u8) << 4) | u8::from(*b)),
            other => {
                let content = content_bytes(other);
                write_header(&mut out, other.tag() as u8, false, content.len())?;
                out.extend(content);
            }
        }
        copy_into(&out, buf)
    }

    fn decode(&self, buf: &[u8]) -> Result<(ApplicationValue, usize)> {
        let header = read_header(buf)?;
        if header.context {
            return Err(failed(format!(
                "expected application tag, found context tag {}",
                header.tag_number
            )));
        }
        let kind = AppTag::from_number(header.tag_number)
            .ok_or_else(|| failed(format!("unsupported application tag {}", header.tag_number)))?;
        if kind == AppTag::Boolean {
            if header.lvt > 1 {
                return Err(failed(format!("bad boolean value {}", header.lvt)));
            }
            return Ok((ApplicationValue::Boolean(header.lvt == 1), header.header_len));
        }
        let end = header.header_len + header.content_len;
        let value = decode_content(kind, &buf[header.header_len..end])?;
        Ok((value, end))
    }

    fn encode_context(
        &self,
        tag_number: u8,
        value: &ApplicationValue,
        buf: &mut [u8],
    ) -> Result<usize> {
        let content = content_bytes(value);
        let mut out = Vec::with_capacity(content.len() + 2);
        write_header(&mut out, tag_number, true, content.len())?;
        out.extend(content);
        copy_into(&out, buf)
    }

    fn decode_context(
        &self,
        tag_number: u8,
        kind: AppTag,
        buf: &[u8],
    ) -> Result<Option<(ApplicationValue, usize)>> {
        let header = read_header(buf)?;
        if !header.context || header.tag_number != tag_number {
            return Ok(None);
        }
        let end = header.header_len + header.content_len;
        let value = decode_content(kind, &buf[header.header_len..end])?;
        Ok(Some((value, end)))
    }
}

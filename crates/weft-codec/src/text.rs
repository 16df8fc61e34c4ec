//! Length-prefixed text codecs.
//!
//! All four wire formats share the same shape, `varint(count) ++ payload`,
//! but differ in what the count means and how characters are laid out:
//!
//! | Wire format | Count            | Payload                          |
//! |-------------|------------------|----------------------------------|
//! | ISO-8859-1  | character count  | one byte per character           |
//! | UTF-8       | byte count       | standard UTF-8                   |
//! | UTF-16      | code-unit count  | 2 bytes per unit, BE or LE       |
//! | UTF8_MB3    | byte count       | 1-3 bytes per UTF-16 code unit   |
//!
//! UTF8_MB3 is the legacy format: each UTF-16 code unit of the string is
//! encoded independently, so supplementary characters appear as two 3-byte
//! surrogate encodings and no sequence is ever longer than three bytes.
//! Decoding validates surrogate pairing when the units are reassembled.

use weft_error::{Result, WeftError};

use crate::format::{resolve, CompatLevel, StringFormat, WireTextFormat};
use crate::nullable::NullableCodec;
use crate::scope::CallScope;
use crate::varint::{read_varint, write_varint};
use crate::Codec;

/// Codec for strings in one of the four wire text formats.
///
/// The requested format and compatibility level are resolved to a concrete
/// routine once, at construction; encode and decode therefore can never
/// disagree about the substitution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextCodec {
    wire: WireTextFormat,
}

impl TextCodec {
    /// Create a text codec for the given format at the given level.
    pub const fn new(format: StringFormat, level: CompatLevel) -> Self {
        Self {
            wire: resolve(format, level),
        }
    }

    /// The resolved wire routine this codec runs.
    pub const fn wire_format(&self) -> WireTextFormat {
        self.wire
    }

    /// The count that goes into the length channel for `value`.
    fn prefix_count(&self, value: &str, pos: usize) -> Result<u32> {
        let count = match self.wire {
            WireTextFormat::Iso8859_1 => {
                let mut n: usize = 0;
                for ch in value.chars() {
                    if ch as u32 > 0xFF {
                        return Err(WeftError::UnencodableChar { ch, pos });
                    }
                    n += 1;
                }
                n
            }
            WireTextFormat::Utf8 => value.len(),
            WireTextFormat::Utf16Be | WireTextFormat::Utf16Le => value.encode_utf16().count(),
            WireTextFormat::Utf8Mb3 => value.encode_utf16().map(mb3_unit_len).sum(),
        };
        u32::try_from(count).map_err(|_| WeftError::PayloadTooLarge { len: count, pos })
    }

    /// Write the payload (everything after the length channel).
    fn write_payload(&self, buf: &mut [u8], mut pos: usize, value: &str) -> Result<usize> {
        match self.wire {
            WireTextFormat::Iso8859_1 => {
                for ch in value.chars() {
                    // prefix_count already rejected anything above U+00FF.
                    #[allow(clippy::cast_possible_truncation)]
                    let byte = ch as u32 as u8;
                    pos = crate::fixed::write_u8(buf, pos, byte)?;
                }
                Ok(pos)
            }
            WireTextFormat::Utf8 => {
                let bytes = value.as_bytes();
                if pos + bytes.len() > buf.len() {
                    return Err(WeftError::buffer_full(pos, bytes.len(), buf.len()));
                }
                buf[pos..pos + bytes.len()].copy_from_slice(bytes);
                Ok(pos + bytes.len())
            }
            WireTextFormat::Utf16Be => {
                for unit in value.encode_utf16() {
                    if pos + 2 > buf.len() {
                        return Err(WeftError::buffer_full(pos, 2, buf.len()));
                    }
                    buf[pos..pos + 2].copy_from_slice(&unit.to_be_bytes());
                    pos += 2;
                }
                Ok(pos)
            }
            WireTextFormat::Utf16Le => {
                for unit in value.encode_utf16() {
                    if pos + 2 > buf.len() {
                        return Err(WeftError::buffer_full(pos, 2, buf.len()));
                    }
                    buf[pos..pos + 2].copy_from_slice(&unit.to_le_bytes());
                    pos += 2;
                }
                Ok(pos)
            }
            WireTextFormat::Utf8Mb3 => {
                for unit in value.encode_utf16() {
                    pos = write_mb3_unit(buf, pos, unit)?;
                }
                Ok(pos)
            }
        }
    }

    /// Read the payload given the decoded count.
    fn read_payload(&self, buf: &[u8], pos: usize, count: u32) -> Result<(String, usize)> {
        let count = count as usize;
        match self.wire {
            WireTextFormat::Iso8859_1 => {
                if pos + count > buf.len() {
                    return Err(WeftError::unexpected_eof(pos, count, buf.len()));
                }
                let text = buf[pos..pos + count].iter().map(|&b| char::from(b)).collect();
                Ok((text, pos + count))
            }
            WireTextFormat::Utf8 => {
                if pos + count > buf.len() {
                    return Err(WeftError::unexpected_eof(pos, count, buf.len()));
                }
                let text = std::str::from_utf8(&buf[pos..pos + count])
                    .map_err(|_| WeftError::InvalidUtf8 { pos })?;
                Ok((text.to_owned(), pos + count))
            }
            WireTextFormat::Utf16Be | WireTextFormat::Utf16Le => {
                let byte_len = count
                    .checked_mul(2)
                    .ok_or(WeftError::unexpected_eof(pos, usize::MAX, buf.len()))?;
                if pos + byte_len > buf.len() {
                    return Err(WeftError::unexpected_eof(pos, byte_len, buf.len()));
                }
                let mut units = Vec::with_capacity(count);
                for i in 0..count {
                    let off = pos + i * 2;
                    let unit = if self.wire == WireTextFormat::Utf16Be {
                        u16::from_be_bytes([buf[off], buf[off + 1]])
                    } else {
                        u16::from_le_bytes([buf[off], buf[off + 1]])
                    };
                    units.push(unit);
                }
                let text =
                    String::from_utf16(&units).map_err(|_| WeftError::InvalidUtf16 { pos })?;
                Ok((text, pos + byte_len))
            }
            WireTextFormat::Utf8Mb3 => {
                if pos + count > buf.len() {
                    return Err(WeftError::unexpected_eof(pos, count, buf.len()));
                }
                let units = read_mb3_units(buf, pos, count)?;
                let text =
                    String::from_utf16(&units).map_err(|_| WeftError::InvalidUtf16 { pos })?;
                Ok((text, pos + count))
            }
        }
    }
}

impl Codec for TextCodec {
    type Input = str;
    type Output = String;

    fn encode(
        &self,
        buf: &mut [u8],
        pos: usize,
        value: &str,
        _scope: &mut CallScope,
    ) -> Result<usize> {
        let count = self.prefix_count(value, pos)?;
        let pos = write_varint(buf, pos, count)?;
        self.write_payload(buf, pos, value)
    }

    fn decode(&self, buf: &[u8], pos: usize, _scope: &mut CallScope) -> Result<(String, usize)> {
        let (count, pos) = read_varint(buf, pos)?;
        self.read_payload(buf, pos, count)
    }
}

impl NullableCodec for TextCodec {
    fn encode_opt(
        &self,
        buf: &mut [u8],
        pos: usize,
        value: Option<&str>,
        _scope: &mut CallScope,
    ) -> Result<usize> {
        match value {
            None => write_varint(buf, pos, 0),
            Some(text) => {
                // Real counts shift up by one; zero is the null sentinel.
                let count = self.prefix_count(text, pos)?;
                let shifted = count
                    .checked_add(1)
                    .ok_or(WeftError::PayloadTooLarge {
                        len: count as usize,
                        pos,
                    })?;
                let pos = write_varint(buf, pos, shifted)?;
                self.write_payload(buf, pos, text)
            }
        }
    }

    fn decode_opt(
        &self,
        buf: &[u8],
        pos: usize,
        _scope: &mut CallScope,
    ) -> Result<(Option<String>, usize)> {
        let (raw, pos) = read_varint(buf, pos)?;
        match raw {
            0 => Ok((None, pos)),
            shifted => {
                let (text, pos) = self.read_payload(buf, pos, shifted - 1)?;
                Ok((Some(text), pos))
            }
        }
    }
}

/// Encoded size of one UTF-16 code unit in the MB3 format.
const fn mb3_unit_len(unit: u16) -> usize {
    if unit < 0x80 {
        1
    } else if unit < 0x800 {
        2
    } else {
        3
    }
}

/// Write one UTF-16 code unit as a 1-3 byte UTF-8-style sequence.
#[allow(clippy::cast_possible_truncation)]
fn write_mb3_unit(buf: &mut [u8], pos: usize, unit: u16) -> Result<usize> {
    let len = mb3_unit_len(unit);
    if pos + len > buf.len() {
        return Err(WeftError::buffer_full(pos, len, buf.len()));
    }
    let u = u32::from(unit);
    match len {
        1 => buf[pos] = u as u8,
        2 => {
            buf[pos] = 0xC0 | (u >> 6) as u8;
            buf[pos + 1] = 0x80 | (u & 0x3F) as u8;
        }
        _ => {
            buf[pos] = 0xE0 | (u >> 12) as u8;
            buf[pos + 1] = 0x80 | ((u >> 6) & 0x3F) as u8;
            buf[pos + 2] = 0x80 | (u & 0x3F) as u8;
        }
    }
    Ok(pos + len)
}

/// Parse `len` bytes of MB3 payload back into UTF-16 code units.
///
/// The caller has already checked the region is inside the buffer; any
/// sequence that crosses the region end or is not 1-3 byte shaped is a
/// corrupt stream.
fn read_mb3_units(buf: &[u8], pos: usize, len: usize) -> Result<Vec<u16>> {
    let end = pos + len;
    let mut units = Vec::new();
    let mut i = pos;
    while i < end {
        let b0 = buf[i];
        let (unit, adv) = match b0 {
            0x00..=0x7F => (u16::from(b0), 1),
            0xC0..=0xDF => {
                if i + 2 > end || buf[i + 1] & 0xC0 != 0x80 {
                    return Err(WeftError::InvalidUtf8 { pos: i });
                }
                let unit = (u16::from(b0 & 0x1F) << 6) | u16::from(buf[i + 1] & 0x3F);
                (unit, 2)
            }
            0xE0..=0xEF => {
                if i + 3 > end || buf[i + 1] & 0xC0 != 0x80 || buf[i + 2] & 0xC0 != 0x80 {
                    return Err(WeftError::InvalidUtf8 { pos: i });
                }
                let unit = (u16::from(b0 & 0x0F) << 12)
                    | (u16::from(buf[i + 1] & 0x3F) << 6)
                    | u16::from(buf[i + 2] & 0x3F);
                (unit, 3)
            }
            _ => return Err(WeftError::InvalidUtf8 { pos: i }),
        };
        units.push(unit);
        i += adv;
    }
    Ok(units)
}

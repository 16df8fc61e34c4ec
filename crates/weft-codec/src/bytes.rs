//! Length-prefixed byte slices with zero-copy decode.
//!
//! The wire layout is `varint(len) ++ len raw bytes`. Decoding does not
//! copy the payload: it returns a [`ByteSpan`] describing where the bytes
//! sit inside the input buffer, after validating that the span is fully in
//! bounds. The caller resolves the span against the same buffer when it
//! actually needs the bytes.

use weft_error::{Result, WeftError};

use crate::nullable::NullableCodec;
use crate::scope::CallScope;
use crate::varint::{read_varint, write_varint};
use crate::Codec;

/// A validated window into a decode buffer.
///
/// Holds no data of its own. The span is only meaningful against the
/// buffer it was decoded from; if that buffer is mutated, resolving the
/// span reflects the new contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ByteSpan {
    offset: usize,
    len: usize,
}

impl ByteSpan {
    /// Offset of the first payload byte in the decode buffer.
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Payload length in bytes.
    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Resolve the span against `buf`.
    ///
    /// `buf` must be the buffer this span was decoded from (or one at
    /// least as long); a shorter buffer yields an error rather than a
    /// panic.
    pub fn bytes<'b>(&self, buf: &'b [u8]) -> Result<&'b [u8]> {
        let end = self
            .offset
            .checked_add(self.len)
            .filter(|&end| end <= buf.len())
            .ok_or(WeftError::unexpected_eof(self.offset, self.len, buf.len()))?;
        Ok(&buf[self.offset..end])
    }
}

/// Codec for length-prefixed raw byte slices.
///
/// Encodes from `&[u8]`, decodes to a [`ByteSpan`] over the input buffer.
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesCodec;

impl BytesCodec {
    fn write_payload(buf: &mut [u8], pos: usize, value: &[u8]) -> Result<usize> {
        if pos + value.len() > buf.len() {
            return Err(WeftError::buffer_full(pos, value.len(), buf.len()));
        }
        buf[pos..pos + value.len()].copy_from_slice(value);
        Ok(pos + value.len())
    }

    fn read_payload(buf: &[u8], pos: usize, len: usize) -> Result<(ByteSpan, usize)> {
        let end = pos
            .checked_add(len)
            .filter(|&end| end <= buf.len())
            .ok_or(WeftError::unexpected_eof(pos, len, buf.len()))?;
        Ok((ByteSpan { offset: pos, len }, end))
    }

    fn prefix_len(value: &[u8], pos: usize) -> Result<u32> {
        u32::try_from(value.len()).map_err(|_| WeftError::PayloadTooLarge {
            len: value.len(),
            pos,
        })
    }
}

impl Codec for BytesCodec {
    type Input = [u8];
    type Output = ByteSpan;

    fn encode(
        &self,
        buf: &mut [u8],
        pos: usize,
        value: &[u8],
        _scope: &mut CallScope,
    ) -> Result<usize> {
        let len = Self::prefix_len(value, pos)?;
        let pos = write_varint(buf, pos, len)?;
        Self::write_payload(buf, pos, value)
    }

    fn decode(&self, buf: &[u8], pos: usize, _scope: &mut CallScope) -> Result<(ByteSpan, usize)> {
        let (len, pos) = read_varint(buf, pos)?;
        Self::read_payload(buf, pos, len as usize)
    }
}

impl NullableCodec for BytesCodec {
    fn encode_opt(
        &self,
        buf: &mut [u8],
        pos: usize,
        value: Option<&[u8]>,
        _scope: &mut CallScope,
    ) -> Result<usize> {
        match value {
            None => write_varint(buf, pos, 0),
            Some(bytes) => {
                let len = Self::prefix_len(bytes, pos)?;
                let shifted = len.checked_add(1).ok_or(WeftError::PayloadTooLarge {
                    len: bytes.len(),
                    pos,
                })?;
                let pos = write_varint(buf, pos, shifted)?;
                Self::write_payload(buf, pos, bytes)
            }
        }
    }

    fn decode_opt(
        &self,
        buf: &[u8],
        pos: usize,
        _scope: &mut CallScope,
    ) -> Result<(Option<ByteSpan>, usize)> {
        let (raw, pos) = read_varint(buf, pos)?;
        match raw {
            0 => Ok((None, pos)),
            _ => {
                let (span, pos) = Self::read_payload(buf, pos, (raw - 1) as usize)?;
                Ok((Some(span), pos))
            }
        }
    }
}

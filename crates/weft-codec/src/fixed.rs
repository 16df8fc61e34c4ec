//! Fixed-width little-endian primitive codecs.
//!
//! Free functions do the bounds-checked reads and writes; the unit structs
//! (`FixedU32`, `FixedI64`, ...) wrap them in the [`Codec`] contract so
//! fixed-width leaves compose with the nullable and tracking wrappers.

use weft_error::{Result, WeftError};

use crate::scope::CallScope;
use crate::Codec;

fn check_write(buf: &[u8], pos: usize, needed: usize) -> Result<()> {
    if pos + needed > buf.len() {
        return Err(WeftError::buffer_full(pos, needed, buf.len()));
    }
    Ok(())
}

fn check_read(buf: &[u8], pos: usize, needed: usize) -> Result<()> {
    if pos + needed > buf.len() {
        return Err(WeftError::unexpected_eof(pos, needed, buf.len()));
    }
    Ok(())
}

/// Write a single byte at `pos`, returning the new cursor.
pub fn write_u8(buf: &mut [u8], pos: usize, value: u8) -> Result<usize> {
    check_write(buf, pos, 1)?;
    buf[pos] = value;
    Ok(pos + 1)
}

/// Read a single byte at `pos`, returning `(value, new_pos)`.
pub fn read_u8(buf: &[u8], pos: usize) -> Result<(u8, usize)> {
    check_read(buf, pos, 1)?;
    Ok((buf[pos], pos + 1))
}

/// Write a `u16` as two little-endian bytes.
pub fn write_u16(buf: &mut [u8], pos: usize, value: u16) -> Result<usize> {
    check_write(buf, pos, 2)?;
    buf[pos..pos + 2].copy_from_slice(&value.to_le_bytes());
    Ok(pos + 2)
}

/// Read a little-endian `u16`.
pub fn read_u16(buf: &[u8], pos: usize) -> Result<(u16, usize)> {
    check_read(buf, pos, 2)?;
    let value = u16::from_le_bytes([buf[pos], buf[pos + 1]]);
    Ok((value, pos + 2))
}

/// Write a `u32` as four little-endian bytes.
pub fn write_u32(buf: &mut [u8], pos: usize, value: u32) -> Result<usize> {
    check_write(buf, pos, 4)?;
    buf[pos..pos + 4].copy_from_slice(&value.to_le_bytes());
    Ok(pos + 4)
}

/// Read a little-endian `u32`.
pub fn read_u32(buf: &[u8], pos: usize) -> Result<(u32, usize)> {
    check_read(buf, pos, 4)?;
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&buf[pos..pos + 4]);
    Ok((u32::from_le_bytes(bytes), pos + 4))
}

/// Write a `u64` as eight little-endian bytes.
pub fn write_u64(buf: &mut [u8], pos: usize, value: u64) -> Result<usize> {
    check_write(buf, pos, 8)?;
    buf[pos..pos + 8].copy_from_slice(&value.to_le_bytes());
    Ok(pos + 8)
}

/// Read a little-endian `u64`.
pub fn read_u64(buf: &[u8], pos: usize) -> Result<(u64, usize)> {
    check_read(buf, pos, 8)?;
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[pos..pos + 8]);
    Ok((u64::from_le_bytes(bytes), pos + 8))
}

/// Write an `i64` as eight little-endian bytes (two's complement).
pub fn write_i64(buf: &mut [u8], pos: usize, value: i64) -> Result<usize> {
    check_write(buf, pos, 8)?;
    buf[pos..pos + 8].copy_from_slice(&value.to_le_bytes());
    Ok(pos + 8)
}

/// Read a little-endian `i64`.
pub fn read_i64(buf: &[u8], pos: usize) -> Result<(i64, usize)> {
    check_read(buf, pos, 8)?;
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[pos..pos + 8]);
    Ok((i64::from_le_bytes(bytes), pos + 8))
}

/// Write an `f64` as its IEEE 754 bit pattern, little-endian.
pub fn write_f64(buf: &mut [u8], pos: usize, value: f64) -> Result<usize> {
    write_u64(buf, pos, value.to_bits())
}

/// Read a little-endian IEEE 754 `f64`.
pub fn read_f64(buf: &[u8], pos: usize) -> Result<(f64, usize)> {
    let (bits, pos) = read_u64(buf, pos)?;
    Ok((f64::from_bits(bits), pos))
}

/// Write a boolean as a single 0/1 byte.
pub fn write_bool(buf: &mut [u8], pos: usize, value: bool) -> Result<usize> {
    write_u8(buf, pos, u8::from(value))
}

/// Read a boolean byte. Any value other than 0 or 1 is a corrupt stream.
pub fn read_bool(buf: &[u8], pos: usize) -> Result<(bool, usize)> {
    let (raw, new_pos) = read_u8(buf, pos)?;
    match raw {
        0 => Ok((false, new_pos)),
        1 => Ok((true, new_pos)),
        _ => Err(WeftError::InvalidBool { raw, pos }),
    }
}

/// Codec for a four-byte little-endian `u32`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedU32;

impl Codec for FixedU32 {
    type Input = u32;
    type Output = u32;

    fn encode(
        &self,
        buf: &mut [u8],
        pos: usize,
        value: &u32,
        _scope: &mut CallScope,
    ) -> Result<usize> {
        write_u32(buf, pos, *value)
    }

    fn decode(&self, buf: &[u8], pos: usize, _scope: &mut CallScope) -> Result<(u32, usize)> {
        read_u32(buf, pos)
    }
}

/// Codec for an eight-byte little-endian `u64`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedU64;

impl Codec for FixedU64 {
    type Input = u64;
    type Output = u64;

    fn encode(
        &self,
        buf: &mut [u8],
        pos: usize,
        value: &u64,
        _scope: &mut CallScope,
    ) -> Result<usize> {
        write_u64(buf, pos, *value)
    }

    fn decode(&self, buf: &[u8], pos: usize, _scope: &mut CallScope) -> Result<(u64, usize)> {
        read_u64(buf, pos)
    }
}

/// Codec for an eight-byte little-endian `i64`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedI64;

impl Codec for FixedI64 {
    type Input = i64;
    type Output = i64;

    fn encode(
        &self,
        buf: &mut [u8],
        pos: usize,
        value: &i64,
        _scope: &mut CallScope,
    ) -> Result<usize> {
        write_i64(buf, pos, *value)
    }

    fn decode(&self, buf: &[u8], pos: usize, _scope: &mut CallScope) -> Result<(i64, usize)> {
        read_i64(buf, pos)
    }
}

/// Codec for an IEEE 754 `f64` stored as its little-endian bit pattern.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedF64;

impl Codec for FixedF64 {
    type Input = f64;
    type Output = f64;

    fn encode(
        &self,
        buf: &mut [u8],
        pos: usize,
        value: &f64,
        _scope: &mut CallScope,
    ) -> Result<usize> {
        write_f64(buf, pos, *value)
    }

    fn decode(&self, buf: &[u8], pos: usize, _scope: &mut CallScope) -> Result<(f64, usize)> {
        read_f64(buf, pos)
    }
}

/// Codec for a single-byte boolean.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedBool;

impl Codec for FixedBool {
    type Input = bool;
    type Output = bool;

    fn encode(
        &self,
        buf: &mut [u8],
        pos: usize,
        value: &bool,
        _scope: &mut CallScope,
    ) -> Result<usize> {
        write_bool(buf, pos, *value)
    }

    fn decode(&self, buf: &[u8], pos: usize, _scope: &mut CallScope) -> Result<(bool, usize)> {
        read_bool(buf, pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u32_layout_is_little_endian() {
        let mut buf = [0u8; 4];
        write_u32(&mut buf, 0, 0x0102_0304).unwrap();
        assert_eq!(buf, [0x04, 0x03, 0x02, 0x01]);
        assert_eq!(read_u32(&buf, 0).unwrap(), (0x0102_0304, 4));
    }

    #[test]
    fn width_boundaries_roundtrip() {
        let mut buf = [0u8; 8];

        for value in [0u16, 1, u16::MAX] {
            let end = write_u16(&mut buf, 0, value).unwrap();
            assert_eq!(read_u16(&buf, 0).unwrap(), (value, end));
        }
        for value in [0u32, 1, u32::MAX] {
            let end = write_u32(&mut buf, 0, value).unwrap();
            assert_eq!(read_u32(&buf, 0).unwrap(), (value, end));
        }
        for value in [0u64, 1, u64::MAX] {
            let end = write_u64(&mut buf, 0, value).unwrap();
            assert_eq!(read_u64(&buf, 0).unwrap(), (value, end));
        }
        for value in [0i64, 1, -1, i64::MIN, i64::MAX] {
            let end = write_i64(&mut buf, 0, value).unwrap();
            assert_eq!(read_i64(&buf, 0).unwrap(), (value, end));
        }
    }

    #[test]
    fn f64_preserves_bit_patterns() {
        let mut buf = [0u8; 8];
        for value in [0.0f64, -0.0, 1.5, f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            write_f64(&mut buf, 0, value).unwrap();
            let (decoded, _) = read_f64(&buf, 0).unwrap();
            assert_eq!(decoded.to_bits(), value.to_bits());
        }
    }

    #[test]
    fn bool_rejects_junk() {
        let mut buf = [0u8; 1];
        write_bool(&mut buf, 0, true).unwrap();
        assert_eq!(read_bool(&buf, 0).unwrap(), (true, 1));

        let err = read_bool(&[2], 0).unwrap_err();
        assert!(matches!(
            err,
            weft_error::WeftError::InvalidBool { raw: 2, pos: 0 }
        ));
    }

    #[test]
    fn out_of_bounds_reads_and_writes() {
        let mut small = [0u8; 3];
        assert!(write_u32(&mut small, 0, 1).is_err());
        assert!(write_u32(&mut small, 2, 1).is_err());
        assert!(read_u32(&small, 0).is_err());
        assert!(read_u8(&small, 3).is_err());
    }

    #[test]
    fn codec_impls_advance_cursor() {
        let mut scope = crate::scope::CallScope::new();
        let mut buf = [0u8; 16];

        let pos = FixedU32.encode(&mut buf, 0, &7, &mut scope).unwrap();
        let pos = FixedI64.encode(&mut buf, pos, &-9, &mut scope).unwrap();
        assert_eq!(pos, 12);

        let (a, pos) = FixedU32.decode(&buf, 0, &mut scope).unwrap();
        let (b, pos) = FixedI64.decode(&buf, pos, &mut scope).unwrap();
        assert_eq!((a, b, pos), (7, -9, 12));
    }
}

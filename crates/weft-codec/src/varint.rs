//! Base-128 variable-length integer encoding.
//!
//! Every length prefix and every reference index in the wire format is a
//! varint: little-endian groups of 7 payload bits per byte, least
//! significant group first, with the high bit of each byte set when more
//! bytes follow. A `u32` therefore occupies 1-5 bytes:
//!
//! | Value range              | Encoded bytes |
//! |--------------------------|---------------|
//! | 0 ..= 127                | 1             |
//! | 128 ..= 16383            | 2             |
//! | 16384 ..= 2097151        | 3             |
//! | 2097152 ..= 268435455    | 4             |
//! | 268435456 ..= u32::MAX   | 5             |
//!
//! The decoder rejects sequences that run past the buffer and sequences
//! that would carry bits beyond 32 (a 5th byte above 0x0F, or any 6th
//! byte). Both are fatal: the stream is considered corrupt.

use weft_error::{Result, WeftError};

/// Maximum encoded size of a `u32` varint.
pub const MAX_VARINT_LEN: usize = 5;

/// Compute the number of bytes needed to encode `value` as a varint.
pub const fn varint_len(value: u32) -> usize {
    if value < 0x80 {
        1
    } else if value < 0x4000 {
        2
    } else if value < 0x0020_0000 {
        3
    } else if value < 0x1000_0000 {
        4
    } else {
        5
    }
}

/// Write `value` as a varint at `pos`, returning the new cursor.
pub fn write_varint(buf: &mut [u8], pos: usize, value: u32) -> Result<usize> {
    let len = varint_len(value);
    if pos + len > buf.len() {
        return Err(WeftError::buffer_full(pos, len, buf.len()));
    }

    let mut v = value;
    let mut i = pos;
    loop {
        #[allow(clippy::cast_possible_truncation)]
        let group = (v & 0x7F) as u8;
        v >>= 7;
        if v == 0 {
            buf[i] = group;
            return Ok(i + 1);
        }
        buf[i] = group | 0x80;
        i += 1;
    }
}

/// Read a varint at `pos`, returning `(value, new_pos)`.
pub fn read_varint(buf: &[u8], pos: usize) -> Result<(u32, usize)> {
    let mut value: u32 = 0;
    for n in 0..MAX_VARINT_LEN {
        let Some(&byte) = buf.get(pos + n) else {
            return Err(WeftError::unexpected_eof(pos, n + 1, buf.len()));
        };
        // The 5th byte may only carry the top 4 bits of a u32 and must be
        // the final byte.
        if n == MAX_VARINT_LEN - 1 && byte > 0x0F {
            return Err(WeftError::VarintOverflow { pos });
        }
        value |= u32::from(byte & 0x7F) << (7 * n);
        if byte & 0x80 == 0 {
            return Ok((value, pos + n + 1));
        }
    }
    Err(WeftError::VarintOverflow { pos })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Byte-length boundary values: (min_value, max_value, expected_bytes).
    const BYTE_BOUNDARIES: [(u32, u32, usize); 5] = [
        (0, 0x7F, 1),
        (0x80, 0x3FFF, 2),
        (0x4000, 0x001F_FFFF, 3),
        (0x0020_0000, 0x0FFF_FFFF, 4),
        (0x1000_0000, u32::MAX, 5),
    ];

    #[test]
    fn golden_vectors() {
        let cases: &[(u32, &[u8])] = &[
            (0, &[0x00]),
            (1, &[0x01]),
            (127, &[0x7F]),
            (128, &[0x80, 0x01]),
            (129, &[0x81, 0x01]),
            (16383, &[0xFF, 0x7F]),
            (16384, &[0x80, 0x80, 0x01]),
            (0x7FFF_FFFF, &[0xFF, 0xFF, 0xFF, 0xFF, 0x07]),
            (u32::MAX, &[0xFF, 0xFF, 0xFF, 0xFF, 0x0F]),
        ];

        let mut buf = [0u8; MAX_VARINT_LEN];
        for &(value, expected) in cases {
            let end = write_varint(&mut buf, 0, value).unwrap();
            assert_eq!(&buf[..end], expected, "encode of {value}");

            let (decoded, consumed) = read_varint(expected, 0).unwrap();
            assert_eq!(decoded, value, "decode of {value}");
            assert_eq!(consumed, expected.len());
        }
    }

    #[test]
    fn boundary_roundtrip_and_lengths() {
        let mut buf = [0u8; MAX_VARINT_LEN];
        for &(min, max, expected_len) in &BYTE_BOUNDARIES {
            for value in [min, max] {
                let end = write_varint(&mut buf, 0, value).unwrap();
                assert_eq!(end, expected_len, "length of {value}");
                assert_eq!(varint_len(value), expected_len);
                let (decoded, consumed) = read_varint(&buf, 0).unwrap();
                assert_eq!(decoded, value, "roundtrip of {value}");
                assert_eq!(consumed, expected_len);
            }
        }
    }

    #[test]
    fn nonzero_start_position() {
        let mut buf = [0xCC_u8; 8];
        let end = write_varint(&mut buf, 3, 300).unwrap();
        assert_eq!(end, 5);
        // Bytes outside the write must be untouched.
        assert_eq!(&buf[..3], &[0xCC, 0xCC, 0xCC]);
        assert_eq!(&buf[5..], &[0xCC, 0xCC, 0xCC]);

        let (value, pos) = read_varint(&buf, 3).unwrap();
        assert_eq!(value, 300);
        assert_eq!(pos, 5);
    }

    #[test]
    fn write_rejects_full_buffer() {
        let mut buf = [0u8; 1];
        let err = write_varint(&mut buf, 0, 128).unwrap_err();
        // Retrying with a bigger buffer is the documented recovery.
        assert!(err.is_retryable());
        assert!(matches!(
            err,
            weft_error::WeftError::BufferFull {
                pos: 0,
                needed: 2,
                remaining: 1
            }
        ));
    }

    #[test]
    fn read_rejects_truncation() {
        // Continuation bit set with nothing after it.
        let err = read_varint(&[0x80], 0).unwrap_err();
        assert!(matches!(err, weft_error::WeftError::UnexpectedEof { .. }));

        let err = read_varint(&[], 0).unwrap_err();
        assert!(matches!(err, weft_error::WeftError::UnexpectedEof { .. }));
    }

    #[test]
    fn read_rejects_overflow() {
        // 5th byte carrying bits above 2^32.
        let err = read_varint(&[0xFF, 0xFF, 0xFF, 0xFF, 0x10], 0).unwrap_err();
        assert!(matches!(err, weft_error::WeftError::VarintOverflow { pos: 0 }));

        // A 6th byte is never valid, even if it would decode to zero.
        let err = read_varint(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x00], 0).unwrap_err();
        assert!(matches!(err, weft_error::WeftError::VarintOverflow { pos: 0 }));
    }

    #[test]
    fn read_stops_at_terminator() {
        // Decoder must consume exactly the varint and ignore trailing bytes.
        let buf = [0x81, 0x01, 0xEE, 0xEE];
        let (value, pos) = read_varint(&buf, 0).unwrap();
        assert_eq!(value, 129);
        assert_eq!(pos, 2);
    }

    proptest! {
        #[test]
        fn prop_roundtrip(value: u32) {
            let mut buf = [0u8; MAX_VARINT_LEN];
            let end = write_varint(&mut buf, 0, value).unwrap();
            prop_assert_eq!(end, varint_len(value));
            let (decoded, consumed) = read_varint(&buf, 0).unwrap();
            prop_assert_eq!(decoded, value);
            prop_assert_eq!(consumed, end);
        }
    }
}

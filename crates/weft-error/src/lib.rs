use thiserror::Error;

/// Primary error type for weft encode/decode operations.
///
/// Every variant is fatal at the codec layer: nothing here is recovered
/// locally, errors propagate to the top-level caller. The one variant a
/// caller is expected to act on is [`WeftError::BufferFull`], which carries
/// enough detail to retry the whole call against a larger buffer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WeftError {
    // === Encode-time ===
    /// The output buffer is too small for the bytes about to be written.
    #[error("buffer full at offset {pos}: need {needed} bytes, {remaining} remaining")]
    BufferFull {
        pos: usize,
        needed: usize,
        remaining: usize,
    },

    /// A character cannot be represented in the requested text format.
    #[error("character {ch:?} at offset {pos} is not encodable as ISO-8859-1")]
    UnencodableChar { ch: char, pos: usize },

    /// A payload is too long for the u32 length channel.
    #[error("payload of {len} units at offset {pos} exceeds the u32 length channel")]
    PayloadTooLarge { len: usize, pos: usize },

    // === Decode-time (corrupt stream) ===
    /// A read would run past the end of the buffer.
    #[error("unexpected end of buffer at offset {pos}: need {needed} bytes, {remaining} remaining")]
    UnexpectedEof {
        pos: usize,
        needed: usize,
        remaining: usize,
    },

    /// A varint sequence encodes a value wider than 32 bits.
    #[error("varint at offset {pos} overflows u32")]
    VarintOverflow { pos: usize },

    /// A back-reference names an index that was never registered.
    #[error("dangling back-reference {index} at offset {pos}")]
    DanglingReference { index: u32, pos: usize },

    /// A back-reference resolved to an instance of the wrong type.
    #[error("back-reference {index} at offset {pos} has mismatched type")]
    ReferenceTypeMismatch { index: u32, pos: usize },

    /// Text payload failed UTF-8 validation.
    #[error("invalid UTF-8 in text payload at offset {pos}")]
    InvalidUtf8 { pos: usize },

    /// Text payload contained an unpaired surrogate or malformed code unit.
    #[error("invalid UTF-16 in text payload at offset {pos}")]
    InvalidUtf16 { pos: usize },

    /// A boolean byte was neither 0 nor 1.
    #[error("invalid boolean byte {raw:#04x} at offset {pos}")]
    InvalidBool { raw: u8, pos: usize },

    // === Limits ===
    /// The reference table reached its maximum size.
    #[error("reference table limit of {limit} entries exceeded")]
    ReferenceLimitExceeded { limit: u32 },

    /// Decode nesting exceeded the call scope's depth cap.
    #[error("nesting depth limit of {limit} exceeded at offset {pos}")]
    DepthLimitExceeded { limit: usize, pos: usize },
}

impl WeftError {
    /// Whether re-running the whole top-level call can succeed without a
    /// code change (today: only a bigger output buffer).
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::BufferFull { .. })
    }

    /// Whether this error means the input stream is corrupt (as opposed to
    /// caller misuse or a capacity problem).
    pub const fn is_corrupt(&self) -> bool {
        matches!(
            self,
            Self::UnexpectedEof { .. }
                | Self::VarintOverflow { .. }
                | Self::DanglingReference { .. }
                | Self::ReferenceTypeMismatch { .. }
                | Self::InvalidUtf8 { .. }
                | Self::InvalidUtf16 { .. }
                | Self::InvalidBool { .. }
        )
    }

    /// Create a buffer-full error for a write of `needed` bytes at `pos`
    /// into a buffer of `len` bytes.
    pub const fn buffer_full(pos: usize, needed: usize, len: usize) -> Self {
        Self::BufferFull {
            pos,
            needed,
            remaining: len.saturating_sub(pos),
        }
    }

    /// Create an unexpected-EOF error for a read of `needed` bytes at `pos`
    /// from a buffer of `len` bytes.
    pub const fn unexpected_eof(pos: usize, needed: usize, len: usize) -> Self {
        Self::UnexpectedEof {
            pos,
            needed,
            remaining: len.saturating_sub(pos),
        }
    }
}

/// Result type alias using `WeftError`.
pub type Result<T> = std::result::Result<T, WeftError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = WeftError::buffer_full(10, 4, 12);
        assert_eq!(
            err.to_string(),
            "buffer full at offset 10: need 4 bytes, 2 remaining"
        );

        let err = WeftError::DanglingReference { index: 7, pos: 3 };
        assert_eq!(err.to_string(), "dangling back-reference 7 at offset 3");
    }

    #[test]
    fn retryable_classification() {
        assert!(WeftError::buffer_full(0, 1, 0).is_retryable());
        assert!(!WeftError::unexpected_eof(0, 1, 0).is_retryable());
        assert!(!WeftError::VarintOverflow { pos: 0 }.is_retryable());
    }

    #[test]
    fn corrupt_classification() {
        assert!(WeftError::unexpected_eof(4, 2, 5).is_corrupt());
        assert!(WeftError::VarintOverflow { pos: 0 }.is_corrupt());
        assert!(WeftError::DanglingReference { index: 1, pos: 0 }.is_corrupt());
        assert!(WeftError::InvalidBool { raw: 2, pos: 0 }.is_corrupt());

        // Capacity and usage errors are not stream corruption.
        assert!(!WeftError::buffer_full(0, 1, 0).is_corrupt());
        assert!(!WeftError::UnencodableChar { ch: 'é', pos: 0 }.is_corrupt());
        assert!(!WeftError::ReferenceLimitExceeded { limit: u32::MAX }.is_corrupt());
    }

    #[test]
    fn eof_remaining_saturates() {
        // pos past the buffer end must not underflow.
        let err = WeftError::unexpected_eof(10, 1, 4);
        assert!(matches!(err, WeftError::UnexpectedEof { remaining: 0, .. }));
    }
}

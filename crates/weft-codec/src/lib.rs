//! Composable binary codecs with reference tracking.
//!
//! Every codec reads and writes against a caller-owned byte buffer with an
//! explicit cursor; there is no internal buffering and no I/O. Variable
//! lengths, reference indices, and null sentinels all travel through one
//! primitive, a little-endian base-128 varint for `u32`:
//!
//! | Value shape          | Wire layout                                    |
//! |----------------------|------------------------------------------------|
//! | fixed-width leaf     | little-endian bytes, no prefix                 |
//! | text / byte slice    | `varint(count) ++ payload`                     |
//! | nullable             | `varint(0)` = null, else count shifted up by 1 |
//! | tracked, first seen  | `varint(0) ++ fields`                          |
//! | tracked, seen before | `varint(index)`                                |
//!
//! Encode and decode traverse a value in the same order, so the reference
//! indices assigned on each side agree without ever being written to the
//! stream. The scratch state that makes this work lives in a [`CallScope`]
//! threaded explicitly through every call; [`encode_root`] and
//! [`decode_root`] build a fresh one per top-level call so indices can
//! never leak between calls.

pub mod bytes;
pub mod fixed;
pub mod format;
pub mod graph;
pub mod nullable;
pub mod scope;
pub mod text;
pub mod varint;

pub use bytes::{ByteSpan, BytesCodec};
pub use fixed::{FixedBool, FixedF64, FixedI64, FixedU32, FixedU64};
pub use format::{resolve, CompatLevel, StringFormat, WireTextFormat};
pub use graph::{NodeCodec, Tracked, TrackedLeaf};
pub use nullable::{Nullable, NullableCodec};
pub use scope::{CallScope, ScopeGuard, DEFAULT_MAX_DEPTH, MAX_REFERENCES};
pub use text::TextCodec;
pub use varint::{read_varint, write_varint, MAX_VARINT_LEN};

use tracing::debug;
use weft_error::Result;

/// A bidirectional codec over a caller-owned buffer.
///
/// `Input` and `Output` are split so borrowing codecs stay ergonomic:
/// text encodes from `&str` and decodes to `String`, byte slices encode
/// from `&[u8]` and decode to a [`ByteSpan`] view. Symmetric codecs set
/// the two to the same type.
///
/// Both methods take the cursor by value and return the advanced cursor;
/// on error the buffer contents past `pos` are unspecified and the caller
/// must treat the whole call as failed.
pub trait Codec {
    type Input: ?Sized;
    type Output;

    /// Encode `value` at `pos`, returning the cursor one past the last
    /// byte written.
    fn encode(
        &self,
        buf: &mut [u8],
        pos: usize,
        value: &Self::Input,
        scope: &mut CallScope,
    ) -> Result<usize>;

    /// Decode a value at `pos`, returning `(value, new_pos)`.
    fn decode(&self, buf: &[u8], pos: usize, scope: &mut CallScope) -> Result<(Self::Output, usize)>;
}

/// Encode a value as a top-level call with a fresh [`CallScope`].
pub fn encode_root<C: Codec>(
    codec: &C,
    buf: &mut [u8],
    pos: usize,
    value: &C::Input,
) -> Result<usize> {
    let mut scope = CallScope::new();
    let end = codec.encode(buf, pos, value, &mut scope)?;
    debug!(
        pos,
        end,
        tracked = scope.encoded_count(),
        "top-level encode complete"
    );
    Ok(end)
}

/// Decode a value as a top-level call with a fresh [`CallScope`].
pub fn decode_root<C: Codec>(codec: &C, buf: &[u8], pos: usize) -> Result<(C::Output, usize)> {
    let mut scope = CallScope::new();
    let (value, end) = codec.decode(buf, pos, &mut scope)?;
    debug!(
        pos,
        end,
        tracked = scope.decoded_count(),
        "top-level decode complete"
    );
    Ok((value, end))
}

/// Encode a value as a top-level call on a reused scope.
///
/// The scope is cleared before the call runs and again on every exit
/// path, so reuse changes allocation behavior only, never the bytes.
pub fn encode_with_scope<C: Codec>(
    codec: &C,
    buf: &mut [u8],
    pos: usize,
    value: &C::Input,
    scope: &mut CallScope,
) -> Result<usize> {
    let mut guard = scope.enter();
    codec.encode(buf, pos, value, &mut guard)
}

/// Decode a value as a top-level call on a reused scope.
pub fn decode_with_scope<C: Codec>(
    codec: &C,
    buf: &[u8],
    pos: usize,
    scope: &mut CallScope,
) -> Result<(C::Output, usize)> {
    let mut guard = scope.enter();
    codec.decode(buf, pos, &mut guard)
}

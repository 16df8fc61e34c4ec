//! Optional values over codecs that can spare a sentinel.
//!
//! There is no generic presence byte. A codec opts into nullability by
//! implementing [`NullableCodec`] and folding the null case into a channel
//! it already writes: length-prefixed codecs reserve prefix 0 for null and
//! shift real lengths up by one, reference-tracked codecs do the same with
//! their index channel. Codecs with no such channel (the fixed-width
//! primitives) simply do not implement the trait, so `Option` round-trips
//! cost one varint and nothing else.

use weft_error::Result;

use crate::scope::CallScope;
use crate::Codec;

/// Capability trait for codecs that can represent `None` on the wire.
///
/// Implementations must keep the absent case distinct from every present
/// value; in particular `None` and an empty payload decode differently.
pub trait NullableCodec: Codec {
    /// Encode `value`, writing the codec's null sentinel for `None`.
    fn encode_opt(
        &self,
        buf: &mut [u8],
        pos: usize,
        value: Option<&Self::Input>,
        scope: &mut CallScope,
    ) -> Result<usize>;

    /// Decode an optional value, returning `(value, new_pos)`.
    fn decode_opt(
        &self,
        buf: &[u8],
        pos: usize,
        scope: &mut CallScope,
    ) -> Result<(Option<Self::Output>, usize)>;
}

/// Adapter fixing a [`NullableCodec`]'s surface to `Option` in and out.
///
/// `Nullable<C>` is itself neither a [`Codec`] nor a [`NullableCodec`],
/// which makes double wrapping a type error rather than a wire ambiguity:
///
/// ```compile_fail
/// use weft_codec::{Nullable, TextCodec, StringFormat, CompatLevel};
///
/// let inner = Nullable::new(TextCodec::new(StringFormat::Utf8, CompatLevel::V3));
/// let outer = Nullable::new(inner);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Nullable<C> {
    inner: C,
}

impl<C: NullableCodec> Nullable<C> {
    pub const fn new(inner: C) -> Self {
        Self { inner }
    }

    pub const fn inner(&self) -> &C {
        &self.inner
    }

    /// Encode an optional value at `pos`, returning the new cursor.
    pub fn encode(
        &self,
        buf: &mut [u8],
        pos: usize,
        value: Option<&C::Input>,
        scope: &mut CallScope,
    ) -> Result<usize> {
        self.inner.encode_opt(buf, pos, value, scope)
    }

    /// Decode an optional value at `pos`, returning `(value, new_pos)`.
    pub fn decode(
        &self,
        buf: &[u8],
        pos: usize,
        scope: &mut CallScope,
    ) -> Result<(Option<C::Output>, usize)> {
        self.inner.decode_opt(buf, pos, scope)
    }
}

//! Identity-based reference tracking for object graphs.
//!
//! A tracked value is written once. The first occurrence goes on the wire
//! as `varint(0)` followed by the value's fields; every later occurrence
//! of the same instance (same address, not same contents) is a single
//! `varint(i)` naming the index assigned at first encounter. Decode
//! mirrors the numbering by registering instances in the same encounter
//! order, so indices agree across the two sides without ever appearing in
//! a header.
//!
//! Cycles decode in one pass because [`Tracked`] registers the allocated
//! shell *before* decoding its fields: a back-reference to an ancestor
//! that is still mid-decode resolves to the shell, which the ancestor's
//! in-progress `decode_fields` call is populating.

use std::borrow::Borrow;
use std::rc::Rc;

use tracing::trace;
use weft_error::Result;

use crate::nullable::NullableCodec;
use crate::scope::CallScope;
use crate::varint::{read_varint, write_varint};
use crate::Codec;

/// Field-level codec for a node type that participates in a graph.
///
/// `Node` is the shared handle (typically `Rc<RefCell<...>>`): cloning it
/// must alias the same instance, and `identity` must return the same key
/// for every clone. The [`Tracked`] wrapper owns the wire framing; an
/// implementation only moves fields in and out.
pub trait NodeCodec {
    type Node: Clone + 'static;

    /// Stable identity key for an instance, shared by all of its clones.
    /// For `Rc`-based handles this is the allocation address.
    fn identity(node: &Self::Node) -> usize;

    /// Allocate an empty shell to register before its fields decode.
    fn alloc(&self) -> Self::Node;

    /// Write the node's fields at `pos`, returning the new cursor.
    fn encode_fields(
        &self,
        buf: &mut [u8],
        pos: usize,
        node: &Self::Node,
        scope: &mut CallScope,
    ) -> Result<usize>;

    /// Populate `node` from the bytes at `pos`, returning the new cursor.
    ///
    /// Must not assume sibling or ancestor nodes are fully populated:
    /// under a cycle they may still be shells.
    fn decode_fields(
        &self,
        buf: &[u8],
        pos: usize,
        node: &Self::Node,
        scope: &mut CallScope,
    ) -> Result<usize>;
}

/// Reference-tracking wrapper for a [`NodeCodec`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Tracked<C> {
    inner: C,
}

impl<C: NodeCodec> Tracked<C> {
    pub const fn new(inner: C) -> Self {
        Self { inner }
    }

    fn encode_first(
        &self,
        buf: &mut [u8],
        pos: usize,
        node: &C::Node,
        scope: &mut CallScope,
    ) -> Result<usize> {
        let index = scope.register_encoded(C::identity(node))?;
        trace!(index, pos, "tracked encode: first occurrence");
        let pos = write_varint(buf, pos, 0)?;
        self.inner.encode_fields(buf, pos, node, scope)
    }

    fn decode_first(
        &self,
        buf: &[u8],
        pos: usize,
        scope: &mut CallScope,
    ) -> Result<(C::Node, usize)> {
        let node = self.inner.alloc();
        // Register the shell before its fields decode so back-references
        // from inside the subtree resolve to it.
        let index = scope.register_decoded(Box::new(node.clone()))?;
        trace!(index, pos, "tracked decode: registered shell");
        scope.push_depth(pos)?;
        let result = self.inner.decode_fields(buf, pos, &node, scope);
        scope.pop_depth();
        Ok((node, result?))
    }
}

impl<C: NodeCodec> Codec for Tracked<C> {
    type Input = C::Node;
    type Output = C::Node;

    fn encode(
        &self,
        buf: &mut [u8],
        pos: usize,
        value: &C::Node,
        scope: &mut CallScope,
    ) -> Result<usize> {
        if let Some(index) = scope.encoded_index(C::identity(value)) {
            trace!(index, pos, "tracked encode: back-reference");
            return write_varint(buf, pos, index);
        }
        self.encode_first(buf, pos, value, scope)
    }

    fn decode(&self, buf: &[u8], pos: usize, scope: &mut CallScope) -> Result<(C::Node, usize)> {
        let (index, after) = read_varint(buf, pos)?;
        if index != 0 {
            let node = scope.resolve_decoded::<C::Node>(index, pos)?.clone();
            return Ok((node, after));
        }
        self.decode_first(buf, after, scope)
    }
}

/// Nullable layout for tracked nodes: the index channel absorbs the null
/// case. 0 is null, 1 means a first occurrence follows inline, and any
/// `k >= 2` is a back-reference to index `k - 1`.
impl<C: NodeCodec> NullableCodec for Tracked<C> {
    fn encode_opt(
        &self,
        buf: &mut [u8],
        pos: usize,
        value: Option<&C::Node>,
        scope: &mut CallScope,
    ) -> Result<usize> {
        let node = match value {
            None => return write_varint(buf, pos, 0),
            Some(node) => node,
        };
        if let Some(index) = scope.encoded_index(C::identity(node)) {
            trace!(index, pos, "tracked encode: back-reference");
            return write_varint(buf, pos, index + 1);
        }
        let index = scope.register_encoded(C::identity(node))?;
        trace!(index, pos, "tracked encode: first occurrence");
        let pos = write_varint(buf, pos, 1)?;
        self.inner.encode_fields(buf, pos, node, scope)
    }

    fn decode_opt(
        &self,
        buf: &[u8],
        pos: usize,
        scope: &mut CallScope,
    ) -> Result<(Option<C::Node>, usize)> {
        let (raw, after) = read_varint(buf, pos)?;
        match raw {
            0 => Ok((None, after)),
            1 => {
                let node = self.inner.alloc();
                let index = scope.register_decoded(Box::new(node.clone()))?;
                trace!(index, pos, "tracked decode: registered shell");
                scope.push_depth(pos)?;
                let result = self.inner.decode_fields(buf, after, &node, scope);
                scope.pop_depth();
                Ok((Some(node), result?))
            }
            _ => {
                let node = scope.resolve_decoded::<C::Node>(raw - 1, pos)?.clone();
                Ok((Some(node), after))
            }
        }
    }
}

/// Reference tracking for shared immutable leaves.
///
/// Wraps a plain value codec and tracks `Rc<Output>` handles by allocation
/// address, so a string or blob interned behind one `Rc` is written once
/// no matter how many fields point at it. Unlike [`Tracked`] there is no
/// shell phase: a leaf has no fields that can point back at it, so the
/// decoded value registers after it is fully built.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrackedLeaf<C> {
    inner: C,
}

impl<C> TrackedLeaf<C> {
    pub const fn new(inner: C) -> Self {
        Self { inner }
    }
}

impl<C> Codec for TrackedLeaf<C>
where
    C: Codec,
    C::Output: Borrow<C::Input> + 'static,
{
    type Input = Rc<C::Output>;
    type Output = Rc<C::Output>;

    fn encode(
        &self,
        buf: &mut [u8],
        pos: usize,
        value: &Rc<C::Output>,
        scope: &mut CallScope,
    ) -> Result<usize> {
        let identity = Rc::as_ptr(value) as usize;
        if let Some(index) = scope.encoded_index(identity) {
            trace!(index, pos, "leaf encode: back-reference");
            return write_varint(buf, pos, index);
        }
        let index = scope.register_encoded(identity)?;
        trace!(index, pos, "leaf encode: first occurrence");
        let pos = write_varint(buf, pos, 0)?;
        self.inner
            .encode(buf, pos, <C::Output as Borrow<C::Input>>::borrow(value), scope)
    }

    fn decode(
        &self,
        buf: &[u8],
        pos: usize,
        scope: &mut CallScope,
    ) -> Result<(Rc<C::Output>, usize)> {
        let (index, after) = read_varint(buf, pos)?;
        if index != 0 {
            let leaf = scope.resolve_decoded::<Rc<C::Output>>(index, pos)?.clone();
            return Ok((leaf, after));
        }
        let (value, after) = self.inner.decode(buf, after, scope)?;
        let leaf = Rc::new(value);
        let index = scope.register_decoded(Box::new(leaf.clone()))?;
        trace!(index, pos, "leaf decode: registered");
        Ok((leaf, after))
    }
}

impl<C> NullableCodec for TrackedLeaf<C>
where
    C: Codec,
    C::Output: Borrow<C::Input> + 'static,
{
    fn encode_opt(
        &self,
        buf: &mut [u8],
        pos: usize,
        value: Option<&Rc<C::Output>>,
        scope: &mut CallScope,
    ) -> Result<usize> {
        let leaf = match value {
            None => return write_varint(buf, pos, 0),
            Some(leaf) => leaf,
        };
        let identity = Rc::as_ptr(leaf) as usize;
        if let Some(index) = scope.encoded_index(identity) {
            return write_varint(buf, pos, index + 1);
        }
        scope.register_encoded(identity)?;
        let pos = write_varint(buf, pos, 1)?;
        self.inner
            .encode(buf, pos, <C::Output as Borrow<C::Input>>::borrow(leaf), scope)
    }

    fn decode_opt(
        &self,
        buf: &[u8],
        pos: usize,
        scope: &mut CallScope,
    ) -> Result<(Option<Rc<C::Output>>, usize)> {
        let (raw, after) = read_varint(buf, pos)?;
        match raw {
            0 => Ok((None, after)),
            1 => {
                let (value, after) = self.inner.decode(buf, after, scope)?;
                let leaf = Rc::new(value);
                scope.register_decoded(Box::new(leaf.clone()))?;
                Ok((Some(leaf), after))
            }
            _ => {
                let leaf = scope.resolve_decoded::<Rc<C::Output>>(raw - 1, pos)?.clone();
                Ok((Some(leaf), after))
            }
        }
    }
}

//! Per-call scratch state for reference tracking.
//!
//! A [`CallScope`] is created for one top-level encode or decode call and
//! threaded as an explicit `&mut` argument through every nested codec
//! invocation; there is no thread-local or global state. Reference indices
//! are meaningful only within one scope: they are assigned in encounter
//! order starting at 1 (0 is the inline-follows sentinel on the wire) and
//! must never be compared across calls.
//!
//! A long-lived scope can be reused across calls through [`CallScope::enter`],
//! which clears the maps up front and again on every exit path via its RAII
//! guard. Leaking identities between top-level calls would corrupt index
//! numbering, so the guard clears unconditionally, error or not.

use std::any::Any;
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};

use weft_error::{Result, WeftError};

/// Default cap on decode nesting depth.
///
/// Decode recursion is driven by the input bytes, so a corrupt or
/// adversarial stream could otherwise nest first-occurrence markers until
/// the stack runs out.
pub const DEFAULT_MAX_DEPTH: usize = 1024;

/// Highest reference index a scope will assign.
///
/// Kept one below `u32::MAX` so the nullable index channel (which shifts
/// indices up by one) can never overflow.
pub const MAX_REFERENCES: u32 = u32::MAX - 1;

/// Scratch state owned by one top-level encode/decode call.
#[derive(Debug, Default)]
pub struct CallScope {
    /// Identity (address) of each encoded value, by assignment order.
    encode_map: HashMap<usize, u32>,
    /// Registered decoded instances; index `i` lives at slot `i - 1`.
    decode_table: Vec<Box<dyn Any>>,
    depth: usize,
    max_depth: usize,
}

impl CallScope {
    /// Create an empty scope with the default depth cap.
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_DEPTH)
    }

    /// Create an empty scope with an explicit decode nesting cap.
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            encode_map: HashMap::new(),
            decode_table: Vec::new(),
            depth: 0,
            max_depth,
        }
    }

    /// Begin a top-level call on a reused scope.
    ///
    /// Clears the maps immediately and again when the guard drops, so no
    /// exit path can leak identities into the next call.
    pub fn enter(&mut self) -> ScopeGuard<'_> {
        self.clear();
        ScopeGuard { scope: self }
    }

    /// Drop all tracked state.
    pub fn clear(&mut self) {
        self.encode_map.clear();
        self.decode_table.clear();
        self.depth = 0;
    }

    /// Number of identities registered on the encode side.
    pub fn encoded_count(&self) -> usize {
        self.encode_map.len()
    }

    /// Number of instances registered on the decode side.
    pub fn decoded_count(&self) -> usize {
        self.decode_table.len()
    }

    /// Look up the index previously assigned to `identity`, if any.
    pub(crate) fn encoded_index(&self, identity: usize) -> Option<u32> {
        self.encode_map.get(&identity).copied()
    }

    /// Assign the next index (encounter order, starting at 1) to `identity`.
    pub(crate) fn register_encoded(&mut self, identity: usize) -> Result<u32> {
        if self.encode_map.len() >= MAX_REFERENCES as usize {
            return Err(WeftError::ReferenceLimitExceeded {
                limit: MAX_REFERENCES,
            });
        }
        #[allow(clippy::cast_possible_truncation)]
        let index = self.encode_map.len() as u32 + 1;
        self.encode_map.insert(identity, index);
        Ok(index)
    }

    /// Register a decoded (possibly still unpopulated) instance under the
    /// next index, returning that index.
    pub(crate) fn register_decoded(&mut self, instance: Box<dyn Any>) -> Result<u32> {
        if self.decode_table.len() >= MAX_REFERENCES as usize {
            return Err(WeftError::ReferenceLimitExceeded {
                limit: MAX_REFERENCES,
            });
        }
        self.decode_table.push(instance);
        #[allow(clippy::cast_possible_truncation)]
        Ok(self.decode_table.len() as u32)
    }

    /// Resolve a back-reference to a previously registered instance.
    ///
    /// A missing index means the stream is corrupt (dangling reference);
    /// an instance of the wrong type means the stream and the codec
    /// disagree about what was written there, which is equally fatal.
    pub(crate) fn resolve_decoded<T: 'static>(&self, index: u32, pos: usize) -> Result<&T> {
        let slot = (index as usize)
            .checked_sub(1)
            .and_then(|i| self.decode_table.get(i))
            .ok_or(WeftError::DanglingReference { index, pos })?;
        slot.downcast_ref::<T>()
            .ok_or(WeftError::ReferenceTypeMismatch { index, pos })
    }

    /// Enter one level of decode nesting.
    pub(crate) fn push_depth(&mut self, pos: usize) -> Result<()> {
        if self.depth >= self.max_depth {
            return Err(WeftError::DepthLimitExceeded {
                limit: self.max_depth,
                pos,
            });
        }
        self.depth += 1;
        Ok(())
    }

    /// Leave one level of decode nesting.
    pub(crate) fn pop_depth(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

/// RAII guard for a top-level call on a reused scope.
///
/// Dereferences to the scope; clears it on drop, whether the call
/// returned normally or propagated an error.
#[derive(Debug)]
pub struct ScopeGuard<'a> {
    scope: &'a mut CallScope,
}

impl Deref for ScopeGuard<'_> {
    type Target = CallScope;

    fn deref(&self) -> &CallScope {
        self.scope
    }
}

impl DerefMut for ScopeGuard<'_> {
    fn deref_mut(&mut self) -> &mut CallScope {
        self.scope
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        self.scope.clear();
    }
}

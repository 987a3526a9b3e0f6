//! Reference-counted buffer handles.
//!
//! A [`SharedBufferPtr`] owns one reference on a pool slot: cloning
//! increments, dropping decrements, and the last drop returns the slot to
//! its pool. A [`SharedChildPtr`] views a subrange of its *origin* buffer
//! and holds **two** references on it — its own plus one for the child
//! relation — so the origin outlives every child even when all parent
//! handles are gone. The const variants expose read-only bytes and are
//! reachable from the writeable ones but never the other way around.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use crate::buffer::pool::PoolShared;

/// Smart handle owning one reference on a pool-backed byte buffer.
///
/// The handle exposes the whole element region as a byte slice. Buffers are
/// not locks: `as_mut_slice` takes `&mut self`, and when several handles to
/// one buffer exist the writers must be coordinated by the surrounding
/// protocol (fill while uniquely owned, then share read-only).
pub struct SharedBufferPtr {
    pool: Arc<PoolShared>,
    index: usize,
}

impl SharedBufferPtr {
    pub(crate) fn from_parts(pool: Arc<PoolShared>, index: usize) -> Self {
        Self { pool, index }
    }

    /// Buffer length in bytes (the pool element size).
    pub fn len(&self) -> usize {
        self.pool.element_size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current reference count of the underlying buffer.
    pub fn reference_count(&self) -> u32 {
        self.pool.refcount(self.index).load(Ordering::Acquire)
    }

    /// The whole byte region, read-only.
    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: the slot stays allocated while this handle holds its
        // reference; concurrent writers are excluded by the coordination
        // contract in the type docs.
        unsafe { std::slice::from_raw_parts(self.pool.slot_ptr(self.index), self.len()) }
    }

    /// The whole byte region, writeable.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: as above; `&mut self` keeps a single handle from aliasing
        // its own writes, sharing across handles is the caller's protocol.
        unsafe { std::slice::from_raw_parts_mut(self.pool.slot_ptr(self.index), self.len()) }
    }

    /// Create a child handle viewing `[offset, offset + length)` of this
    /// buffer's origin region.
    ///
    /// The child adds two references to the origin. Returns `None` when the
    /// range does not fit the origin buffer; nothing is modified then.
    pub fn get_child(&self, type_tag: u16, offset: usize, length: usize) -> Option<SharedChildPtr> {
        if offset.checked_add(length)? > self.pool.element_size() {
            return None;
        }
        Some(SharedChildPtr {
            handle: self.clone(),
            relation: self.clone(),
            offset,
            length,
            type_tag,
        })
    }

    fn same_buffer(&self, other_pool: &Arc<PoolShared>, other_index: usize) -> bool {
        Arc::ptr_eq(&self.pool, other_pool) && self.index == other_index
    }
}

impl Clone for SharedBufferPtr {
    fn clone(&self) -> Self {
        self.pool.refcount(self.index).fetch_add(1, Ordering::Relaxed);
        Self {
            pool: Arc::clone(&self.pool),
            index: self.index,
        }
    }
}

impl Drop for SharedBufferPtr {
    fn drop(&mut self) {
        // The last decrement returns the slot to the pool. Release pairs
        // with the acquire fence in `release_slot`.
        if self.pool.refcount(self.index).fetch_sub(1, Ordering::Release) == 1 {
            self.pool.release_slot();
        }
    }
}

impl PartialEq for SharedBufferPtr {
    /// Handles are equal when they reference the same underlying buffer.
    fn eq(&self, other: &Self) -> bool {
        self.same_buffer(&other.pool, other.index)
    }
}

impl Eq for SharedBufferPtr {}

impl std::fmt::Debug for SharedBufferPtr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedBufferPtr")
            .field("index", &self.index)
            .field("len", &self.len())
            .field("refcount", &self.reference_count())
            .finish()
    }
}

/// Handle viewing a subrange of its origin buffer.
///
/// Holds two references on the origin (its own plus the child relation);
/// cloning adds two more, dropping removes two. Children may spawn further
/// children; all of them share the single origin buffer, and `offset` is
/// always relative to the origin region.
pub struct SharedChildPtr {
    /// The child's own reference on the origin.
    handle: SharedBufferPtr,
    /// The child-relation reference that keeps the origin alive for the
    /// producer-drops-parent-first pattern.
    relation: SharedBufferPtr,
    offset: usize,
    length: usize,
    type_tag: u16,
}

impl SharedChildPtr {
    /// View length in bytes.
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Offset of the view into the origin region.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Caller-chosen tag describing what the view contains.
    pub fn type_tag(&self) -> u16 {
        self.type_tag
    }

    /// Reference count of the origin buffer.
    pub fn reference_count(&self) -> u32 {
        self.handle.reference_count()
    }

    /// A full-region handle on the origin buffer (adds one reference).
    pub fn origin(&self) -> SharedBufferPtr {
        self.handle.clone()
    }

    /// The parent view. Children carry no parent-window bookkeeping beyond
    /// the origin, so this is the full origin region, which is what the
    /// consumer needs to climb out of a nested view.
    pub fn parent(&self) -> SharedBufferPtr {
        self.handle.clone()
    }

    /// The viewed bytes, read-only.
    pub fn as_slice(&self) -> &[u8] {
        &self.handle.as_slice()[self.offset..self.offset + self.length]
    }

    /// The viewed bytes, writeable.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        let offset = self.offset;
        let length = self.length;
        &mut self.handle.as_mut_slice()[offset..offset + length]
    }

    /// Spawn another child of the same origin. `offset` is relative to the
    /// origin region, like every child offset.
    pub fn get_child(&self, type_tag: u16, offset: usize, length: usize) -> Option<SharedChildPtr> {
        self.handle.get_child(type_tag, offset, length)
    }
}

impl Clone for SharedChildPtr {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
            relation: self.relation.clone(),
            offset: self.offset,
            length: self.length,
            type_tag: self.type_tag,
        }
    }
}

impl PartialEq for SharedChildPtr {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl Eq for SharedChildPtr {}

impl PartialEq<SharedBufferPtr> for SharedChildPtr {
    fn eq(&self, other: &SharedBufferPtr) -> bool {
        self.handle == *other
    }
}

impl PartialEq<SharedChildPtr> for SharedBufferPtr {
    fn eq(&self, other: &SharedChildPtr) -> bool {
        *self == other.handle
    }
}

impl std::fmt::Debug for SharedChildPtr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedChildPtr")
            .field("offset", &self.offset)
            .field("length", &self.length)
            .field("type_tag", &self.type_tag)
            .field("refcount", &self.reference_count())
            .finish()
    }
}

/// Read-only buffer handle with the same reference-count behaviour as
/// [`SharedBufferPtr`].
///
/// A writeable handle converts into a const one; there is no way back.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ConstSharedBufferPtr {
    inner: SharedBufferPtr,
}

impl ConstSharedBufferPtr {
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn reference_count(&self) -> u32 {
        self.inner.reference_count()
    }

    pub fn as_slice(&self) -> &[u8] {
        self.inner.as_slice()
    }

    /// Spawn a read-only child view (adds two origin references).
    pub fn get_child(
        &self,
        type_tag: u16,
        offset: usize,
        length: usize,
    ) -> Option<ConstSharedChildPtr> {
        self.inner
            .get_child(type_tag, offset, length)
            .map(|child| ConstSharedChildPtr { inner: child })
    }
}

impl From<SharedBufferPtr> for ConstSharedBufferPtr {
    fn from(inner: SharedBufferPtr) -> Self {
        Self { inner }
    }
}

/// Read-only child view; see [`SharedChildPtr`] for the reference rules.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ConstSharedChildPtr {
    inner: SharedChildPtr,
}

impl ConstSharedChildPtr {
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn offset(&self) -> usize {
        self.inner.offset()
    }

    pub fn type_tag(&self) -> u16 {
        self.inner.type_tag()
    }

    pub fn reference_count(&self) -> u32 {
        self.inner.reference_count()
    }

    pub fn as_slice(&self) -> &[u8] {
        self.inner.as_slice()
    }

    pub fn origin(&self) -> ConstSharedBufferPtr {
        ConstSharedBufferPtr {
            inner: self.inner.origin(),
        }
    }

    pub fn get_child(
        &self,
        type_tag: u16,
        offset: usize,
        length: usize,
    ) -> Option<ConstSharedChildPtr> {
        self.inner
            .get_child(type_tag, offset, length)
            .map(|child| ConstSharedChildPtr { inner: child })
    }
}

impl From<SharedChildPtr> for ConstSharedChildPtr {
    fn from(inner: SharedChildPtr) -> Self {
        Self { inner }
    }
}

//! Fixed-capacity pools of reference-counted byte buffers.

use std::cell::UnsafeCell;
use std::ptr::NonNull;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering, fence};

use parking_lot::Mutex;

use crate::buffer::pointer::SharedBufferPtr;
use crate::error::Error;

/// Slot metadata: the reference count alone. A count of zero means free.
pub(crate) struct Slot {
    pub(crate) refcount: AtomicU32,
}

/// Shared state behind every pool handle and buffer pointer.
///
/// The byte storage is a single contiguous region split into `count`
/// elements of `element_size` bytes. Slot metadata is atomic; only the
/// allocation scan takes a (short) lock. Buffer *contents* are not guarded
/// here at all: a buffer is not a mutual-exclusion primitive, and writers
/// coordinate externally (see the module docs).
pub(crate) struct PoolShared {
    element_size: usize,
    count: usize,
    slots: Box<[Slot]>,
    free_count: AtomicUsize,
    /// Next slot index to try; advanced on every successful allocation so
    /// the common path is O(1) and a full scan only happens on wrap.
    cursor: Mutex<usize>,
    storage: NonNull<u8>,
    /// Keeps heap-backed storage alive; `None` for external regions.
    _owned_storage: Option<Box<[UnsafeCell<u8>]>>,
}

// SAFETY: the raw storage pointer refers either to heap memory owned by this
// struct or to a caller-provided region with exclusive access handed over at
// construction. Slot metadata is atomic; byte regions are handed out under
// the documented external-coordination contract.
unsafe impl Send for PoolShared {}
unsafe impl Sync for PoolShared {}

impl PoolShared {
    pub(crate) fn element_size(&self) -> usize {
        self.element_size
    }

    pub(crate) fn count(&self) -> usize {
        self.count
    }

    pub(crate) fn refcount(&self, index: usize) -> &AtomicU32 {
        &self.slots[index].refcount
    }

    /// Raw pointer to the first byte of slot `index`.
    pub(crate) fn slot_ptr(&self, index: usize) -> *mut u8 {
        debug_assert!(index < self.count);
        // SAFETY: index is within the pool, so the offset stays inside the
        // storage region.
        unsafe { self.storage.as_ptr().add(index * self.element_size) }
    }

    /// Called by the last dropped handle of a slot.
    pub(crate) fn release_slot(&self) {
        // Pair with the Release decrement in the handle drop so the freed
        // bytes are not reordered past the refcount reaching zero.
        fence(Ordering::Acquire);
        self.free_count.fetch_add(1, Ordering::Release);
    }
}

/// Pool of fixed-size, reference-counted byte buffers.
///
/// `allocate` hands out [`SharedBufferPtr`] handles with the reference count
/// set to one; the last handle dropped returns the slot. The pool handle
/// itself is cheap to clone — clones share the same slots.
///
/// Buffer contents are deliberately unsynchronized: two threads may hold
/// handles to the same buffer, and writes must be coordinated by the
/// protocol above (in this codebase: a buffer is filled by its producer
/// while the reference count is one, then flows read-only).
#[derive(Clone)]
pub struct SharedBufferPool {
    pub(crate) shared: Arc<PoolShared>,
}

impl SharedBufferPool {
    /// Create a pool of `count` elements of `element_size` bytes each,
    /// backed by heap storage allocated here (startup time).
    pub fn new(element_size: usize, count: usize) -> Self {
        let storage_len = element_size * count;
        let mut owned: Box<[UnsafeCell<u8>]> =
            (0..storage_len).map(|_| UnsafeCell::new(0)).collect();

        let storage = if storage_len == 0 {
            NonNull::dangling()
        } else {
            // SAFETY: a freshly allocated boxed slice is non-null.
            unsafe { NonNull::new_unchecked(owned.as_mut_ptr().cast::<u8>()) }
        };

        log::debug!("shared buffer pool created: {count} x {element_size} B");

        Self {
            shared: Arc::new(PoolShared {
                element_size,
                count,
                slots: (0..count)
                    .map(|_| Slot {
                        refcount: AtomicU32::new(0),
                    })
                    .collect(),
                free_count: AtomicUsize::new(count),
                cursor: Mutex::new(0),
                storage,
                _owned_storage: Some(owned),
            }),
        }
    }

    pub(crate) fn with_storage_ptr(
        storage: NonNull<u8>,
        element_size: usize,
        count: usize,
    ) -> Self {
        Self {
            shared: Arc::new(PoolShared {
                element_size,
                count,
                slots: (0..count)
                    .map(|_| Slot {
                        refcount: AtomicU32::new(0),
                    })
                    .collect(),
                free_count: AtomicUsize::new(count),
                cursor: Mutex::new(0),
                storage,
                _owned_storage: None,
            }),
        }
    }

    /// Total number of elements.
    pub fn number_of_elements(&self) -> usize {
        self.shared.count()
    }

    /// Currently unreferenced elements.
    pub fn number_of_free_elements(&self) -> usize {
        self.shared.free_count.load(Ordering::Acquire)
    }

    /// Size of one element in bytes.
    pub fn element_size(&self) -> usize {
        self.shared.element_size()
    }

    /// Hand out a free buffer with the reference count set to one.
    ///
    /// Returns `None` when every slot is referenced. Nothing is modified in
    /// that case. The buffer's previous contents are unspecified; callers
    /// overwrite what they use.
    pub fn allocate(&self) -> Option<SharedBufferPtr> {
        let mut cursor = self.shared.cursor.lock();
        for step in 0..self.shared.count() {
            let index = (*cursor + step) % self.shared.count();
            let slot = self.shared.refcount(index);
            if slot.load(Ordering::Acquire) == 0 {
                slot.store(1, Ordering::Release);
                self.shared.free_count.fetch_sub(1, Ordering::AcqRel);
                *cursor = (index + 1) % self.shared.count();
                drop(cursor);
                return Some(SharedBufferPtr::from_parts(Arc::clone(&self.shared), index));
            }
        }
        None
    }
}

/// Pool whose buffer memory lives in a caller-provided region.
///
/// Some targets need buffer storage in a specific memory bank (DMA-capable
/// SRAM, a radiation-hardened region). The caller hands over exclusive
/// access to a `'static` byte region at construction; everything else is
/// identical to [`SharedBufferPool`].
#[derive(Clone)]
pub struct ExternalSharedBufferPool {
    pool: SharedBufferPool,
}

impl ExternalSharedBufferPool {
    /// Build a pool over `storage`. Fails with [`Error::TooManyElements`]
    /// when the region is smaller than `element_size * count`.
    pub fn new(
        storage: &'static mut [u8],
        element_size: usize,
        count: usize,
    ) -> Result<Self, Error> {
        if storage.len() < element_size * count {
            return Err(Error::TooManyElements);
        }
        let ptr = if storage.is_empty() {
            NonNull::dangling()
        } else {
            // SAFETY: a live slice pointer is non-null.
            unsafe { NonNull::new_unchecked(storage.as_mut_ptr()) }
        };
        log::debug!("external shared buffer pool created: {count} x {element_size} B");
        Ok(Self {
            pool: SharedBufferPool::with_storage_ptr(ptr, element_size, count),
        })
    }
}

impl std::ops::Deref for ExternalSharedBufferPool {
    type Target = SharedBufferPool;

    fn deref(&self) -> &SharedBufferPool {
        &self.pool
    }
}

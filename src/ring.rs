//! Byte ring buffer shared between producers and the writer thread.
//!
//! The buffer is a fixed `Box<[u8]>` addressed by two wrapping cursors:
//! `write_pos` is owned by the producer side and `read_pos` by the writer
//! thread. Each cursor is stored by exactly one side and loaded by the
//! other with acquire/release ordering, so no lock is needed for the
//! cursors themselves. One slot is always left unused to distinguish a
//! full buffer from an empty one.
//!
//! # Safety
//!
//! The byte array is accessed without a lock. This is sound because the
//! two sides operate on disjoint regions:
//!
//! - the producer writes only `[write_pos, write_pos + n)` and publishes
//!   the region with the Release store of `write_pos`; the writer thread
//!   never reads past the `write_pos` it Acquire-loaded
//! - the writer thread reads only `[read_pos, read_pos + n)` and retires
//!   the region with the Release store of `read_pos`; the producer never
//!   writes past the `read_pos` it Acquire-loaded (minus the reserved slot)
//!
//! Producer-side exclusion (there may be many producer threads) is the
//! caller's responsibility: [`FileWriter`](crate::FileWriter) serializes
//! `reserve_and_copy` behind its producer guard.

use crate::sync::{AtomicUsize, Ordering};
use std::cell::UnsafeCell;
use std::io;

pub(crate) struct RingBuffer {
    data: UnsafeCell<Box<[u8]>>,
    capacity: usize,
    /// Next byte the producer will fill. Written by the producer side only.
    write_pos: AtomicUsize,
    /// Next byte the writer thread will flush. Written by the writer
    /// thread only.
    read_pos: AtomicUsize,
}

// SAFETY: the cursor protocol above guarantees the two sides never touch
// overlapping regions of `data`, and the cursors themselves are atomics.
unsafe impl Send for RingBuffer {}
unsafe impl Sync for RingBuffer {}

impl RingBuffer {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            data: UnsafeCell::new(vec![0u8; capacity].into_boxed_slice()),
            capacity,
            write_pos: AtomicUsize::new(0),
            read_pos: AtomicUsize::new(0),
        }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes the producer could accept right now.
    ///
    /// A concurrent `release` on the writer side can only grow this, so a
    /// stale snapshot under-reports space and never corrupts.
    #[inline]
    pub(crate) fn writable(&self) -> usize {
        let wp = self.write_pos.load(Ordering::Relaxed);
        let rp = self.read_pos.load(Ordering::Acquire);
        (rp + self.capacity - wp - 1) % self.capacity
    }

    /// Bytes copied in but not yet flushed by the writer thread.
    #[inline]
    pub(crate) fn pending(&self) -> usize {
        let wp = self.write_pos.load(Ordering::Acquire);
        let rp = self.read_pos.load(Ordering::Acquire);
        (wp + self.capacity - rp) % self.capacity
    }

    /// Copy as much of `data` as currently fits, starting at the producer
    /// cursor. Returns the buffer offset of the copied region and the
    /// number of bytes accepted (zero when the buffer is full).
    ///
    /// The copy wraps around the end of the buffer, splitting into at most
    /// two contiguous copies. The caller must hold the producer guard: this
    /// method is the only writer of `write_pos` and of the reserved region,
    /// which the writer thread cannot observe until the Release store
    /// publishes it.
    pub(crate) fn reserve_and_copy(&self, data: &[u8]) -> (usize, usize) {
        let wp = self.write_pos.load(Ordering::Relaxed);
        let len = data.len().min(self.writable());
        if len == 0 {
            return (wp, 0);
        }

        let first = len.min(self.capacity - wp);
        // SAFETY: `[wp, wp + len)` (mod capacity) is unpublished producer
        // territory, disjoint from anything the writer thread reads.
        unsafe {
            let base = (*self.data.get()).as_mut_ptr();
            std::ptr::copy_nonoverlapping(data.as_ptr(), base.add(wp), first);
            if len > first {
                std::ptr::copy_nonoverlapping(data.as_ptr().add(first), base, len - first);
            }
        }

        self.write_pos
            .store((wp + len) % self.capacity, Ordering::Release);
        (wp, len)
    }

    /// Run `f` over the committed region `[offset, offset + len)`, split
    /// into at most two contiguous slices, then retire the region.
    ///
    /// The region is retired even when `f` fails: the bytes have left the
    /// buffer either way and the space must not leak. Writer thread only.
    pub(crate) fn consume<F>(&self, offset: usize, len: usize, f: F) -> io::Result<()>
    where
        F: FnOnce(&[u8], &[u8]) -> io::Result<()>,
    {
        debug_assert!(len < self.capacity);
        let first = len.min(self.capacity - offset);
        // SAFETY: `[offset, offset + len)` (mod capacity) was published by
        // the producer's Release store and is not rewritten until the
        // `release` below retires it.
        let result = unsafe {
            let base = (*self.data.get()).as_ptr();
            f(
                std::slice::from_raw_parts(base.add(offset), first),
                std::slice::from_raw_parts(base, len - first),
            )
        };
        self.release(len);
        result
    }

    /// Retire `len` bytes without reading them; used when the region
    /// belongs to a handle that has already failed. Writer thread only.
    pub(crate) fn release(&self, len: usize) {
        let rp = self.read_pos.load(Ordering::Relaxed);
        self.read_pos
            .store((rp + len) % self.capacity, Ordering::Release);
    }
}

//! Low-level allocation primitives.
//!
//! Every `unsafe` block that touches the global allocator lives here, each
//! with a `// SAFETY:` comment. [`Allocation`] owns one block and frees it
//! on drop; zero-byte layouts never reach the allocator and are represented
//! by a dangling pointer carrying the layout's alignment.

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::mem::ManuallyDrop;
use std::ptr::{self, NonNull};
use std::slice;

use crate::config::ElemLayout;
use crate::error::BufferError;

/// Layout of `capacity` slots, with the multiplication checked.
pub(crate) fn array_layout(elem: ElemLayout, capacity: usize) -> Result<Layout, BufferError> {
    let overflow = || BufferError::CapacityOverflow {
        capacity,
        elem_size: elem.size(),
    };
    let bytes = elem.size().checked_mul(capacity).ok_or_else(overflow)?;
    Layout::from_size_align(bytes, elem.align()).map_err(|_| overflow())
}

fn dangling(align: usize) -> NonNull<u8> {
    NonNull::new(ptr::without_provenance_mut(align)).unwrap_or(NonNull::dangling())
}

/// An owned block from the global allocator.
///
/// Bytes are zero-filled when the block is created and whenever it grows,
/// so every byte in `[0, size)` is initialized unless a caller has since
/// written a value with padding through [`slot_ptr`](Self::slot_ptr).
pub(crate) struct Allocation {
    ptr: NonNull<u8>,
    layout: Layout,
}

// SAFETY: an Allocation is the unique owner of its bytes, like a Box<[u8]>.
unsafe impl Send for Allocation {}
// SAFETY: shared access only hands out `&[u8]` or raw pointers.
unsafe impl Sync for Allocation {}

impl Allocation {
    /// Allocate a zero-filled block.
    pub(crate) fn zeroed(layout: Layout) -> Result<Self, BufferError> {
        if layout.size() == 0 {
            return Ok(Self {
                ptr: dangling(layout.align()),
                layout,
            });
        }
        // SAFETY: layout has a non-zero size.
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let ptr = NonNull::new(raw).ok_or(BufferError::AllocationFailed {
            bytes: layout.size(),
        })?;
        Ok(Self { ptr, layout })
    }

    /// Reallocate to `new_layout`, zero-filling any added tail.
    ///
    /// On error the block is untouched and still owned by `self`.
    pub(crate) fn resize(&mut self, new_layout: Layout) -> Result<(), BufferError> {
        debug_assert_eq!(new_layout.align(), self.layout.align());
        let old_size = self.layout.size();
        let new_size = new_layout.size();

        if old_size == 0 {
            *self = Self::zeroed(new_layout)?;
            return Ok(());
        }
        if new_size == 0 {
            // SAFETY: ptr was allocated by the global allocator with self.layout.
            unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) };
            self.ptr = dangling(new_layout.align());
            self.layout = new_layout;
            return Ok(());
        }

        // SAFETY: ptr was allocated by the global allocator with self.layout,
        // new_size is non-zero and `Layout` has checked it against isize::MAX
        // at this alignment.
        let raw = unsafe { alloc::realloc(self.ptr.as_ptr(), self.layout, new_size) };
        let ptr = NonNull::new(raw).ok_or(BufferError::AllocationFailed { bytes: new_size })?;
        if new_size > old_size {
            // SAFETY: [old_size, new_size) lies inside the new block.
            unsafe { ptr.as_ptr().add(old_size).write_bytes(0, new_size - old_size) };
        }
        self.ptr = ptr;
        self.layout = new_layout;
        Ok(())
    }

    pub(crate) fn layout(&self) -> Layout {
        self.layout
    }

    pub(crate) fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    /// Pointer to byte `offset`. Dereferencing it is only valid in bounds.
    pub(crate) fn slot_ptr(&self, offset: usize) -> *mut u8 {
        self.ptr.as_ptr().wrapping_add(offset)
    }

    /// memmove of `count` bytes from `src` to `dst` (byte offsets).
    pub(crate) fn copy_within(&mut self, src: usize, dst: usize, count: usize) {
        let size = self.layout.size();
        assert!(src <= size && size - src >= count, "copy source out of block");
        assert!(dst <= size && size - dst >= count, "copy destination out of block");
        if count == 0 {
            return;
        }
        // SAFETY: both ranges were checked against the block; ptr::copy
        // tolerates overlap.
        unsafe { ptr::copy(self.slot_ptr(src), self.slot_ptr(dst), count) };
    }

    /// The whole block as bytes.
    ///
    /// # Safety
    ///
    /// Every byte of the block must be initialized, i.e. no value with
    /// padding has been written through [`slot_ptr`](Self::slot_ptr).
    pub(crate) unsafe fn bytes(&self) -> &[u8] {
        // SAFETY: ptr is valid for layout.size() bytes (dangling is fine for
        // zero); initialization is the caller's obligation.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.layout.size()) }
    }

    /// Mutable counterpart of [`bytes`](Self::bytes).
    ///
    /// # Safety
    ///
    /// Same as [`bytes`](Self::bytes).
    pub(crate) unsafe fn bytes_mut(&mut self) -> &mut [u8] {
        // SAFETY: as in `bytes`, and `&mut self` makes the borrow unique.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.layout.size()) }
    }

    /// Give up ownership without freeing.
    pub(crate) fn into_raw(self) -> (NonNull<u8>, Layout) {
        let this = ManuallyDrop::new(self);
        (this.ptr, this.layout)
    }

    /// Take back ownership of a block produced by [`into_raw`](Self::into_raw).
    ///
    /// # Safety
    ///
    /// `ptr` and `layout` must come from `into_raw` and the block must not
    /// have been freed or reclaimed since.
    pub(crate) unsafe fn from_raw(ptr: NonNull<u8>, layout: Layout) -> Self {
        Self { ptr, layout }
    }
}

impl Drop for Allocation {
    fn drop(&mut self) {
        if self.layout.size() != 0 {
            // SAFETY: ptr was allocated by the global allocator with self.layout.
            unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes_of(a: &Allocation) -> &[u8] {
        // SAFETY: tests only write through `bytes_mut`.
        unsafe { a.bytes() }
    }

    #[test]
    fn array_layout_detects_overflow() {
        let err = array_layout(ElemLayout::erased(8), usize::MAX / 4).unwrap_err();
        assert!(matches!(err, BufferError::CapacityOverflow { elem_size: 8, .. }));
    }

    #[test]
    fn array_layout_rejects_sizes_past_isize_max() {
        let err = array_layout(ElemLayout::erased(1), usize::MAX).unwrap_err();
        assert!(matches!(err, BufferError::CapacityOverflow { .. }));
    }

    #[test]
    fn zeroed_block_is_zero() {
        let a = Allocation::zeroed(array_layout(ElemLayout::erased(4), 16).unwrap()).unwrap();
        assert_eq!(bytes_of(&a).len(), 64);
        assert!(bytes_of(&a).iter().all(|&b| b == 0));
        assert_eq!(a.as_ptr() as usize % 16, 0);
    }

    #[test]
    fn zero_size_block_is_aligned_and_empty() {
        let a = Allocation::zeroed(array_layout(ElemLayout::erased(4), 0).unwrap()).unwrap();
        assert!(bytes_of(&a).is_empty());
        assert_eq!(a.as_ptr() as usize % 16, 0);
    }

    #[test]
    fn grow_keeps_prefix_and_zeroes_tail() {
        let elem = ElemLayout::new(1, 1).unwrap();
        let mut a = Allocation::zeroed(array_layout(elem, 4).unwrap()).unwrap();
        // SAFETY: all bytes are initialized.
        unsafe { a.bytes_mut() }.copy_from_slice(&[1, 2, 3, 4]);
        a.resize(array_layout(elem, 8).unwrap()).unwrap();
        assert_eq!(bytes_of(&a), &[1, 2, 3, 4, 0, 0, 0, 0]);
        a.resize(array_layout(elem, 2).unwrap()).unwrap();
        assert_eq!(bytes_of(&a), &[1, 2]);
    }

    #[test]
    fn resize_through_zero() {
        let elem = ElemLayout::new(2, 2).unwrap();
        let mut a = Allocation::zeroed(array_layout(elem, 3).unwrap()).unwrap();
        a.resize(array_layout(elem, 0).unwrap()).unwrap();
        assert_eq!(a.layout().size(), 0);
        a.resize(array_layout(elem, 5).unwrap()).unwrap();
        assert_eq!(bytes_of(&a), &[0; 10]);
    }

    #[test]
    fn copy_within_handles_overlap() {
        let elem = ElemLayout::new(1, 1).unwrap();
        let mut a = Allocation::zeroed(array_layout(elem, 5).unwrap()).unwrap();
        // SAFETY: all bytes are initialized.
        unsafe { a.bytes_mut() }.copy_from_slice(&[1, 2, 3, 4, 5]);
        a.copy_within(1, 0, 4);
        assert_eq!(bytes_of(&a), &[2, 3, 4, 5, 5]);
    }

    #[test]
    fn raw_round_trip_frees_once() {
        let a = Allocation::zeroed(array_layout(ElemLayout::erased(8), 4).unwrap()).unwrap();
        let (ptr, layout) = a.into_raw();
        // SAFETY: parts come straight from into_raw.
        let back = unsafe { Allocation::from_raw(ptr, layout) };
        assert_eq!(back.layout(), layout);
    }
}

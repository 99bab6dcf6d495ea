//! Type-erased buffer with a runtime slot size.
//!
//! [`RawBuffer`] stores elements as `elem_size`-byte slots and never looks
//! inside them. It is the storage engine behind [`Buffer<T>`](crate::Buffer)
//! and the type the C bindings wrap.

use std::fmt;
use std::ops::Range;

use log::{debug, trace};

use crate::config::{BufferConfig, ElemLayout};
use crate::contract;
use crate::error::{BufferError, ExportError};
use crate::export::{ByteString, LeakedBytes};
use crate::raw::{array_layout, Allocation};

/// A growable array of fixed-size byte slots.
///
/// Slots `[0, len)` hold elements; slots `[len, capacity)` are spare.
/// Growth multiplies the capacity by 3/2. Errors from [`grow`](Self::grow),
/// [`resize`](Self::resize) and [`push`](Self::push) leave the buffer
/// untouched.
///
/// Every byte of the allocation is initialized: construction and growth
/// zero-fill, and elements only arrive as `&[u8]`. `Buffer<T>` relies on
/// the pointer-level methods only and never reaches the byte views of its
/// inner `RawBuffer`, so values with padding never leak out as bytes.
pub struct RawBuffer {
    alloc: Allocation,
    elem: ElemLayout,
    capacity: usize,
    len: usize,
}

impl RawBuffer {
    /// Allocate room for `initial_capacity` zeroed slots of `elem_size`
    /// bytes, aligned to [`ElemLayout::MAX_ALIGN`].
    pub fn allocate(initial_capacity: usize, elem_size: usize) -> Result<Self, BufferError> {
        Self::with_layout(initial_capacity, ElemLayout::erased(elem_size))
    }

    /// Allocate from a validated [`BufferConfig`].
    pub fn with_config(config: &BufferConfig) -> Result<Self, BufferError> {
        Self::with_layout(config.initial_capacity, config.elem_layout()?)
    }

    pub(crate) fn with_layout(capacity: usize, elem: ElemLayout) -> Result<Self, BufferError> {
        let alloc = Allocation::zeroed(array_layout(elem, capacity)?)?;
        Ok(Self {
            alloc,
            elem,
            capacity,
            len: 0,
        })
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the buffer holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of allocated slots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Size of one slot in bytes.
    pub fn elem_size(&self) -> usize {
        self.elem.size()
    }

    /// Slot layout fixed at construction.
    pub fn elem_layout(&self) -> ElemLayout {
        self.elem
    }

    /// Bytes held by the backing store (`capacity * elem_size`).
    pub fn memory_bytes(&self) -> usize {
        self.alloc.layout().size()
    }

    /// Grow the capacity to `floor(capacity * 3 / 2)`.
    ///
    /// Fails with [`BufferError::GrowthStalled`] when that does not
    /// increase the capacity (0 and 1) and with
    /// [`BufferError::CapacityOverflow`] when the multiplication overflows.
    pub fn grow(&mut self) -> Result<(), BufferError> {
        let target = self
            .capacity
            .checked_mul(3)
            .ok_or(BufferError::CapacityOverflow {
                capacity: self.capacity,
                elem_size: self.elem.size(),
            })?
            / 2;
        if target <= self.capacity {
            debug!("growth stalled at capacity {}", self.capacity);
            return Err(BufferError::GrowthStalled {
                capacity: self.capacity,
            });
        }
        self.resize(target)
    }

    /// Reallocate to exactly `new_capacity` slots.
    ///
    /// Shrinking below the length truncates the length; the slots below
    /// the new capacity keep their bytes. New slots are zeroed.
    pub fn resize(&mut self, new_capacity: usize) -> Result<(), BufferError> {
        let result =
            array_layout(self.elem, new_capacity).and_then(|layout| self.alloc.resize(layout));
        if let Err(error) = result {
            debug!(
                "resize from {} to {} slots failed: {}",
                self.capacity, new_capacity, error
            );
            return Err(error);
        }
        trace!(
            "resized buffer from {} to {} slots of {} bytes",
            self.capacity,
            new_capacity,
            self.elem.size()
        );
        self.capacity = new_capacity;
        self.len = self.len.min(new_capacity);
        Ok(())
    }

    /// Copy `element` into the next slot, growing first if full.
    ///
    /// Returns the stored slot. Aborts if `element.len() != elem_size`.
    pub fn push(&mut self, element: &[u8]) -> Result<&mut [u8], BufferError> {
        contract::validate_elem_size(self.elem.size(), element.len());
        let index = self.reserve_slot()?;
        self.len = index + 1;
        let slot = self.slot_bytes_mut(index);
        slot.copy_from_slice(element);
        Ok(slot)
    }

    /// Remove the last element and return an owned copy of it.
    ///
    /// `Ok(None)` when empty. The length only drops once the copy exists,
    /// so an allocation failure loses nothing.
    pub fn pop(&mut self) -> Result<Option<Box<[u8]>>, BufferError> {
        let Some(last) = self.len.checked_sub(1) else {
            return Ok(None);
        };
        let size = self.elem.size();
        let mut copy = Vec::new();
        copy.try_reserve_exact(size)
            .map_err(|_| BufferError::AllocationFailed { bytes: size })?;
        copy.extend_from_slice(self.slot_bytes(last));
        self.len = last;
        Ok(Some(copy.into_boxed_slice()))
    }

    /// The element at `index`. Aborts if `index >= len`.
    pub fn get(&self, index: usize) -> &[u8] {
        contract::validate_index(self.len, index);
        self.slot_bytes(index)
    }

    /// Mutable access to the element at `index`. Aborts if `index >= len`.
    pub fn get_mut(&mut self, index: usize) -> &mut [u8] {
        contract::validate_index(self.len, index);
        self.slot_bytes_mut(index)
    }

    /// Remove the element at `index`, shifting the tail left by one slot.
    ///
    /// Keeps order; costs O(len - index). See
    /// [`swap_remove`](Self::swap_remove) for the O(1) alternative.
    /// Aborts if `index >= len`.
    pub fn remove(&mut self, index: usize) {
        contract::validate_index(self.len, index);
        let size = self.elem.size();
        let last = self.len - 1;
        if index != last {
            self.alloc
                .copy_within((index + 1) * size, index * size, (last - index) * size);
        }
        self.len = last;
    }

    /// Remove the element at `index` by moving the last element into its
    /// slot. O(1); does not keep order. Aborts if `index >= len`.
    pub fn swap_remove(&mut self, index: usize) {
        contract::validate_index(self.len, index);
        let size = self.elem.size();
        let last = self.len - 1;
        if self.len >= 2 {
            self.alloc.copy_within(last * size, index * size, size);
        }
        self.len = last;
    }

    /// Drop every element, keeping the allocation.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Release the buffer and its backing store.
    pub fn free(self) {
        drop(self);
    }

    /// The bytes of slots `[0, len)`.
    pub fn as_bytes(&self) -> &[u8] {
        &self.all_bytes()[..self.len * self.elem.size()]
    }

    /// Hand the whole backing store (all `capacity` slots) to the caller.
    pub fn leak(self) -> LeakedBytes {
        let Self {
            alloc,
            elem,
            capacity,
            len,
        } = self;
        LeakedBytes::new(alloc, elem, len, capacity)
    }

    /// Turn a 1-byte-slot buffer into a zero-terminated byte string,
    /// reusing its allocation.
    ///
    /// The store is resized to exactly `len + 1` slots first; if that
    /// fails the untouched buffer comes back inside the error. Aborts if
    /// `elem_size != 1`.
    pub fn into_bytestring(mut self) -> Result<ByteString, ExportError<Self>> {
        self.require_byte_slots("into_bytestring");
        let len = self.len;
        let Some(terminated) = len.checked_add(1) else {
            let error = BufferError::CapacityOverflow {
                capacity: len,
                elem_size: 1,
            };
            return Err(ExportError::new(self, error));
        };
        if let Err(error) = self.resize(terminated) {
            return Err(ExportError::new(self, error));
        }
        // Shrinking keeps whatever byte sat in slot `len`.
        self.all_bytes_mut()[len] = 0;
        Ok(ByteString::new(self.alloc, len))
    }

    /// Copy the elements of a 1-byte-slot buffer into a new zero-terminated
    /// byte string, leaving the buffer as it was. Aborts if `elem_size != 1`.
    pub fn to_bytestring(&self) -> Result<ByteString, BufferError> {
        self.require_byte_slots("to_bytestring");
        let terminated = self.len.checked_add(1).ok_or(BufferError::CapacityOverflow {
            capacity: self.len,
            elem_size: 1,
        })?;
        let mut alloc = Allocation::zeroed(array_layout(self.elem, terminated)?)?;
        // SAFETY: a fresh zeroed block is fully initialized.
        #[allow(unsafe_code)]
        let target = unsafe { alloc.bytes_mut() };
        target[..self.len].copy_from_slice(self.as_bytes());
        Ok(ByteString::new(alloc, self.len))
    }

    /// Make sure slot `len` exists, growing if the buffer is full.
    pub(crate) fn reserve_slot(&mut self) -> Result<usize, BufferError> {
        if self.len == self.capacity {
            self.grow()?;
        }
        Ok(self.len)
    }

    pub(crate) fn set_len(&mut self, len: usize) {
        debug_assert!(len <= self.capacity);
        self.len = len;
    }

    /// Start of slot `index`. Only valid to dereference for `index < capacity`.
    pub(crate) fn slot_ptr(&self, index: usize) -> *mut u8 {
        self.alloc.slot_ptr(index * self.elem.size())
    }

    pub(crate) fn into_parts(self) -> (Allocation, usize, usize) {
        (self.alloc, self.len, self.capacity)
    }

    fn require_byte_slots(&self, op: &str) {
        if self.elem.size() != 1 {
            contract::violation(format_args!(
                "{op} needs 1-byte slots, buffer has {}-byte slots",
                self.elem.size()
            ));
        }
    }

    fn slot_range(&self, index: usize) -> Range<usize> {
        let size = self.elem.size();
        index * size..(index + 1) * size
    }

    fn slot_bytes(&self, index: usize) -> &[u8] {
        &self.all_bytes()[self.slot_range(index)]
    }

    fn slot_bytes_mut(&mut self, index: usize) -> &mut [u8] {
        let range = self.slot_range(index);
        &mut self.all_bytes_mut()[range]
    }

    #[allow(unsafe_code)]
    fn all_bytes(&self) -> &[u8] {
        // SAFETY: see the type-level docs; every byte is initialized.
        unsafe { self.alloc.bytes() }
    }

    #[allow(unsafe_code)]
    fn all_bytes_mut(&mut self) -> &mut [u8] {
        // SAFETY: as in `all_bytes`.
        unsafe { self.alloc.bytes_mut() }
    }
}

impl fmt::Debug for RawBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawBuffer")
            .field("elem_size", &self.elem.size())
            .field("len", &self.len)
            .field("capacity", &self.capacity)
            .finish()
    }
}

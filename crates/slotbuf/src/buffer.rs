//! Typed buffer over [`RawBuffer`].

use std::fmt;
use std::marker::PhantomData;
use std::slice;

use crate::config::{BufferConfig, ElemLayout};
use crate::contract;
use crate::erased::RawBuffer;
use crate::error::{BufferError, ExportError};
use crate::export::{ByteString, Leaked};

/// A growable array of `T`.
///
/// Same storage, growth and failure rules as [`RawBuffer`], with the slot
/// layout taken from `T`. `T: Copy` because the buffer never runs element
/// destructors: removing, clearing or truncating simply forgets slots.
///
/// References returned by [`push`](Self::push) and [`get`](Self::get)
/// borrow the buffer, so any reallocating or shifting call ends them.
pub struct Buffer<T: Copy> {
    raw: RawBuffer,
    _marker: PhantomData<T>,
}

impl<T: Copy> Buffer<T> {
    /// Allocate room for `initial_capacity` values.
    pub fn new(initial_capacity: usize) -> Result<Self, BufferError> {
        Ok(Self::from_raw(RawBuffer::with_layout(
            initial_capacity,
            ElemLayout::of::<T>(),
        )?))
    }

    /// Allocate with the config's initial capacity.
    ///
    /// Only `initial_capacity` is read. `elem_size` and `elem_align` are
    /// ignored; the slot layout always comes from `T`, so any config works
    /// here, including one built with [`BufferConfig::new`].
    pub fn with_config(config: &BufferConfig) -> Result<Self, BufferError> {
        Self::new(config.initial_capacity)
    }

    fn from_raw(raw: RawBuffer) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Whether the buffer holds no values.
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Number of allocated slots.
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }

    /// Size of one slot in bytes, `size_of::<T>()`.
    pub fn elem_size(&self) -> usize {
        self.raw.elem_size()
    }

    /// Slot layout, always [`ElemLayout::of::<T>()`](ElemLayout::of).
    pub fn elem_layout(&self) -> ElemLayout {
        self.raw.elem_layout()
    }

    /// Bytes held by the backing store.
    pub fn memory_bytes(&self) -> usize {
        self.raw.memory_bytes()
    }

    /// Grow the capacity to `floor(capacity * 3 / 2)`. See [`RawBuffer::grow`].
    pub fn grow(&mut self) -> Result<(), BufferError> {
        self.raw.grow()
    }

    /// Reallocate to exactly `new_capacity` slots, truncating the length if
    /// it no longer fits. See [`RawBuffer::resize`].
    pub fn resize(&mut self, new_capacity: usize) -> Result<(), BufferError> {
        self.raw.resize(new_capacity)
    }

    /// Append `value`, growing first if full.
    #[allow(unsafe_code)]
    pub fn push(&mut self, value: T) -> Result<&mut T, BufferError> {
        let index = self.raw.reserve_slot()?;
        let slot = self.raw.slot_ptr(index).cast::<T>();
        // SAFETY: reserve_slot guarantees index < capacity; the base is
        // aligned for T and slots are size_of::<T>() apart.
        unsafe { slot.write(value) };
        self.raw.set_len(index + 1);
        // SAFETY: the slot was just initialized and `&mut self` is held.
        Ok(unsafe { &mut *slot })
    }

    /// Remove and return the last value, or `None` if empty.
    #[allow(unsafe_code)]
    pub fn pop(&mut self) -> Option<T> {
        let last = self.len().checked_sub(1)?;
        // SAFETY: last < len, so the slot holds a value.
        let value = unsafe { self.raw.slot_ptr(last).cast::<T>().read() };
        self.raw.set_len(last);
        Some(value)
    }

    /// The value at `index`. Aborts if `index >= len`.
    #[allow(unsafe_code)]
    pub fn get(&self, index: usize) -> &T {
        contract::validate_index(self.len(), index);
        // SAFETY: index < len, so the slot holds a value.
        unsafe { &*self.raw.slot_ptr(index).cast::<T>() }
    }

    /// Mutable access to the value at `index`. Aborts if `index >= len`.
    #[allow(unsafe_code)]
    pub fn get_mut(&mut self, index: usize) -> &mut T {
        contract::validate_index(self.len(), index);
        // SAFETY: index < len and `&mut self` is held.
        unsafe { &mut *self.raw.slot_ptr(index).cast::<T>() }
    }

    /// Remove the value at `index`, keeping the order of the rest.
    /// O(len - index). Aborts if `index >= len`.
    pub fn remove(&mut self, index: usize) {
        self.raw.remove(index);
    }

    /// Remove the value at `index` by moving the last value into its slot.
    /// O(1). Aborts if `index >= len`.
    pub fn swap_remove(&mut self, index: usize) {
        self.raw.swap_remove(index);
    }

    /// Forget every value, keeping the allocation.
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Release the buffer and its backing store.
    pub fn free(self) {
        drop(self);
    }

    /// The values as a slice.
    #[allow(unsafe_code)]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: slots [0, len) hold values; the base is aligned for T.
        unsafe { slice::from_raw_parts(self.raw.slot_ptr(0).cast::<T>(), self.len()) }
    }

    /// The values as a mutable slice.
    #[allow(unsafe_code)]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: as in `as_slice`, and `&mut self` is held.
        unsafe { slice::from_raw_parts_mut(self.raw.slot_ptr(0).cast::<T>(), self.len()) }
    }

    /// Hand the whole backing store (all `capacity` slots) to the caller.
    pub fn leak(self) -> Leaked<T> {
        let (alloc, len, capacity) = self.raw.into_parts();
        Leaked::new(alloc, len, capacity)
    }
}

impl Buffer<u8> {
    /// Turn the buffer into a zero-terminated byte string, reusing its
    /// allocation. On failure the untouched buffer comes back inside the
    /// error.
    pub fn into_bytestring(self) -> Result<ByteString, ExportError<Self>> {
        self.raw
            .into_bytestring()
            .map_err(|e| e.map_buffer(Self::from_raw))
    }

    /// Copy the content into a new zero-terminated byte string.
    pub fn to_bytestring(&self) -> Result<ByteString, BufferError> {
        self.raw.to_bytestring()
    }
}

impl<T: Copy + fmt::Debug> fmt::Debug for Buffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("capacity", &self.capacity())
            .field("values", &self.as_slice())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq)]
    struct Sample {
        tag: u8,
        weight: f64,
    }

    fn sample(tag: u8) -> Sample {
        Sample {
            tag,
            weight: tag as f64 * 0.5,
        }
    }

    #[test]
    fn push_get_with_padded_type() {
        let mut buf = Buffer::new(2).unwrap();
        for tag in 0..10 {
            buf.push(sample(tag)).unwrap();
        }
        assert_eq!(buf.len(), 10);
        for tag in 0..10 {
            assert_eq!(*buf.get(tag as usize), sample(tag));
        }
        assert_eq!(buf.memory_bytes(), buf.capacity() * std::mem::size_of::<Sample>());
    }

    #[test]
    fn push_returns_stored_slot() {
        let mut buf = Buffer::<u32>::new(4).unwrap();
        *buf.push(1).unwrap() += 10;
        assert_eq!(buf.as_slice(), &[11]);
    }

    #[test]
    fn push_copy_of_own_element() {
        let mut buf = Buffer::<u64>::new(2).unwrap();
        buf.push(5).unwrap();
        buf.push(6).unwrap();
        let first = *buf.get(0);
        buf.push(first).unwrap();
        assert_eq!(buf.as_slice(), &[5, 6, 5]);
    }

    #[test]
    fn pop_round_trip_and_empty() {
        let mut buf = Buffer::new(2).unwrap();
        buf.push(sample(3)).unwrap();
        assert_eq!(buf.pop(), Some(sample(3)));
        assert_eq!(buf.pop(), None);
        assert_eq!(buf.len(), 0);
    }

    #[test]
    fn remove_and_swap_remove() {
        let mut buf = Buffer::<i32>::new(8).unwrap();
        for v in 1..=6 {
            buf.push(v).unwrap();
        }
        buf.remove(2);
        assert_eq!(buf.as_slice(), &[1, 2, 4, 5, 6]);
        buf.swap_remove(0);
        assert_eq!(buf.as_slice(), &[6, 2, 4, 5]);
        buf.swap_remove(3);
        assert_eq!(buf.as_slice(), &[6, 2, 4]);
    }

    #[test]
    fn get_mut_and_slices() {
        let mut buf = Buffer::<u16>::new(4).unwrap();
        buf.push(1).unwrap();
        buf.push(2).unwrap();
        *buf.get_mut(1) = 20;
        buf.as_mut_slice()[0] = 10;
        assert_eq!(buf.as_slice(), &[10, 20]);
    }

    #[test]
    fn resize_truncates_and_clear_keeps_capacity() {
        let mut buf = Buffer::<u8>::new(4).unwrap();
        for b in b"wxyz" {
            buf.push(*b).unwrap();
        }
        buf.resize(2).unwrap();
        assert_eq!(buf.as_slice(), b"wx");
        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.capacity(), 2);
    }

    #[test]
    fn with_config_takes_layout_from_type() {
        let config = BufferConfig::new(3).with_initial_capacity(5);
        let buf = Buffer::<u64>::with_config(&config).unwrap();
        assert_eq!(buf.capacity(), 5);
        assert_eq!(buf.elem_size(), 8);
        assert_eq!(buf.elem_layout(), ElemLayout::of::<u64>());
        assert_eq!(buf.memory_bytes(), 40);

        let padded = Buffer::<Sample>::with_config(&BufferConfig::for_type::<Sample>()).unwrap();
        assert_eq!(padded.elem_size(), std::mem::size_of::<Sample>());
        assert_eq!(padded.elem_layout().align(), std::mem::align_of::<Sample>());
    }

    #[test]
    fn zero_sized_values() {
        let mut buf = Buffer::<()>::new(4).unwrap();
        buf.push(()).unwrap();
        buf.push(()).unwrap();
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.memory_bytes(), 0);
        buf.grow().unwrap();
        assert_eq!(buf.capacity(), 6);
        assert_eq!(buf.pop(), Some(()));
    }

    #[test]
    fn leak_exposes_capacity_slots() {
        let mut buf = Buffer::<u32>::new(3).unwrap();
        buf.push(7).unwrap();
        buf.push(8).unwrap();
        buf.grow().unwrap();
        let leaked = buf.leak();
        assert_eq!(leaked.as_slice(), &[7, 8]);
        assert_eq!(leaked.as_uninit_slice().len(), 4);
        assert_eq!(leaked.capacity(), 4);
    }

    #[test]
    fn leak_raw_round_trip() {
        let mut buf = Buffer::<u64>::new(2).unwrap();
        buf.push(42).unwrap();
        let (ptr, len, capacity) = buf.leak().into_raw_parts();
        // SAFETY: reading the one value pushed before leaking.
        #[allow(unsafe_code)]
        let first = unsafe { ptr.as_ptr().read() };
        assert_eq!(first, 42);
        // SAFETY: parts straight from into_raw_parts.
        #[allow(unsafe_code)]
        let back = unsafe { Leaked::from_raw_parts(ptr, len, capacity) };
        assert_eq!(back.as_slice(), &[42]);
    }

    #[test]
    fn bytestrings_from_typed_bytes() {
        let mut buf = Buffer::<u8>::new(3).unwrap();
        for b in b"abc" {
            buf.push(*b).unwrap();
        }
        let copy = buf.to_bytestring().unwrap();
        assert_eq!(buf.as_slice(), b"abc");
        let owned = buf.into_bytestring().unwrap();
        assert_eq!(owned.as_bytes_with_nul(), b"abc\0");
        assert_eq!(copy, owned);
    }

    #[test]
    fn debug_lists_values() {
        let mut buf = Buffer::<u8>::new(2).unwrap();
        buf.push(1).unwrap();
        assert_eq!(format!("{buf:?}"), "Buffer { capacity: 2, values: [1] }");
    }
}

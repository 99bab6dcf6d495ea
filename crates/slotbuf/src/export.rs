//! Owned exports of a buffer's backing store.
//!
//! Each type here takes over an allocation from a consumed buffer and
//! frees it on drop, unless the caller takes the raw parts with
//! `into_raw_parts`, in which case the caller owns the memory.

use std::alloc::Layout;
use std::ffi::CStr;
use std::fmt;
use std::marker::PhantomData;
use std::mem::{self, MaybeUninit};
use std::ptr::NonNull;
use std::slice;

use crate::config::ElemLayout;
use crate::raw::Allocation;

/// The full backing store of a [`RawBuffer`](crate::RawBuffer), from
/// [`RawBuffer::leak`](crate::RawBuffer::leak).
///
/// Covers all `capacity` slots, not just the `len` that held elements.
pub struct LeakedBytes {
    alloc: Allocation,
    elem: ElemLayout,
    len: usize,
    capacity: usize,
}

impl LeakedBytes {
    pub(crate) fn new(alloc: Allocation, elem: ElemLayout, len: usize, capacity: usize) -> Self {
        Self {
            alloc,
            elem,
            len,
            capacity,
        }
    }

    /// Number of slots that held elements when the buffer was leaked.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no slot held an element.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots in the store.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Size of one slot in bytes.
    pub fn elem_size(&self) -> usize {
        self.elem.size()
    }

    /// All `capacity * elem_size` bytes.
    #[allow(unsafe_code)]
    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: RawBuffer keeps every byte initialized.
        unsafe { self.alloc.bytes() }
    }

    /// Mutable view of all `capacity * elem_size` bytes.
    #[allow(unsafe_code)]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        // SAFETY: as in `as_bytes`.
        unsafe { self.alloc.bytes_mut() }
    }

    /// The bytes of the first `len` slots.
    pub fn live_bytes(&self) -> &[u8] {
        &self.as_bytes()[..self.len * self.elem.size()]
    }

    /// Release ownership of the store. Returns the base pointer and the
    /// capacity in slots.
    pub fn into_raw_parts(self) -> (NonNull<u8>, usize) {
        let (ptr, _) = self.alloc.into_raw();
        (ptr, self.capacity)
    }

    /// Reclaim a store released by [`into_raw_parts`](Self::into_raw_parts).
    ///
    /// # Safety
    ///
    /// `ptr` and `capacity` must come from `into_raw_parts` on a
    /// `LeakedBytes` with slot layout `elem`, the store must not have been
    /// reclaimed already, and `len <= capacity`.
    #[allow(unsafe_code)]
    pub unsafe fn from_raw_parts(
        ptr: NonNull<u8>,
        len: usize,
        capacity: usize,
        elem: ElemLayout,
    ) -> Self {
        // SAFETY: the same size and alignment produced a valid Layout when
        // the store was allocated.
        let layout = unsafe { Layout::from_size_align_unchecked(elem.size() * capacity, elem.align()) };
        Self {
            // SAFETY: forwarded from the caller.
            alloc: unsafe { Allocation::from_raw(ptr, layout) },
            elem,
            len,
            capacity,
        }
    }
}

impl fmt::Debug for LeakedBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeakedBytes")
            .field("elem_size", &self.elem.size())
            .field("len", &self.len)
            .field("capacity", &self.capacity)
            .finish()
    }
}

/// The full backing store of a [`Buffer<T>`](crate::Buffer), from
/// [`Buffer::leak`](crate::Buffer::leak).
///
/// The first `len` slots hold values; the remaining `capacity - len`
/// slots are exposed as [`MaybeUninit<T>`].
pub struct Leaked<T> {
    alloc: Allocation,
    len: usize,
    capacity: usize,
    _marker: PhantomData<T>,
}

impl<T: Copy> Leaked<T> {
    pub(crate) fn new(alloc: Allocation, len: usize, capacity: usize) -> Self {
        Self {
            alloc,
            len,
            capacity,
            _marker: PhantomData,
        }
    }

    /// Number of slots holding values.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no slot holds a value.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots in the store.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The values that were in the buffer.
    #[allow(unsafe_code)]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: the first `len` slots were written by `Buffer::push`, the
        // base is aligned for T.
        unsafe { slice::from_raw_parts(self.alloc.as_ptr().cast::<T>(), self.len) }
    }

    /// Every slot of the store.
    #[allow(unsafe_code)]
    pub fn as_uninit_slice(&self) -> &[MaybeUninit<T>] {
        // SAFETY: the store holds `capacity` slots of T; MaybeUninit makes
        // no claim about their contents.
        unsafe { slice::from_raw_parts(self.alloc.as_ptr().cast::<MaybeUninit<T>>(), self.capacity) }
    }

    /// Release ownership of the store as `(ptr, len, capacity)`.
    pub fn into_raw_parts(self) -> (NonNull<T>, usize, usize) {
        let (ptr, _) = self.alloc.into_raw();
        (ptr.cast::<T>(), self.len, self.capacity)
    }

    /// Reclaim a store released by [`into_raw_parts`](Self::into_raw_parts).
    ///
    /// # Safety
    ///
    /// The parts must come from `into_raw_parts` on a `Leaked<T>` of the
    /// same `T`, and the store must not have been reclaimed already.
    #[allow(unsafe_code)]
    pub unsafe fn from_raw_parts(ptr: NonNull<T>, len: usize, capacity: usize) -> Self {
        // SAFETY: the same size and alignment produced a valid Layout when
        // the store was allocated.
        let layout = unsafe {
            Layout::from_size_align_unchecked(mem::size_of::<T>() * capacity, mem::align_of::<T>())
        };
        // SAFETY: forwarded from the caller.
        let alloc = unsafe { Allocation::from_raw(ptr.cast::<u8>(), layout) };
        Self::new(alloc, len, capacity)
    }
}

impl<T: Copy + fmt::Debug> fmt::Debug for Leaked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Leaked")
            .field("capacity", &self.capacity)
            .field("values", &self.as_slice())
            .finish()
    }
}

/// An owned, zero-terminated byte string.
///
/// Produced by `into_bytestring` (reusing the buffer's store) and
/// `to_bytestring` (a fresh copy). The content may itself contain zero
/// bytes; [`len`](Self::len) counts everything before the final
/// terminator.
pub struct ByteString {
    alloc: Allocation,
    len: usize,
}

impl ByteString {
    pub(crate) fn new(alloc: Allocation, len: usize) -> Self {
        debug_assert_eq!(alloc.layout().size(), len + 1);
        Self { alloc, len }
    }

    /// Number of bytes, excluding the terminator.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether only the terminator is present.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The content without the terminator.
    pub fn as_bytes(&self) -> &[u8] {
        &self.as_bytes_with_nul()[..self.len]
    }

    /// The content including the terminator.
    #[allow(unsafe_code)]
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        // SAFETY: built from a fully initialized byte store.
        unsafe { self.alloc.bytes() }
    }

    /// The content up to the first zero byte, as a C string.
    pub fn to_c_str(&self) -> &CStr {
        CStr::from_bytes_until_nul(self.as_bytes_with_nul()).unwrap_or(c"")
    }

    /// Release ownership as `(ptr, len)`; the store is `len + 1` bytes.
    pub fn into_raw_parts(self) -> (NonNull<u8>, usize) {
        let (ptr, _) = self.alloc.into_raw();
        (ptr, self.len)
    }

    /// Reclaim a string released by [`into_raw_parts`](Self::into_raw_parts).
    ///
    /// # Safety
    ///
    /// `ptr` and `len` must come from `into_raw_parts` on a `ByteString`
    /// whose store was aligned to `align`, and it must not have been
    /// reclaimed already.
    #[allow(unsafe_code)]
    pub unsafe fn from_raw_parts(ptr: NonNull<u8>, len: usize, align: usize) -> Self {
        // SAFETY: the same size and alignment produced a valid Layout when
        // the string was allocated.
        let layout = unsafe { Layout::from_size_align_unchecked(len + 1, align) };
        Self {
            // SAFETY: forwarded from the caller.
            alloc: unsafe { Allocation::from_raw(ptr, layout) },
            len,
        }
    }
}

impl AsRef<[u8]> for ByteString {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl PartialEq for ByteString {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes_with_nul() == other.as_bytes_with_nul()
    }
}

impl Eq for ByteString {}

impl fmt::Debug for ByteString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.as_bytes().escape_ascii())
    }
}

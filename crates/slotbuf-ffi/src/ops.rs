//! Per-element buffer FFI: grow, resize, push, pop, get, remove, clear.
//!
//! Every function here aborts if `buf` is NULL.

use std::ffi::c_void;
use std::ptr;
use std::slice;

use log::debug;

use crate::handle::{buffer_mut, buffer_ref, SlotBuf};

/// Grow the capacity by a factor of 3/2. Returns `false` (buffer
/// unchanged) if that does not increase the capacity or memory runs out.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn slotbuf_grow(buf: *mut SlotBuf) -> bool {
    buffer_mut(buf, "slotbuf_grow").grow().is_ok()
}

/// Reallocate to exactly `num_elements` slots, truncating the length if
/// needed. Returns `false` (buffer unchanged) on failure.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn slotbuf_resize(buf: *mut SlotBuf, num_elements: usize) -> bool {
    buffer_mut(buf, "slotbuf_resize").resize(num_elements).is_ok()
}

/// Copy `elem_size` bytes from `element` into a new slot at the end,
/// growing if full. Returns a pointer to the stored slot (valid until the
/// next call that mutates the buffer), or NULL on failure.
///
/// `element` may point into this same buffer. Aborts if it is NULL.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn slotbuf_push(buf: *mut SlotBuf, element: *const c_void) -> *mut c_void {
    let size = buffer_ref(buf, "slotbuf_push").elem_size();
    if element.is_null() {
        slotbuf::contract::violation(format_args!("slotbuf_push called with a NULL element"));
    }
    // Stage the element first: it may live inside the store that growth
    // is about to move.
    let mut staged = Vec::new();
    if staged.try_reserve_exact(size).is_err() {
        return ptr::null_mut();
    }
    // SAFETY: element points to elem_size readable bytes per caller contract.
    staged.extend_from_slice(unsafe { slice::from_raw_parts(element.cast::<u8>(), size) });

    match buffer_mut(buf, "slotbuf_push").push(&staged) {
        Ok(slot) => slot.as_mut_ptr().cast(),
        Err(e) => {
            debug!("slotbuf_push failed: {e}");
            ptr::null_mut()
        }
    }
}

/// Remove the last element, copying its bytes to `out` when `out` is
/// non-NULL. Returns `false` if the buffer was empty or the copy could not
/// be allocated; in both cases the length is unchanged.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn slotbuf_pop(buf: *mut SlotBuf, out: *mut c_void) -> bool {
    match buffer_mut(buf, "slotbuf_pop").pop() {
        Ok(Some(element)) => {
            if !out.is_null() {
                // SAFETY: out has room for elem_size bytes per caller
                // contract; `element` is a private copy, so no overlap.
                unsafe {
                    ptr::copy_nonoverlapping(element.as_ptr(), out.cast::<u8>(), element.len())
                };
            }
            true
        }
        Ok(None) => false,
        Err(e) => {
            debug!("slotbuf_pop failed: {e}");
            false
        }
    }
}

/// Pointer to the element at `index`, valid until the next call that
/// mutates the buffer. Aborts if `index >= len`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn slotbuf_get(buf: *mut SlotBuf, index: usize) -> *mut c_void {
    buffer_mut(buf, "slotbuf_get")
        .get_mut(index)
        .as_mut_ptr()
        .cast()
}

/// Remove the element at `index`, keeping order. Aborts if `index >= len`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn slotbuf_remove(buf: *mut SlotBuf, index: usize) {
    buffer_mut(buf, "slotbuf_remove").remove(index);
}

/// Remove the element at `index` by moving the last element into its
/// slot. Aborts if `index >= len`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn slotbuf_swap_remove(buf: *mut SlotBuf, index: usize) {
    buffer_mut(buf, "slotbuf_swap_remove").swap_remove(index);
}

/// Set the length to zero, keeping the allocation.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn slotbuf_clear(buf: *mut SlotBuf) {
    buffer_mut(buf, "slotbuf_clear").clear();
}

/// Number of elements.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn slotbuf_len(buf: *const SlotBuf) -> usize {
    buffer_ref(buf, "slotbuf_len").len()
}

/// Number of allocated slots.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn slotbuf_capacity(buf: *const SlotBuf) -> usize {
    buffer_ref(buf, "slotbuf_capacity").capacity()
}

/// Size of one element in bytes.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn slotbuf_elem_size(buf: *const SlotBuf) -> usize {
    buffer_ref(buf, "slotbuf_elem_size").elem_size()
}

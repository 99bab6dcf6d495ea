//! Buffer lifecycle FFI: init, free, leak, and byte-string conversion.

use std::ffi::{c_char, c_void};
use std::ptr::{self, NonNull};

use log::debug;
use slotbuf::{ByteString, ElemLayout, LeakedBytes, RawBuffer};

use crate::handle::{buffer_ref, consume, into_handle, is_null, SlotBuf};

/// Create a buffer with room for `init_capacity` zeroed elements of
/// `elem_size` bytes.
///
/// Returns NULL if the size computation overflows or memory runs out.
/// Release with `slotbuf_free`, `slotbuf_leak` or `slotbuf_to_str`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn slotbuf_init(init_capacity: usize, elem_size: usize) -> *mut SlotBuf {
    let raw = match RawBuffer::allocate(init_capacity, elem_size) {
        Ok(raw) => raw,
        Err(e) => {
            debug!("slotbuf_init({init_capacity}, {elem_size}) failed: {e}");
            return ptr::null_mut();
        }
    };
    into_handle(raw).unwrap_or(ptr::null_mut())
}

/// Destroy a buffer and set `*buf` to NULL.
///
/// A NULL `buf` or `*buf` is a no-op.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn slotbuf_free(buf: *mut *mut SlotBuf) {
    if is_null(buf) {
        return;
    }
    consume(buf, "slotbuf_free", |raw| {
        raw.free();
        Ok::<_, RawBuffer>(())
    });
}

/// Destroy the control block and return the backing store untouched,
/// `capacity` elements long (not truncated to the length). Sets `*buf`
/// to NULL and, if `capacity_out` is non-NULL, writes the capacity there.
///
/// Release the store with `slotbuf_raw_free`. Aborts if `buf` or `*buf`
/// is NULL.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn slotbuf_leak(buf: *mut *mut SlotBuf, capacity_out: *mut usize) -> *mut c_void {
    let leaked = consume(buf, "slotbuf_leak", |raw| Ok::<_, RawBuffer>(raw.leak()));
    let Some(leaked) = leaked else {
        return ptr::null_mut();
    };
    let (store, capacity) = leaked.into_raw_parts();
    if !capacity_out.is_null() {
        // SAFETY: capacity_out is valid per caller contract.
        unsafe { *capacity_out = capacity };
    }
    store.as_ptr().cast()
}

/// Release a store returned by `slotbuf_leak`.
///
/// `capacity` and `elem_size` must be the values the store was leaked
/// with. NULL is a no-op.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn slotbuf_raw_free(store: *mut c_void, capacity: usize, elem_size: usize) {
    let Some(store) = NonNull::new(store.cast::<u8>()) else {
        return;
    };
    // SAFETY: the store came from slotbuf_leak with this capacity and an
    // erased slot layout, per caller contract.
    drop(unsafe { LeakedBytes::from_raw_parts(store, 0, capacity, ElemLayout::erased(elem_size)) });
}

/// Turn a 1-byte-element buffer into a NUL-terminated string, reusing its
/// store. On success `*buf` becomes NULL and, if `len_out` is non-NULL,
/// the length (without terminator) is written there.
///
/// Returns NULL and leaves `*buf` valid if growing by the terminator
/// fails. Aborts if `buf` or `*buf` is NULL or the elements are wider
/// than one byte. Release with `slotbuf_str_free`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn slotbuf_to_str(buf: *mut *mut SlotBuf, len_out: *mut usize) -> *mut c_char {
    let converted = consume(buf, "slotbuf_to_str", |raw| {
        raw.into_bytestring().map_err(|e| {
            debug!("slotbuf_to_str failed: {}", e.error());
            e.into_buffer()
        })
    });
    match converted {
        Some(s) => release_str(s, len_out),
        None => ptr::null_mut(),
    }
}

/// Copy a 1-byte-element buffer into a new NUL-terminated string, leaving
/// the buffer unchanged.
///
/// Returns NULL if `buf` is NULL or memory runs out. Aborts if the
/// elements are wider than one byte. Release with `slotbuf_str_free`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn slotbuf_clone_str(buf: *const SlotBuf, len_out: *mut usize) -> *mut c_char {
    if buf.is_null() {
        return ptr::null_mut();
    }
    match buffer_ref(buf, "slotbuf_clone_str").to_bytestring() {
        Ok(s) => release_str(s, len_out),
        Err(e) => {
            debug!("slotbuf_clone_str failed: {e}");
            ptr::null_mut()
        }
    }
}

/// Release a string returned by `slotbuf_to_str` or `slotbuf_clone_str`.
///
/// `len` must be the length reported at creation (without terminator).
/// NULL is a no-op.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn slotbuf_str_free(s: *mut c_char, len: usize) {
    let Some(s) = NonNull::new(s.cast::<u8>()) else {
        return;
    };
    // SAFETY: every FFI string comes from an erased buffer layout, so its
    // store is MAX_ALIGN-aligned and len + 1 bytes long.
    drop(unsafe { ByteString::from_raw_parts(s, len, ElemLayout::MAX_ALIGN) });
}

#[allow(unsafe_code)]
fn release_str(s: ByteString, len_out: *mut usize) -> *mut c_char {
    let (ptr, len) = s.into_raw_parts();
    if !len_out.is_null() {
        // SAFETY: len_out is valid per caller contract.
        unsafe { *len_out = len };
    }
    ptr.as_ptr().cast()
}

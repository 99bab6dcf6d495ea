//! Opaque buffer handles and the NULL-handle contract.
//!
//! A `SlotBuf*` is a heap-allocated control block owning a [`RawBuffer`].
//! Consuming operations move the buffer out of the control block, free the
//! block and write NULL through the caller's `SlotBuf**`, so a stale handle
//! is visibly dead. If the consuming operation fails, the buffer goes back
//! into the block and the handle stays valid.

use std::alloc::{self, Layout};
use std::mem::MaybeUninit;
use std::ptr;

use slotbuf::contract;
use slotbuf::RawBuffer;

/// Opaque buffer handle for C callers.
pub struct SlotBuf {
    inner: RawBuffer,
}

/// Box a buffer without aborting on allocation failure.
///
/// If the control block cannot be allocated the buffer is dropped, so
/// nothing leaks on the failure path.
#[allow(unsafe_code)]
pub(crate) fn into_handle(inner: RawBuffer) -> Option<*mut SlotBuf> {
    let layout = Layout::new::<SlotBuf>();
    // SAFETY: SlotBuf is not zero-sized.
    let block = unsafe { alloc::alloc(layout) }.cast::<SlotBuf>();
    if block.is_null() {
        return None;
    }
    // SAFETY: block is a fresh allocation with SlotBuf's layout.
    unsafe { block.write(SlotBuf { inner }) };
    Some(block)
}

/// Borrow the buffer behind a non-NULL handle; abort on NULL.
#[allow(unsafe_code)]
pub(crate) fn buffer_ref<'a>(buf: *const SlotBuf, op: &str) -> &'a RawBuffer {
    // SAFETY: a non-NULL handle came from slotbuf_init and is live per
    // caller contract.
    match unsafe { buf.as_ref() } {
        Some(slot) => &slot.inner,
        None => null_handle(op),
    }
}

/// Mutably borrow the buffer behind a non-NULL handle; abort on NULL.
#[allow(unsafe_code)]
pub(crate) fn buffer_mut<'a>(buf: *mut SlotBuf, op: &str) -> &'a mut RawBuffer {
    // SAFETY: as in `buffer_ref`; the caller guarantees exclusive access.
    match unsafe { buf.as_mut() } {
        Some(slot) => &mut slot.inner,
        None => null_handle(op),
    }
}

/// Whether `handle` or `*handle` is NULL.
#[allow(unsafe_code)]
pub(crate) fn is_null(handle: *mut *mut SlotBuf) -> bool {
    // SAFETY: a non-NULL outer pointer is readable per caller contract.
    handle.is_null() || unsafe { (*handle).is_null() }
}

/// Move the buffer out of `*handle` and hand it to `f`.
///
/// `Ok` frees the control block and nulls `*handle`. `Err(buffer)` puts
/// the buffer back and leaves the handle untouched. Aborts if either
/// pointer is NULL.
#[allow(unsafe_code)]
pub(crate) fn consume<R>(
    handle: *mut *mut SlotBuf,
    op: &str,
    f: impl FnOnce(RawBuffer) -> Result<R, RawBuffer>,
) -> Option<R> {
    if is_null(handle) {
        null_handle(op);
    }
    // SAFETY: checked non-NULL above.
    let block = unsafe { *handle };
    // SAFETY: block is a live control block; the bitwise move leaves it
    // logically uninitialized until it is either refilled or freed.
    let inner = unsafe { ptr::read(ptr::addr_of!((*block).inner)) };
    match f(inner) {
        Ok(value) => {
            // SAFETY: block came from `into_handle` (global allocator,
            // SlotBuf layout); MaybeUninit skips the moved-out field.
            drop(unsafe { Box::from_raw(block.cast::<MaybeUninit<SlotBuf>>()) });
            // SAFETY: handle is non-NULL and writable per caller contract.
            unsafe { *handle = ptr::null_mut() };
            Some(value)
        }
        Err(inner) => {
            // SAFETY: refills the field moved out above.
            unsafe { ptr::write(ptr::addr_of_mut!((*block).inner), inner) };
            None
        }
    }
}

fn null_handle(op: &str) -> ! {
    contract::violation(format_args!("{op} called with a NULL buffer"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consume_ok_nulls_handle() {
        let mut handle = into_handle(RawBuffer::allocate(4, 2).unwrap()).unwrap();
        let cap = consume(&mut handle, "test", |raw| Ok::<_, RawBuffer>(raw.capacity()));
        assert_eq!(cap, Some(4));
        assert!(handle.is_null());
    }

    #[test]
    fn consume_err_restores_buffer() {
        let mut handle = into_handle(RawBuffer::allocate(4, 2).unwrap()).unwrap();
        let before = handle;
        let out: Option<()> = consume(&mut handle, "test", |mut raw| {
            raw.push(&[1, 2]).unwrap();
            Err(raw)
        });
        assert!(out.is_none());
        assert_eq!(handle, before);
        assert_eq!(buffer_ref(handle, "test").get(0), &[1, 2]);
        consume(&mut handle, "test", |raw| {
            raw.free();
            Ok::<_, RawBuffer>(())
        });
    }
}

//! Byte-string conversion when the allocator refuses to grow the store.

use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;

use slotbuf::{Buffer, BufferError, RawBuffer};
use slotbuf_test_utils::byte_buffer;

/// Forwards to `System`, except that `realloc` returns NULL while the
/// current thread is inside [`refusing_realloc`].
struct RefusingAllocator;

thread_local! {
    static REFUSE_REALLOC: Cell<bool> = const { Cell::new(false) };
}

unsafe impl GlobalAlloc for RefusingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        unsafe { System.alloc(layout) }
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        unsafe { System.alloc_zeroed(layout) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) }
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        if REFUSE_REALLOC.with(Cell::get) {
            return std::ptr::null_mut();
        }
        unsafe { System.realloc(ptr, layout, new_size) }
    }
}

#[global_allocator]
static GLOBAL: RefusingAllocator = RefusingAllocator;

struct RefuseGuard;

impl Drop for RefuseGuard {
    fn drop(&mut self) {
        REFUSE_REALLOC.with(|r| r.set(false));
    }
}

fn refusing_realloc<R>(f: impl FnOnce() -> R) -> R {
    REFUSE_REALLOC.with(|r| r.set(true));
    let _guard = RefuseGuard;
    f()
}

#[test]
fn raw_into_bytestring_failure_returns_buffer() {
    let buf = byte_buffer(b"abc");
    assert_eq!(buf.capacity(), 3);

    let err = match refusing_realloc(|| buf.into_bytestring()) {
        Ok(s) => panic!("conversion should fail, got {s:?}"),
        Err(err) => err,
    };
    assert_eq!(*err.error(), BufferError::AllocationFailed { bytes: 4 });

    let buf: RawBuffer = err.into_buffer();
    assert_eq!(buf.len(), 3);
    assert_eq!(buf.capacity(), 3);
    assert_eq!(buf.as_bytes(), b"abc");

    let s = buf.into_bytestring().unwrap();
    assert_eq!(s.as_bytes_with_nul(), b"abc\0");
}

#[test]
fn typed_into_bytestring_failure_returns_buffer() {
    let mut buf = Buffer::<u8>::new(2).unwrap();
    buf.push(b'x').unwrap();
    buf.push(b'y').unwrap();

    let err = match refusing_realloc(|| buf.into_bytestring()) {
        Ok(s) => panic!("conversion should fail, got {s:?}"),
        Err(err) => err,
    };
    assert!(matches!(err.error(), BufferError::AllocationFailed { .. }));

    let mut buf = err.into_buffer();
    assert_eq!(buf.as_slice(), b"xy");
    assert_eq!(buf.capacity(), 2);
    buf.push(b'z').unwrap();
    assert_eq!(buf.into_bytestring().unwrap().as_bytes(), b"xyz");
}

#[test]
fn refused_growth_keeps_contents() {
    let mut buf = byte_buffer(b"ab");
    let err = refusing_realloc(|| buf.push(b"c").map(|_| ())).unwrap_err();
    assert!(matches!(err, BufferError::AllocationFailed { .. }));
    assert_eq!(buf.len(), 2);
    assert_eq!(buf.capacity(), 2);
    assert_eq!(buf.as_bytes(), b"ab");
}

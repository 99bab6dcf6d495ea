//! C FFI bindings for slotbuf.
//!
//! Exposes the type-erased [`RawBuffer`](slotbuf::RawBuffer) with the
//! classic C calling convention: the element size is a runtime argument,
//! elements travel as `void*`, and the three exit operations
//! (`slotbuf_free`, `slotbuf_leak`, `slotbuf_to_str`) take a `SlotBuf**`
//! and null the caller's handle on success.
//!
//! A NULL buffer passed where one is required aborts the process with a
//! diagnostic, exactly like an out-of-bounds index. Only `slotbuf_free`
//! and `slotbuf_clone_str` tolerate NULL.
//!
//! Memory handed to C (`slotbuf_leak`, `slotbuf_to_str`,
//! `slotbuf_clone_str`) comes from the Rust global allocator and must be
//! returned through `slotbuf_raw_free` / `slotbuf_str_free`, not `free()`.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod export;
pub mod handle;
pub mod ops;

pub use handle::SlotBuf;

//! Growable contiguous buffer with checked growth and explicit ownership
//! export.
//!
//! Two flavours share one storage engine:
//!
//! - [`Buffer<T>`]: typed, for any `T: Copy`.
//! - [`RawBuffer`]: type-erased, slot size chosen at runtime. This is what
//!   the C bindings wrap.
//!
//! # Failure classes
//!
//! - **Resource exhaustion** (allocator refusal, size overflow, stalled
//!   growth) is a [`BufferError`]. The buffer is unchanged and usable.
//! - **Contract violations** (index out of bounds, wrong element size)
//!   print a diagnostic and abort the process. See [`contract`].
//! - Popping an empty buffer is neither: it returns `None`.
//!
//! # Ownership export
//!
//! `free`, `leak` and `into_bytestring` consume the buffer, so the old
//! handle cannot be used afterwards. `leak` hands over all `capacity`
//! slots; the byte-string conversions append a zero terminator.
//!
//! ```
//! use slotbuf::Buffer;
//!
//! let mut buf = Buffer::<u8>::new(2).unwrap();
//! for b in b"abc" {
//!     buf.push(*b).unwrap();
//! }
//! assert_eq!(buf.capacity(), 3);
//! let s = buf.into_bytestring().unwrap();
//! assert_eq!(s.as_bytes_with_nul(), b"abc\0");
//! ```
//!
//! All `unsafe` allocator access lives in the private `raw` module; the
//! typed views in `buffer` and `export` carry their own `// SAFETY:`
//! comments.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod buffer;
pub mod config;
pub mod contract;
pub mod erased;
pub mod error;
pub mod export;
mod raw;

// Public re-exports for the primary API surface.
pub use buffer::Buffer;
pub use config::{BufferConfig, ElemLayout};
pub use erased::RawBuffer;
pub use error::{BufferError, ExportError};
pub use export::{ByteString, Leaked, LeakedBytes};

//! Test utilities for slotbuf development.
//!
//! - [`death`]: run a closure in a child copy of the test binary and
//!   assert that it aborts.
//! - [`fixtures`]: prefilled buffers and a padded element type.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod death;
pub mod fixtures;

pub use death::assert_aborts;
pub use fixtures::{byte_buffer, counting_buffer, u32_raw_buffer, u32_values, Particle};

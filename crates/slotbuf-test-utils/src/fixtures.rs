//! Reusable buffer fixtures.

use slotbuf::{Buffer, RawBuffer};

/// An element type with interior padding (1-byte tag, 8-byte payload).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub tag: u8,
    pub mass: f64,
}

impl Particle {
    pub fn new(tag: u8) -> Self {
        Self {
            tag,
            mass: f64::from(tag) * 1.5,
        }
    }
}

/// A 1-byte-slot buffer holding `content`, with capacity `content.len()`
/// (at least 2, so it can grow).
pub fn byte_buffer(content: &[u8]) -> RawBuffer {
    let mut buf = RawBuffer::allocate(content.len().max(2), 1).expect("allocate byte buffer");
    for b in content {
        buf.push(&[*b]).expect("push byte");
    }
    buf
}

/// A 4-byte-slot buffer holding `values` as little-endian `u32`s.
pub fn u32_raw_buffer(values: &[u32]) -> RawBuffer {
    let mut buf = RawBuffer::allocate(4, 4).expect("allocate u32 buffer");
    for v in values {
        buf.push(&v.to_le_bytes()).expect("push u32");
    }
    buf
}

/// Decode the live slots of a 4-byte-slot buffer.
pub fn u32_values(buf: &RawBuffer) -> Vec<u32> {
    buf.as_bytes()
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

/// A typed buffer holding `0..n`.
pub fn counting_buffer(n: u32) -> Buffer<u32> {
    let mut buf = Buffer::new(2).expect("allocate counting buffer");
    for v in 0..n {
        buf.push(v).expect("push counter");
    }
    buf
}

//! Benchmark workloads for slotbuf.
//!
//! - [`filled`]: a typed buffer holding `0..n`, sized by growth alone.
//! - [`filled_raw`]: the same content in a type-erased buffer.
//! - [`removal_indices`]: a deterministic index sequence for removal loops.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use slotbuf::{Buffer, RawBuffer};

/// Typed buffer holding `0..n`, started at capacity 2 so every growth
/// step is exercised.
pub fn filled(n: u64) -> Buffer<u64> {
    let mut buf = Buffer::new(2).expect("allocate bench buffer");
    for v in 0..n {
        buf.push(v).expect("push bench value");
    }
    buf
}

/// Type-erased buffer of 8-byte slots holding `0..n` little-endian.
pub fn filled_raw(n: u64) -> RawBuffer {
    let mut buf = RawBuffer::allocate(2, 8).expect("allocate bench buffer");
    for v in 0..n {
        buf.push(&v.to_le_bytes()).expect("push bench value");
    }
    buf
}

/// `count` indices for removing from a buffer of length `len`, one per
/// step as the length shrinks. Uses a fixed LCG so runs are comparable.
pub fn removal_indices(len: usize, count: usize) -> Vec<usize> {
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    (0..count.min(len))
        .map(|step| {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            (state >> 33) as usize % (len - step)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filled_has_expected_content() {
        let buf = filled(100);
        assert_eq!(buf.len(), 100);
        assert_eq!(*buf.get(99), 99);
        assert_eq!(filled_raw(3).as_bytes().len(), 24);
    }

    #[test]
    fn removal_indices_stay_in_bounds() {
        let idx = removal_indices(50, 50);
        assert_eq!(idx.len(), 50);
        for (step, &i) in idx.iter().enumerate() {
            assert!(i < 50 - step);
        }
    }
}

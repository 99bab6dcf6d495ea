//! Caller contract checks.
//!
//! Indexing past the length, pushing a slot of the wrong size, or handing
//! a NULL handle across the C boundary can only be a bug in the caller,
//! which controls every one of those values. These checks do not return
//! an error: they print a diagnostic to stderr and abort the process.
//! Aborting (rather than panicking) means `catch_unwind` cannot swallow
//! the violation.

use std::fmt;

/// Abort unless `index < len`.
#[inline]
pub fn validate_index(len: usize, index: usize) {
    if index >= len {
        violation(format_args!(
            "index out of bounds: index {index}, len {len}"
        ));
    }
}

/// Abort unless an element slice is exactly one slot wide.
#[inline]
pub fn validate_elem_size(elem_size: usize, actual: usize) {
    if actual != elem_size {
        violation(format_args!(
            "element size mismatch: slot is {elem_size} bytes, element is {actual} bytes"
        ));
    }
}

/// Report a contract violation and abort.
#[cold]
#[inline(never)]
pub fn violation(args: fmt::Arguments<'_>) -> ! {
    eprintln!("slotbuf: {args}");
    std::process::abort()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_bounds_index_returns() {
        validate_index(3, 0);
        validate_index(3, 2);
        validate_elem_size(4, 4);
    }
}

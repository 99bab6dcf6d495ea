//! Buffer error types.
//!
//! Only resource exhaustion is reported through these types. Caller
//! contract violations (bad index, wrong element size) abort the process
//! instead; see [`crate::contract`].

use std::error::Error;
use std::fmt;

/// Errors that can occur while allocating or resizing a buffer.
///
/// Every operation that returns a `BufferError` leaves the buffer exactly
/// as it was before the call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BufferError {
    /// The allocator refused the request.
    AllocationFailed {
        /// Number of bytes requested.
        bytes: usize,
    },
    /// `capacity * elem_size` does not fit in a valid allocation size.
    CapacityOverflow {
        /// Requested capacity in slots.
        capacity: usize,
        /// Size of one slot in bytes.
        elem_size: usize,
    },
    /// Growth by 3/2 does not strictly increase the capacity
    /// (capacity 0 or 1).
    GrowthStalled {
        /// Capacity at the time of the failed growth.
        capacity: usize,
    },
    /// An element layout with a non power-of-two alignment.
    InvalidLayout {
        /// Element size in bytes.
        size: usize,
        /// Requested alignment.
        align: usize,
    },
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllocationFailed { bytes } => {
                write!(f, "allocation of {bytes} bytes failed")
            }
            Self::CapacityOverflow {
                capacity,
                elem_size,
            } => {
                write!(
                    f,
                    "capacity overflow: {capacity} slots of {elem_size} bytes"
                )
            }
            Self::GrowthStalled { capacity } => {
                write!(f, "growth stalled at capacity {capacity}")
            }
            Self::InvalidLayout { size, align } => {
                write!(
                    f,
                    "invalid element layout: size {size}, align {align} is not a power of two"
                )
            }
        }
    }
}

impl Error for BufferError {}

/// A consuming conversion failed; the buffer is handed back untouched.
///
/// Returned by `into_bytestring`, which has to grow the allocation by one
/// slot before it can hand it over.
pub struct ExportError<B> {
    buffer: B,
    error: BufferError,
}

impl<B> ExportError<B> {
    pub(crate) fn new(buffer: B, error: BufferError) -> Self {
        Self { buffer, error }
    }

    pub(crate) fn map_buffer<C>(self, f: impl FnOnce(B) -> C) -> ExportError<C> {
        ExportError {
            buffer: f(self.buffer),
            error: self.error,
        }
    }

    /// The underlying resource error.
    pub fn error(&self) -> &BufferError {
        &self.error
    }

    /// Recover the buffer that failed to convert.
    pub fn into_buffer(self) -> B {
        self.buffer
    }
}

impl<B> fmt::Debug for ExportError<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportError")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<B> fmt::Display for ExportError<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "buffer export failed: {}", self.error)
    }
}

impl<B> Error for ExportError<B> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_numbers() {
        let e = BufferError::CapacityOverflow {
            capacity: 7,
            elem_size: 3,
        };
        assert_eq!(e.to_string(), "capacity overflow: 7 slots of 3 bytes");
        let e = BufferError::GrowthStalled { capacity: 1 };
        assert_eq!(e.to_string(), "growth stalled at capacity 1");
    }

    #[test]
    fn export_error_returns_buffer_and_source() {
        let err = ExportError::new(vec![1u8, 2], BufferError::AllocationFailed { bytes: 3 });
        assert_eq!(err.error(), &BufferError::AllocationFailed { bytes: 3 });
        assert!(err.source().is_some());
        assert_eq!(err.into_buffer(), vec![1, 2]);
    }
}

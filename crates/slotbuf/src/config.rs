//! Buffer configuration parameters.

use crate::error::BufferError;

/// Size and alignment of one slot.
///
/// The size is fixed for the lifetime of a buffer. The alignment applies
/// to the base of the allocation only; slot `i` starts at byte
/// `i * size`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ElemLayout {
    size: usize,
    align: usize,
}

impl ElemLayout {
    /// Alignment given to type-erased buffers when none is requested.
    ///
    /// Matches the guarantee of C `malloc` on 64-bit targets, so a
    /// type-erased buffer can hold any scalar a C caller casts it to.
    pub const MAX_ALIGN: usize = 16;

    /// Layout of one `T`.
    pub const fn of<T>() -> Self {
        Self {
            size: std::mem::size_of::<T>(),
            align: std::mem::align_of::<T>(),
        }
    }

    /// Layout with an explicit alignment.
    ///
    /// Fails with [`BufferError::InvalidLayout`] unless `align` is a
    /// power of two.
    pub fn new(size: usize, align: usize) -> Result<Self, BufferError> {
        if !align.is_power_of_two() {
            return Err(BufferError::InvalidLayout { size, align });
        }
        Ok(Self { size, align })
    }

    /// Layout for a type-erased slot of `size` bytes, aligned to
    /// [`MAX_ALIGN`](Self::MAX_ALIGN).
    pub const fn erased(size: usize) -> Self {
        Self {
            size,
            align: Self::MAX_ALIGN,
        }
    }

    /// Slot size in bytes.
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Base alignment in bytes.
    pub const fn align(&self) -> usize {
        self.align
    }
}

/// Construction parameters for a buffer.
///
/// Validated when the buffer is created; immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BufferConfig {
    /// Number of slots reserved up front.
    ///
    /// Default: 8. Growth multiplies by 3/2, so capacities of 0 and 1
    /// can never grow and every push into a full buffer of that size
    /// fails.
    pub initial_capacity: usize,

    /// Size of one slot in bytes.
    pub elem_size: usize,

    /// Alignment of the allocation base. Must be a power of two.
    ///
    /// Default: [`ElemLayout::MAX_ALIGN`].
    pub elem_align: usize,
}

impl BufferConfig {
    /// Default number of slots reserved at construction.
    pub const DEFAULT_INITIAL_CAPACITY: usize = 8;

    /// Config for type-erased slots of `elem_size` bytes.
    pub fn new(elem_size: usize) -> Self {
        Self {
            initial_capacity: Self::DEFAULT_INITIAL_CAPACITY,
            elem_size,
            elem_align: ElemLayout::MAX_ALIGN,
        }
    }

    /// Config whose slots hold one `T`.
    pub fn for_type<T>() -> Self {
        let layout = ElemLayout::of::<T>();
        Self {
            initial_capacity: Self::DEFAULT_INITIAL_CAPACITY,
            elem_size: layout.size(),
            elem_align: layout.align(),
        }
    }

    /// Replace the initial capacity.
    pub fn with_initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    /// Validate the element fields.
    pub fn elem_layout(&self) -> Result<ElemLayout, BufferError> {
        ElemLayout::new(self.elem_size, self.elem_align)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn for_type_matches_std_layout() {
        let config = BufferConfig::for_type::<u64>();
        assert_eq!(config.elem_size, 8);
        assert_eq!(config.elem_align, std::mem::align_of::<u64>());
        assert_eq!(config.initial_capacity, BufferConfig::DEFAULT_INITIAL_CAPACITY);
    }

    #[test]
    fn non_power_of_two_align_rejected() {
        let mut config = BufferConfig::new(4);
        config.elem_align = 3;
        assert_eq!(
            config.elem_layout(),
            Err(BufferError::InvalidLayout { size: 4, align: 3 })
        );
    }

    #[test]
    fn erased_layout_uses_max_align() {
        let layout = BufferConfig::new(3).with_initial_capacity(2).elem_layout().unwrap();
        assert_eq!(layout, ElemLayout::erased(3));
        assert_eq!(layout.align(), 16);
    }
}
